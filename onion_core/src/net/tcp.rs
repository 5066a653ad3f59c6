/*! TCP transport.

Every request opens a new connection: the client writes one framed request,
the server writes one framed response and both sides close the connection.
Addresses are used as TCP ports on a configured host.
*/

use std::convert::TryFrom;
use std::io::Error as IoError;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::{SinkExt, StreamExt};
use onion_packet::node::{FailureKind, Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use super::*;

/// Default time to wait for a response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport that reaches nodes listening on TCP ports of one host.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    host: IpAddr,
    timeout: Duration,
}

impl TcpTransport {
    /// Create new `TcpTransport`.
    pub fn new(host: IpAddr, timeout: Duration) -> TcpTransport {
        TcpTransport { host, timeout }
    }

    /// Socket address the node with given address listens on.
    pub fn socket_addr(&self, address: Address) -> Result<SocketAddr, TransportError> {
        let port = u16::try_from(address.0)
            .map_err(|_| TransportError::InvalidAddress { address })?;
        Ok(SocketAddr::new(self.host, port))
    }

    async fn request(&self, address: Address, request: Request) -> Result<Response, TransportError> {
        let addr = self.socket_addr(address)?;
        let stream = TcpStream::connect(addr).await
            .map_err(|error| TransportError::Connect { address, error })?;

        let mut framed = Framed::new(stream, ClientCodec::new());
        framed.send(request).await?;
        match framed.next().await {
            Some(response) => Ok(response?),
            None => Err(TransportError::Closed { address }),
        }
    }
}

impl Transport for TcpTransport {
    fn send(&self, address: Address, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        async move {
            match tokio::time::timeout(self.timeout, self.request(address, request)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!("Request to {} timed out after {:?}", address, self.timeout);
                    Err(TransportError::Timeout { address })
                },
            }
        }.boxed()
    }
}

/// Answer one request received on the connection.
async fn handle_connection(stream: TcpStream, service: Arc<dyn Service>) -> Result<(), TransportError> {
    let mut framed = Framed::new(stream, ServerCodec::new());
    let response = match framed.next().await {
        None => return Ok(()),
        Some(Err(DecodeError::Io(error))) => return Err(DecodeError::Io(error).into()),
        Some(Err(error)) => {
            warn!("Received malformed request: {}", error);
            Response::failure(FailureKind::Malformed, error.to_string())
        },
        Some(Ok(request)) => service.handle(request).await,
    };
    framed.send(response).await?;
    Ok(())
}

/** Accept connections and answer requests with `service` until accepting
fails.

Every connection is served by a separate task.
*/
pub async fn serve(listener: TcpListener, service: Arc<dyn Service>) -> Result<(), IoError> {
    loop {
        let (stream, addr) = listener.accept().await?;
        trace!("Accepted connection from {}", addr);

        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service).await {
                error!("Failed to serve connection from {}: {}", addr, e);
            }
        });
    }
}
