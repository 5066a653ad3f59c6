/*! Relay node.

A relay owns one key pair. For every message it receives it peels exactly
one onion layer with its `SecretKey`, reads the destination written in the
layer and forwards the inner payload there. It knows nothing about the
position it has in a circuit.
*/

mod errors;

pub use self::errors::*;

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use onion_binary_io::*;
use onion_crypto::*;
use onion_packet::node::*;
use onion_packet::onion::*;
use tokio::sync::RwLock;

use crate::directory::{fetch_node_registry, register_node};
use crate::net::*;

/// Lifecycle of a relay.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelayPhase {
    /// Key pair is generated, the directory doesn't know the relay yet.
    Initializing,
    /// Directory accepted the relay.
    Registered,
    /// Relay forwards messages.
    Serving,
}

/// What the relay saw last. Only updated by messages that could be peeled.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct RelayState {
    last_encrypted_message: Option<Vec<u8>>,
    last_decrypted_message: Option<Vec<u8>>,
    last_destination: Option<Address>,
}

/// Relay node.
pub struct Relay {
    id: u32,
    secret_key: SecretKey,
    public_key: PublicKey,
    book: AddressBook,
    transport: Arc<dyn Transport>,
    phase: RwLock<RelayPhase>,
    state: RwLock<RelayState>,
}

impl Relay {
    /// Create new `Relay` with a fresh key pair. It has to be registered
    /// before it forwards messages.
    pub fn new(id: u32, book: AddressBook, transport: Arc<dyn Transport>) -> Result<Relay, StartError> {
        let (public_key, secret_key) = generate_key_pair()?;
        Ok(Relay {
            id,
            secret_key,
            public_key,
            book,
            transport,
            phase: RwLock::new(RelayPhase::Initializing),
            state: RwLock::new(RelayState::default()),
        })
    }

    /** Create relay, register it in the directory and start serving.

    The relay can't work if the directory rejects it, so any error here
    should stop the node.
    */
    pub async fn start(id: u32, book: AddressBook, transport: Arc<dyn Transport>) -> Result<Relay, StartError> {
        let relay = Relay::new(id, book, transport)?;
        relay.register().await?;
        relay.serve().await;
        Ok(relay)
    }

    /// Register the relay in the directory.
    pub async fn register(&self) -> Result<(), StartError> {
        register_node(&*self.transport, self.book.directory, self.identity()).await?;
        info!("Relay {} is registered", self.id);
        *self.phase.write().await = RelayPhase::Registered;
        Ok(())
    }

    /// Start forwarding messages.
    pub async fn serve(&self) {
        let mut phase = self.phase.write().await;
        if *phase == RelayPhase::Registered {
            info!("Relay {} is serving", self.id);
            *phase = RelayPhase::Serving;
        }
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> RelayPhase {
        *self.phase.read().await
    }

    /// Id of the relay.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// `PublicKey` of the relay.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Identity the relay registers in the directory.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(self.id, &self.public_key)
    }

    /** Peel one layer of `body` and forward the inner payload.

    State is updated as soon as the layer is peeled and its destination is
    read, before forwarding, and it's not rolled back if forwarding fails.
    Messages that can't be peeled leave state untouched.
    */
    pub async fn handle_forward(&self, body: &[u8]) -> Result<(), ForwardError> {
        let (_, layer) = OnionLayer::from_bytes(body)
            .map_err(|_| ForwardError::Malformed { len: body.len() })?;
        let payload = layer.get_payload(&self.secret_key)?;

        debug!("Relay {} peeled layer for {}", self.id, payload.destination);
        {
            let mut state = self.state.write().await;
            state.last_encrypted_message = Some(body.to_vec());
            state.last_decrypted_message = Some(payload.inner.clone());
            state.last_destination = Some(payload.destination);
        }

        let destination = payload.destination;
        if !destination.is_present() {
            return Err(ForwardError::NoDestination)
        }

        match send_request(&*self.transport, destination, Request::Message(payload.inner)).await {
            Ok(Response::Done) => Ok(()),
            Ok(response) => Err(ForwardError::Delivery {
                destination,
                error: RequestError::UnexpectedResponse { address: destination, response },
            }),
            Err(error) => Err(ForwardError::Delivery { destination, error }),
        }
    }

    /// Layer as it arrived with the last peeled message.
    pub async fn last_encrypted_message(&self) -> Option<Vec<u8>> {
        self.state.read().await.last_encrypted_message.clone()
    }

    /// Payload forwarded after the last peeled message.
    pub async fn last_decrypted_message(&self) -> Option<Vec<u8>> {
        self.state.read().await.last_decrypted_message.clone()
    }

    /// Destination of the last peeled message.
    pub async fn last_destination(&self) -> Option<Address> {
        self.state.read().await.last_destination
    }

    /// Encoded `SecretKey` of the relay. Debug only.
    pub fn private_key(&self) -> String {
        self.secret_key.encode_key()
    }

    /// Directory listing as seen by this relay.
    pub async fn node_registry(&self) -> Result<Vec<NodeIdentity>, RequestError> {
        fetch_node_registry(&*self.transport, self.book.directory).await
    }

    async fn handle_message(&self, body: Vec<u8>) -> Response {
        if self.phase().await != RelayPhase::Serving {
            return Response::failure(FailureKind::Unsupported, format!("Relay {} is not serving yet", self.id))
        }

        match self.handle_forward(&body).await {
            Ok(()) => Response::Done,
            Err(e) => {
                let reply = e.reply();
                warn!("Relay {} failed to forward message: {}", self.id, reply);
                debug!("Relay {} forward error: {}", self.id, e);
                Response::failure(e.failure_kind(), reply)
            },
        }
    }

    async fn handle_inspect(&self, inspection: Inspection) -> Response {
        match inspection {
            Inspection::LastReceivedEncryptedMessage => Response::Bytes(self.last_encrypted_message().await),
            Inspection::LastReceivedDecryptedMessage => Response::Bytes(self.last_decrypted_message().await),
            Inspection::LastMessageDestination => Response::Destination(self.last_destination().await),
            Inspection::PrivateKey => Response::Text(Some(self.private_key())),
            inspection => Response::failure(FailureKind::Unsupported, format!("Relay doesn't track {:?}", inspection)),
        }
    }

    async fn handle_node_registry(&self) -> Response {
        match self.node_registry().await {
            Ok(nodes) => Response::NodeRegistry(nodes),
            Err(e) => {
                error!("Relay {} failed to fetch node registry: {}", self.id, e);
                Response::failure(FailureKind::Delivery, e.to_string())
            },
        }
    }
}

impl Service for Relay {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        async move {
            match request {
                Request::Status => Response::Live,
                Request::Message(body) => self.handle_message(body).await,
                Request::Inspect(inspection) => self.handle_inspect(inspection).await,
                Request::GetNodeRegistry => self.handle_node_registry().await,
                request => Response::failure(FailureKind::Unsupported, format!("Relay doesn't serve {:?}", request)),
            }
        }.boxed()
    }
}
