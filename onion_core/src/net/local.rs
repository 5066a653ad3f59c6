/*! In-process transport.
*/

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use onion_packet::node::{Request, Response};
use tokio::sync::RwLock;

use super::*;

/** Network of nodes living in the same process.

Requests are handed to the service registered at the destination address.
There is no timeout: a request completes when the service answers.
*/
#[derive(Clone, Default)]
pub struct LocalNetwork {
    services: Arc<RwLock<HashMap<Address, Arc<dyn Service>>>>,
}

impl LocalNetwork {
    /// Create empty network.
    pub fn new() -> LocalNetwork {
        LocalNetwork::default()
    }

    /// Make service reachable at the address, replacing the previous one.
    pub async fn add_service(&self, address: Address, service: Arc<dyn Service>) {
        trace!("Adding service at {}", address);
        self.services.write().await.insert(address, service);
    }

    /// Make address unreachable.
    pub async fn remove_service(&self, address: Address) -> bool {
        self.services.write().await.remove(&address).is_some()
    }
}

impl Transport for LocalNetwork {
    fn send(&self, address: Address, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        async move {
            // the lock is released before the service handles the request
            // since the service may send requests on its own
            let service = self.services.read().await.get(&address).cloned();
            match service {
                Some(service) => Ok(service.handle(request).await),
                None => Err(TransportError::Unreachable { address }),
            }
        }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Service for Echo {
        fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
            async move {
                match request {
                    Request::Message(payload) => Response::Bytes(Some(payload)),
                    _ => Response::Live,
                }
            }.boxed()
        }
    }

    #[tokio::test]
    async fn send_to_service() {
        let network = LocalNetwork::new();
        network.add_service(Address(4001), Arc::new(Echo)).await;

        let response = network.send(Address(4001), Request::Message(vec![1, 2, 3])).await.unwrap();
        assert_eq!(response, Response::Bytes(Some(vec![1, 2, 3])));
    }

    #[tokio::test]
    async fn send_unreachable() {
        let network = LocalNetwork::new();
        let res = network.send(Address(4001), Request::Status).await;
        assert!(matches!(res, Err(TransportError::Unreachable { address }) if address == Address(4001)));
    }

    #[tokio::test]
    async fn remove_service() {
        let network = LocalNetwork::new();
        network.add_service(Address(4001), Arc::new(Echo)).await;
        assert!(network.remove_service(Address(4001)).await);
        assert!(!network.remove_service(Address(4001)).await);
        assert!(network.send(Address(4001), Request::Status).await.is_err());
    }
}
