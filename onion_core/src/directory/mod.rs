/*! Directory of relays.

The directory is the only node that knows every relay. Relays register
their identity once at startup, clients fetch the whole listing before every
send to pick a circuit.
*/

mod errors;

pub use self::errors::*;

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use onion_packet::node::*;
use tokio::sync::RwLock;

use crate::net::*;

/// Registry of relays, in registration order.
#[derive(Clone, Default)]
pub struct Directory {
    nodes: Arc<RwLock<Vec<NodeIdentity>>>,
}

impl Directory {
    /// Create new empty `Directory`.
    pub fn new() -> Directory {
        Directory::default()
    }

    /** Add relay to the registry.

    Entries are never replaced: registering an id twice fails with
    `AlreadyRegistered` and keeps the first entry.
    */
    pub async fn register(&self, identity: NodeIdentity) -> Result<(), RegisterError> {
        if identity.decode_public_key().is_err() {
            return Err(RegisterError::InvalidPublicKey { id: identity.id })
        }

        let mut nodes = self.nodes.write().await;
        if nodes.iter().any(|node| node.id == identity.id) {
            return Err(RegisterError::AlreadyRegistered { id: identity.id })
        }

        info!("Registered relay {}", identity.id);
        nodes.push(identity);
        Ok(())
    }

    /// Snapshot of the registry.
    pub async fn list(&self) -> Vec<NodeIdentity> {
        self.nodes.read().await.clone()
    }

    async fn handle_register(&self, identity: NodeIdentity) -> Response {
        match self.register(identity).await {
            Ok(()) => Response::Done,
            Err(e) => {
                warn!("Rejected registration: {}", e);
                let kind = match e {
                    RegisterError::AlreadyRegistered { .. } => FailureKind::AlreadyRegistered,
                    RegisterError::InvalidPublicKey { .. } => FailureKind::InvalidPublicKey,
                };
                Response::failure(kind, e.to_string())
            }
        }
    }
}

impl Service for Directory {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        async move {
            match request {
                Request::Status => Response::Live,
                Request::RegisterNode(identity) => self.handle_register(identity).await,
                Request::GetNodeRegistry => Response::NodeRegistry(self.list().await),
                request => Response::failure(FailureKind::Unsupported, format!("Directory doesn't serve {:?}", request)),
            }
        }.boxed()
    }
}

/// Ask the directory for its listing.
pub async fn fetch_node_registry(transport: &dyn Transport, directory: Address) -> Result<Vec<NodeIdentity>, RequestError> {
    match send_request(transport, directory, Request::GetNodeRegistry).await? {
        Response::NodeRegistry(nodes) => Ok(nodes),
        response => Err(RequestError::UnexpectedResponse { address: directory, response }),
    }
}

/// Register relay in the directory.
pub async fn register_node(transport: &dyn Transport, directory: Address, identity: NodeIdentity) -> Result<(), RequestError> {
    match send_request(transport, directory, Request::RegisterNode(identity)).await? {
        Response::Done => Ok(()),
        response => Err(RequestError::UnexpectedResponse { address: directory, response }),
    }
}
