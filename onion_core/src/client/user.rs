/*! User node.

A user sends messages through fresh circuits and keeps the last message it
received.
*/

use std::str;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use onion_packet::node::*;
use rand::thread_rng;
use tokio::sync::RwLock;

use crate::client::circuit::*;
use crate::client::errors::*;
use crate::directory::fetch_node_registry;
use crate::net::*;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct UserState {
    last_received_message: Option<String>,
    last_sent_message: Option<String>,
    last_circuit: Option<Vec<u32>>,
}

/// User node.
pub struct User {
    id: u32,
    book: AddressBook,
    transport: Arc<dyn Transport>,
    state: RwLock<UserState>,
}

impl User {
    /// Create new `User`.
    pub fn new(id: u32, book: AddressBook, transport: Arc<dyn Transport>) -> User {
        User {
            id,
            book,
            transport,
            state: RwLock::new(UserState::default()),
        }
    }

    /// Id of the user.
    pub fn id(&self) -> u32 {
        self.id
    }

    /** Send message to the user with `destination_user_id` through a new
    circuit.

    The registry is fetched and a circuit is built for every message. The
    message and circuit are recorded before the message leaves, so they're
    kept even if delivery fails. Nothing is retried.
    */
    pub async fn send_message(&self, message: &str, destination_user_id: u32) -> Result<(), SendError> {
        let snapshot = fetch_node_registry(&*self.transport, self.book.directory).await
            .map_err(SendError::Registry)?;
        let circuit = build_circuit(&mut thread_rng(), &snapshot, &self.book)?;
        debug!("User {} built circuit {:?}", self.id, circuit.ids());

        {
            let mut state = self.state.write().await;
            state.last_sent_message = Some(message.to_owned());
            state.last_circuit = Some(circuit.ids());
        }

        let payload = encrypt_for_circuit(message.as_bytes(), self.book.user(destination_user_id), &circuit)?;
        let entry = circuit.entry().address;
        match send_request(&*self.transport, entry, Request::Message(payload)).await {
            Ok(Response::Done) => {
                info!("User {} sent message to user {}", self.id, destination_user_id);
                Ok(())
            },
            Ok(response) => Err(SendError::Delivery(RequestError::UnexpectedResponse { address: entry, response })),
            Err(error) => Err(SendError::Delivery(error)),
        }
    }

    /// Store message that came out of a circuit.
    pub async fn deliver(&self, message: &[u8]) -> Result<(), DeliverError> {
        let message = str::from_utf8(message)
            .map_err(|error| DeliverError::Malformed { error })?;
        info!("User {} received message", self.id);
        self.state.write().await.last_received_message = Some(message.to_owned());
        Ok(())
    }

    /// Plaintext received last.
    pub async fn last_received_message(&self) -> Option<String> {
        self.state.read().await.last_received_message.clone()
    }

    /// Plaintext sent last.
    pub async fn last_sent_message(&self) -> Option<String> {
        self.state.read().await.last_sent_message.clone()
    }

    /// Relay ids of the last circuit, entry first.
    pub async fn last_circuit(&self) -> Option<Vec<u32>> {
        self.state.read().await.last_circuit.clone()
    }

    async fn handle_message(&self, message: Vec<u8>) -> Response {
        match self.deliver(&message).await {
            Ok(()) => Response::Done,
            Err(e) => {
                warn!("User {} rejected message: {}", self.id, e);
                Response::failure(FailureKind::Malformed, e.to_string())
            },
        }
    }

    async fn handle_send_message(&self, message: String, destination_user_id: u32) -> Response {
        match self.send_message(&message, destination_user_id).await {
            Ok(()) => Response::Done,
            Err(e) => {
                warn!("User {} failed to send message: {}", self.id, e);
                Response::failure(e.failure_kind(), e.to_string())
            },
        }
    }

    async fn handle_inspect(&self, inspection: Inspection) -> Response {
        match inspection {
            Inspection::LastReceivedMessage => Response::Text(self.last_received_message().await),
            Inspection::LastSentMessage => Response::Text(self.last_sent_message().await),
            Inspection::LastCircuit => match self.last_circuit().await {
                Some(ids) => Response::Circuit(ids),
                None => Response::failure(FailureKind::NotFound, "No circuit was built yet"),
            },
            inspection => Response::failure(FailureKind::Unsupported, format!("User doesn't track {:?}", inspection)),
        }
    }
}

impl Service for User {
    fn handle(&self, request: Request) -> BoxFuture<'_, Response> {
        async move {
            match request {
                Request::Status => Response::Live,
                Request::Message(message) => self.handle_message(message).await,
                Request::SendMessage { message, destination_user_id } =>
                    self.handle_send_message(message, destination_user_id).await,
                Request::Inspect(inspection) => self.handle_inspect(inspection).await,
                request => Response::failure(FailureKind::Unsupported, format!("User doesn't serve {:?}", request)),
            }
        }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::directory::Directory;
    use crate::relay::Relay;

    async fn overlay(relays: u32) -> (LocalNetwork, AddressBook) {
        let network = LocalNetwork::new();
        let book = AddressBook::default();
        network.add_service(book.directory, Arc::new(Directory::new())).await;
        for id in 1..=relays {
            let relay = Relay::start(id, book, Arc::new(network.clone())).await.unwrap();
            network.add_service(book.relay(id), Arc::new(relay)).await;
        }
        (network, book)
    }

    async fn add_user(network: &LocalNetwork, book: AddressBook, id: u32) -> Arc<User> {
        let user = Arc::new(User::new(id, book, Arc::new(network.clone())));
        network.add_service(book.user(id), user.clone()).await;
        user
    }

    #[tokio::test]
    async fn send_message() {
        let (network, book) = overlay(3).await;
        let alice = add_user(&network, book, 1).await;
        let bob = add_user(&network, book, 2).await;

        alice.send_message("hello", 2).await.unwrap();

        assert_eq!(bob.last_received_message().await, Some("hello".to_owned()));
        assert_eq!(alice.last_sent_message().await, Some("hello".to_owned()));
        assert_eq!(alice.last_received_message().await, None);
        let mut circuit = alice.last_circuit().await.unwrap();
        circuit.sort_unstable();
        assert_eq!(circuit, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn send_message_insufficient_nodes() {
        let (network, book) = overlay(2).await;
        let alice = add_user(&network, book, 1).await;

        let res = alice.send_message("hello", 2).await;
        assert!(matches!(res, Err(SendError::Circuit(CircuitError::InsufficientNodes { available: 2, .. }))));
        assert_eq!(res.unwrap_err().failure_kind(), FailureKind::InsufficientNodes);
        assert_eq!(alice.last_sent_message().await, None);
        assert_eq!(alice.last_circuit().await, None);
    }

    #[tokio::test]
    async fn send_message_without_directory() {
        let network = LocalNetwork::new();
        let alice = add_user(&network, AddressBook::default(), 1).await;

        let res = alice.send_message("hello", 2).await;
        assert!(matches!(res, Err(SendError::Registry(_))));
    }

    #[tokio::test]
    async fn send_message_to_missing_user() {
        let (network, book) = overlay(3).await;
        let alice = add_user(&network, book, 1).await;

        let res = alice.send_message("hello", 2).await;
        assert!(matches!(res, Err(SendError::Delivery(RequestError::Failure { kind: FailureKind::Routing, .. }))));
        // recorded before transmission
        assert_eq!(alice.last_sent_message().await, Some("hello".to_owned()));
        assert!(alice.last_circuit().await.is_some());
    }

    #[tokio::test]
    async fn deliver_invalid_utf8() {
        let network = LocalNetwork::new();
        let user = User::new(1, AddressBook::default(), Arc::new(network));

        assert!(matches!(user.deliver(&[0xff, 0xfe]).await, Err(DeliverError::Malformed { .. })));
        assert_eq!(user.last_received_message().await, None);

        let response = user.handle(Request::Message(vec![0xff])).await;
        assert!(matches!(response, Response::Failure { kind: FailureKind::Malformed, .. }));
    }

    #[tokio::test]
    async fn deliver_overwrites() {
        let network = LocalNetwork::new();
        let user = User::new(1, AddressBook::default(), Arc::new(network));

        assert_eq!(user.handle(Request::Message(b"first".to_vec())).await, Response::Done);
        assert_eq!(user.handle(Request::Message(b"second".to_vec())).await, Response::Done);
        assert_eq!(user.last_received_message().await, Some("second".to_owned()));
    }

    #[tokio::test]
    async fn inspect() {
        let (network, book) = overlay(3).await;
        let alice = add_user(&network, book, 1).await;
        let _bob = add_user(&network, book, 2).await;

        assert_eq!(alice.handle(Request::Status).await, Response::Live);
        assert_eq!(alice.handle(Request::Inspect(Inspection::LastSentMessage)).await, Response::Text(None));
        let response = alice.handle(Request::Inspect(Inspection::LastCircuit)).await;
        assert!(matches!(response, Response::Failure { kind: FailureKind::NotFound, .. }));

        let request = Request::SendMessage { message: "hello".to_owned(), destination_user_id: 2 };
        assert_eq!(alice.handle(request).await, Response::Done);
        assert_eq!(alice.handle(Request::Inspect(Inspection::LastSentMessage)).await, Response::Text(Some("hello".to_owned())));
        let response = alice.handle(Request::Inspect(Inspection::LastCircuit)).await;
        assert!(matches!(response, Response::Circuit(ref ids) if ids.len() == CIRCUIT_LENGTH));

        let response = alice.handle(Request::Inspect(Inspection::PrivateKey)).await;
        assert!(matches!(response, Response::Failure { kind: FailureKind::Unsupported, .. }));
    }
}
