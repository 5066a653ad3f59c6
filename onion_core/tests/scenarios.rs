//! Whole overlays running on the in-process network.

use std::collections::HashMap;
use std::sync::Arc;

use onion_core::client::*;
use onion_core::directory::*;
use onion_core::net::*;
use onion_core::relay::*;
use onion_crypto::ENCRYPTED_KEY_SIZE;
use onion_packet::node::*;
use rand::thread_rng;

struct Overlay {
    network: LocalNetwork,
    book: AddressBook,
    directory: Directory,
    relays: HashMap<u32, Arc<Relay>>,
}

impl Overlay {
    async fn new(relay_ids: &[u32]) -> Overlay {
        let network = LocalNetwork::new();
        let book = AddressBook::default();
        let directory = Directory::new();
        network.add_service(book.directory, Arc::new(directory.clone())).await;

        let mut relays = HashMap::new();
        for &id in relay_ids {
            let relay = Arc::new(Relay::start(id, book, Arc::new(network.clone())).await.unwrap());
            network.add_service(book.relay(id), relay.clone()).await;
            relays.insert(id, relay);
        }

        Overlay { network, book, directory, relays }
    }

    async fn add_user(&self, id: u32) -> Arc<User> {
        let user = Arc::new(User::new(id, self.book, Arc::new(self.network.clone())));
        self.network.add_service(self.book.user(id), user.clone()).await;
        user
    }

    async fn assert_relays_untouched(&self) {
        for relay in self.relays.values() {
            assert_eq!(relay.last_encrypted_message().await, None);
            assert_eq!(relay.last_decrypted_message().await, None);
            assert_eq!(relay.last_destination().await, None);
        }
    }
}

#[tokio::test]
async fn message_reaches_user_through_three_relays() {
    let overlay = Overlay::new(&[1, 2, 3]).await;
    let sender = overlay.add_user(1).await;
    let receiver = overlay.add_user(7).await;

    let response = sender.handle(Request::SendMessage { message: "hello".to_owned(), destination_user_id: 7 }).await;
    assert_eq!(response, Response::Done);
    assert_eq!(receiver.last_received_message().await, Some("hello".to_owned()));

    // every relay reports the next hop
    let circuit = sender.last_circuit().await.unwrap();
    let (entry, middle, exit) = (&overlay.relays[&circuit[0]], &overlay.relays[&circuit[1]], &overlay.relays[&circuit[2]]);
    assert_eq!(entry.last_destination().await, Some(overlay.book.relay(circuit[1])));
    assert_eq!(middle.last_destination().await, Some(overlay.book.relay(circuit[2])));
    assert_eq!(exit.last_destination().await, Some(overlay.book.user(7)));

    // each hop forwards exactly what the next one received
    assert_eq!(entry.last_decrypted_message().await, middle.last_encrypted_message().await);
    assert_eq!(middle.last_decrypted_message().await, exit.last_encrypted_message().await);
    assert_eq!(exit.last_decrypted_message().await, Some(b"hello".to_vec()));
}

#[tokio::test]
async fn tampered_key_segment_is_rejected() {
    let overlay = Overlay::new(&[1, 2, 3]).await;
    let _receiver = overlay.add_user(7).await;

    let snapshot = overlay.directory.list().await;
    let circuit = build_circuit(&mut thread_rng(), &snapshot, &overlay.book).unwrap();
    let mut payload = encrypt_for_circuit(b"hello", overlay.book.user(7), &circuit).unwrap();
    payload[ENCRYPTED_KEY_SIZE / 2] ^= 0x01;

    let response = overlay.network.send(circuit.entry().address, Request::Message(payload.clone())).await.unwrap();
    assert!(matches!(response, Response::Failure { kind: FailureKind::Decryption, .. }));

    let entry = &overlay.relays[&circuit.entry().id];
    let res = entry.handle_forward(&payload).await;
    assert!(matches!(res, Err(ForwardError::Decryption { .. })));
    overlay.assert_relays_untouched().await;
}

#[tokio::test]
async fn two_relays_are_not_enough() {
    let overlay = Overlay::new(&[1, 2]).await;
    let sender = overlay.add_user(1).await;
    let _receiver = overlay.add_user(7).await;

    let response = sender.handle(Request::SendMessage { message: "hello".to_owned(), destination_user_id: 7 }).await;
    assert!(matches!(response, Response::Failure { kind: FailureKind::InsufficientNodes, .. }));
    overlay.assert_relays_untouched().await;

    let response = sender.handle(Request::Inspect(Inspection::LastCircuit)).await;
    assert!(matches!(response, Response::Failure { kind: FailureKind::NotFound, .. }));
}

#[tokio::test]
async fn relay_registered_twice_fails_to_start() {
    let overlay = Overlay::new(&[1, 2, 3]).await;
    let res = Relay::start(2, overlay.book, Arc::new(overlay.network.clone())).await;
    assert!(matches!(res, Err(StartError::Register { .. })));
    assert_eq!(overlay.directory.list().await.len(), 3);
}

#[tokio::test]
async fn messages_use_fresh_circuits() {
    let overlay = Overlay::new(&[1, 2, 3, 4, 5, 6]).await;
    let sender = overlay.add_user(1).await;
    let receiver = overlay.add_user(2).await;

    for i in 0..10 {
        let message = format!("message {}", i);
        sender.send_message(&message, 2).await.unwrap();
        assert_eq!(receiver.last_received_message().await, Some(message.clone()));
        assert_eq!(sender.last_sent_message().await, Some(message));

        let circuit = sender.last_circuit().await.unwrap();
        assert_eq!(circuit.len(), 3);
        assert!(circuit.iter().all(|id| (1..=6).contains(id)));
    }
}

#[tokio::test]
async fn relay_lists_registry() {
    let overlay = Overlay::new(&[3, 1, 2]).await;
    let relay = &overlay.relays[&1];
    let ids = relay.node_registry().await.unwrap()
        .into_iter()
        .map(|identity| identity.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn failed_delivery_hides_the_path() {
    let overlay = Overlay::new(&[1, 2, 3]).await;
    let sender = overlay.add_user(1).await;

    let res = sender.send_message("hello", 7).await;
    let message = match res {
        Err(SendError::Delivery(RequestError::Failure { kind: FailureKind::Routing, message, .. })) => message,
        res => panic!("Unexpected result: {:?}", res),
    };

    // the entry relay only names its successor
    let circuit = sender.last_circuit().await.unwrap();
    assert_eq!(message, format!("Failed to deliver to {}", overlay.book.relay(circuit[1])));
    assert!(!message.contains(&overlay.book.relay(circuit[2]).to_string()));
    assert!(!message.contains(&overlay.book.user(7).to_string()));
}

#[tokio::test]
async fn offline_relay_breaks_delivery() {
    let overlay = Overlay::new(&[1, 2, 3]).await;
    let sender = overlay.add_user(1).await;
    let receiver = overlay.add_user(7).await;
    assert!(overlay.network.remove_service(overlay.book.relay(3)).await);

    // with three relays every circuit goes through relay 3
    let res = sender.send_message("hello", 7).await;
    let circuit = sender.last_circuit().await.unwrap();
    if circuit[0] == 3 {
        assert!(matches!(
            res,
            Err(SendError::Delivery(RequestError::Transport { error: TransportError::Unreachable { .. }, .. }))
        ));
    } else {
        assert!(matches!(res, Err(SendError::Delivery(RequestError::Failure { kind: FailureKind::Routing, .. }))));
    }
    assert_eq!(receiver.last_received_message().await, None);
}
