//! Circuit definition.

use rand::Rng;
use rand::seq::index::sample;
use onion_crypto::PublicKey;
use onion_packet::node::NodeIdentity;
use onion_packet::onion::*;

use crate::client::errors::*;
use crate::net::{Address, AddressBook};

/// Number of relays in a circuit.
pub const CIRCUIT_LENGTH: usize = 3;

/// Relay of a circuit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CircuitNode {
    /// Id of the relay.
    pub id: u32,
    /// Decoded `PublicKey` of the relay.
    pub public_key: PublicKey,
    /// Address the relay listens on.
    pub address: Address,
}

/// Relays a message travels through, entry first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Circuit {
    nodes: Vec<CircuitNode>,
}

impl Circuit {
    /// Relays of the circuit, entry first.
    pub fn nodes(&self) -> &[CircuitNode] {
        &self.nodes
    }

    /// The first relay that receives the message.
    pub fn entry(&self) -> &CircuitNode {
        &self.nodes[0]
    }

    /// Ids of relays in traversal order.
    pub fn ids(&self) -> Vec<u32> {
        self.nodes.iter().map(|node| node.id).collect()
    }
}

/** Choose `CIRCUIT_LENGTH` distinct relays of the snapshot uniformly at
random.

Relays are picked by index without replacement, so no relay appears twice.
The first chosen relay is the entry.
*/
pub fn build_circuit<R: Rng + ?Sized>(rng: &mut R, snapshot: &[NodeIdentity], book: &AddressBook) -> Result<Circuit, CircuitError> {
    if snapshot.len() < CIRCUIT_LENGTH {
        return Err(CircuitError::InsufficientNodes {
            available: snapshot.len(),
            needed: CIRCUIT_LENGTH,
        })
    }

    let nodes = sample(rng, snapshot.len(), CIRCUIT_LENGTH)
        .into_iter()
        .map(|index| {
            let identity = &snapshot[index];
            let public_key = identity.decode_public_key()
                .map_err(|error| CircuitError::InvalidPublicKey { id: identity.id, error })?;
            Ok(CircuitNode {
                id: identity.id,
                public_key,
                address: book.relay(identity.id),
            })
        })
        .collect::<Result<Vec<_>, CircuitError>>()?;

    Ok(Circuit { nodes })
}

/** Wrap message into one layer per relay of the circuit.

Layers are built from the exit relay back to the entry one. The exit layer
names the user as its destination, every other layer names the next relay.
The result should be sent to the entry relay.
*/
pub fn encrypt_for_circuit(message: &[u8], destination: Address, circuit: &Circuit) -> Result<Vec<u8>, WrapError> {
    let mut destination = destination;
    let mut payload = message.to_vec();
    for node in circuit.nodes.iter().rev() {
        let layer = OnionLayer::new(&node.public_key, &LayerPayload { destination, inner: payload })?;
        payload = layer.to_vec()?;
        destination = node.address;
    }
    Ok(payload)
}
