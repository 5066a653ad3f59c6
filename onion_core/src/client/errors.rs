use onion_crypto::DecodeKeyError;
use onion_packet::node::FailureKind;
use onion_packet::onion::WrapError;
use thiserror::Error;

use crate::net::RequestError;

/// Error that can happen when building a circuit.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CircuitError {
    /// Registry has less relays than a circuit needs.
    #[error("Not enough relays to build a circuit: {} available, {} needed", available, needed)]
    InsufficientNodes {
        /// Number of relays in the registry.
        available: usize,
        /// Number of relays in a circuit.
        needed: usize,
    },
    /// Public key of a chosen relay can't be decoded.
    #[error("Relay {} has invalid public key: {}", id, error)]
    InvalidPublicKey {
        /// Id of the relay.
        id: u32,
        /// Decoding error.
        error: DecodeKeyError,
    },
}

/// Error that can happen when sending a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// Directory listing can't be fetched.
    #[error("Failed to fetch node registry: {0}")]
    Registry(RequestError),
    /// Circuit can't be built.
    #[error("Failed to build circuit: {0}")]
    Circuit(CircuitError),
    /// Message can't be wrapped into layers.
    #[error("Failed to wrap message: {0}")]
    Wrap(WrapError),
    /// Entry relay didn't accept the message.
    #[error("Failed to deliver message: {0}")]
    Delivery(RequestError),
}

impl SendError {
    /// Kind reported to the node that asked to send the message.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SendError::Circuit(CircuitError::InsufficientNodes { .. }) => FailureKind::InsufficientNodes,
            SendError::Circuit(CircuitError::InvalidPublicKey { .. }) => FailureKind::InvalidPublicKey,
            SendError::Wrap(_) => FailureKind::Malformed,
            SendError::Registry(_) | SendError::Delivery(_) => FailureKind::Delivery,
        }
    }
}

impl From<CircuitError> for SendError {
    fn from(error: CircuitError) -> SendError {
        SendError::Circuit(error)
    }
}

impl From<WrapError> for SendError {
    fn from(error: WrapError) -> SendError {
        SendError::Wrap(error)
    }
}

/// Error that can happen when a message is delivered to a user.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DeliverError {
    /// Message isn't valid UTF-8.
    #[error("Message is not valid UTF-8: {}", error)]
    Malformed {
        /// Decoding error.
        error: std::str::Utf8Error,
    },
}
