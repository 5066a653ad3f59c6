/*! Errors enum for relays.
*/

use onion_crypto::KeyGenerationError;
use onion_packet::address::Address;
use onion_packet::node::FailureKind;
use onion_packet::onion::GetPayloadError;
use thiserror::Error;

use crate::net::RequestError;

/// Error that can happen when a relay starts.
#[derive(Debug, Error)]
pub enum StartError {
    /// Key pair of the relay can't be generated.
    #[error("Failed to generate key pair: {}", error)]
    KeyGeneration {
        /// Key generation error.
        error: KeyGenerationError,
    },
    /// Directory rejected the relay or can't be reached.
    #[error("Failed to register relay: {}", error)]
    Register {
        /// Request error.
        error: RequestError,
    },
}

impl From<KeyGenerationError> for StartError {
    fn from(error: KeyGenerationError) -> StartError {
        StartError::KeyGeneration { error }
    }
}

impl From<RequestError> for StartError {
    fn from(error: RequestError) -> StartError {
        StartError::Register { error }
    }
}

/// Error that can happen when a relay forwards a message.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Message is too short or too long to be an onion layer.
    #[error("Message of {} bytes is not an onion layer", len)]
    Malformed {
        /// Length of the message.
        len: usize,
    },
    /// Layer wasn't encrypted for this relay or was tampered with.
    #[error("Failed to peel layer: {}", error)]
    Decryption {
        /// Peeling error.
        error: GetPayloadError,
    },
    /// Peeled layer doesn't start with a destination.
    #[error("Failed to read destination: {}", error)]
    InvalidDestination {
        /// Peeling error.
        error: GetPayloadError,
    },
    /// Peeled layer is addressed to nobody.
    #[error("Layer has no destination")]
    NoDestination,
    /// Next node didn't accept the inner payload.
    #[error("Failed to deliver to {}: {}", destination, error)]
    Delivery {
        /// Address of the next node.
        destination: Address,
        /// Request error.
        error: RequestError,
    },
}

impl ForwardError {
    /// Kind reported to the node that sent the message.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ForwardError::Malformed { .. } | ForwardError::Decryption { .. } => FailureKind::Decryption,
            _ => FailureKind::Routing,
        }
    }

    /** Description sent back to the previous node.

    Never carries peeled bytes or the reply of the next node, so the sender
    learns at most the address this relay forwarded to.
    */
    pub fn reply(&self) -> String {
        match self {
            ForwardError::Malformed { .. } | ForwardError::Decryption { .. } => "Failed to peel layer".to_owned(),
            ForwardError::InvalidDestination { .. } => "Invalid destination".to_owned(),
            ForwardError::NoDestination => "Layer has no destination".to_owned(),
            ForwardError::Delivery { destination, .. } => format!("Failed to deliver to {}", destination),
        }
    }
}

impl From<GetPayloadError> for ForwardError {
    fn from(error: GetPayloadError) -> ForwardError {
        if error.is_decryption() {
            ForwardError::Decryption { error }
        } else {
            ForwardError::InvalidDestination { error }
        }
    }
}
