/*! Errors enum for the directory.
*/

use thiserror::Error;

/// Error that can happen when a relay registers in the directory.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RegisterError {
    /// A relay with the same id is already registered.
    #[error("Relay {} is already registered", id)]
    AlreadyRegistered {
        /// Id of the relay.
        id: u32,
    },
    /// Public key of the relay is empty or can't be decoded.
    #[error("Relay {} has invalid public key", id)]
    InvalidPublicKey {
        /// Id of the relay.
        id: u32,
    },
}
