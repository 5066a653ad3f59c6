/*! Errors enum for onion layers.
*/

use cookie_factory::GenError;
use nom::{error::Error as NomError, Err};
use onion_crypto::{DecryptError, EncryptError};
use thiserror::Error;

/// Error that can happen when peeling an onion layer.
#[derive(Debug, PartialEq, Error)]
pub enum GetPayloadError {
    /// Key segment wasn't sealed for our `SecretKey`.
    #[error("Decrypt key segment error: {error}")]
    DecryptKey {
        /// Decryption error.
        error: DecryptError,
    },
    /// Key segment decrypted to something that isn't an encoded symmetric key.
    #[error("Invalid symmetric key in key segment")]
    InvalidKey,
    /// Layer body can't be decrypted with the recovered symmetric key.
    #[error("Decrypt payload error: {error}")]
    Decrypt {
        /// Decryption error.
        error: DecryptError,
    },
    /// Decrypted body doesn't start with a destination address.
    #[error("Deserialize payload error: {:?}, data: {:?}", error, payload)]
    Deserialize {
        /// Parsing error
        error: Err<NomError<Vec<u8>>>,
        /// Decrypted payload of the layer
        payload: Vec<u8>,
    },
}

impl GetPayloadError {
    pub(crate) fn decrypt_key(error: DecryptError) -> GetPayloadError {
        GetPayloadError::DecryptKey { error }
    }

    pub(crate) fn decrypt(error: DecryptError) -> GetPayloadError {
        GetPayloadError::Decrypt { error }
    }

    pub(crate) fn deserialize(error: Err<NomError<&[u8]>>, payload: Vec<u8>) -> GetPayloadError {
        GetPayloadError::Deserialize {
            error: error.map(|e| NomError::new(e.input.to_vec(), e.code)),
            payload,
        }
    }

    /// Whether the layer was rejected for cryptographic reasons rather than
    /// for a malformed routing prefix.
    pub fn is_decryption(&self) -> bool {
        !matches!(self, GetPayloadError::Deserialize { .. })
    }
}

/// Error that can happen when wrapping a payload into an onion layer.
#[derive(Debug, Error)]
pub enum WrapError {
    /// Layer body or key segment can't be encrypted.
    #[error("Encrypt layer error: {error}")]
    Encrypt {
        /// Encryption error.
        error: EncryptError,
    },
    /// Layer body doesn't fit into an onion packet.
    #[error("Serialize layer error: {:?}", error)]
    Serialize {
        /// Serialization error.
        error: GenError,
    },
}

impl From<EncryptError> for WrapError {
    fn from(error: EncryptError) -> WrapError {
        WrapError::Encrypt { error }
    }
}

impl From<GenError> for WrapError {
    fn from(error: GenError) -> WrapError {
        WrapError::Serialize { error }
    }
}
