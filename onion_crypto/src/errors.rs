use thiserror::Error;

/// Error that can happen when generating a key pair.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum KeyGenerationError {
    /// The operating system failed to provide random bytes.
    #[error("Failed to gather entropy for a key pair: {message}")]
    Entropy {
        /// Description of the underlying failure.
        message: String,
    },
}

impl KeyGenerationError {
    pub(crate) fn entropy(error: &rand::Error) -> KeyGenerationError {
        KeyGenerationError::Entropy { message: error.to_string() }
    }
}

/// Error that can happen when decoding a key from its text form.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DecodeKeyError {
    /// Text is not a hex string of the right length.
    #[error("Invalid key encoding: {error}")]
    InvalidEncoding {
        /// Hex decoding error.
        error: hex::FromHexError,
    },
}

impl From<hex::FromHexError> for DecodeKeyError {
    fn from(error: hex::FromHexError) -> DecodeKeyError {
        DecodeKeyError::InvalidEncoding { error }
    }
}

/// Error that can happen when encrypting.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EncryptError {
    /// Plaintext is larger than the asymmetric box can carry.
    #[error("Plaintext is too long: {len} bytes, at most {max} bytes allowed")]
    TooLong {
        /// Length of the plaintext.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The cipher refused to encrypt the plaintext.
    #[error("Encrypt error")]
    Encrypt,
}

/// Error that can happen when decrypting.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecryptError {
    /// Ciphertext is too short to contain the cipher framing.
    #[error("Ciphertext is malformed: {len} bytes")]
    Malformed {
        /// Length of the ciphertext.
        len: usize,
    },
    /// Ciphertext wasn't produced for this key or was tampered with.
    #[error("Decrypt error")]
    Decrypt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_error_display() {
        let error = EncryptError::TooLong { len: 100, max: 64 };
        assert_eq!(format!("{}", error), "Plaintext is too long: 100 bytes, at most 64 bytes allowed");
    }

    #[test]
    fn decrypt_error_display() {
        assert_eq!(format!("{}", DecryptError::Decrypt), "Decrypt error");
        assert_eq!(format!("{}", DecryptError::Malformed { len: 3 }), "Ciphertext is malformed: 3 bytes");
    }
}
