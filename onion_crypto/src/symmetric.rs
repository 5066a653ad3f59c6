//! Symmetric encryption of layer bodies.

use std::fmt;

use aead::{Aead, AeadCore, Error as AeadError, KeyInit};
use aead::generic_array::GenericArray;
use rand::{thread_rng, CryptoRng, RngCore};
use xsalsa20poly1305::XSalsa20Poly1305;

use crate::*;

/// Key that protects exactly one onion layer.
#[derive(Clone, Eq, PartialEq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Generate random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> SymmetricKey {
        let mut bytes = [0; SYMMETRIC_KEY_SIZE];
        rng.fill_bytes(&mut bytes);
        SymmetricKey(bytes)
    }

    /// Raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }

    fn cipher(&self) -> XSalsa20Poly1305 {
        XSalsa20Poly1305::new(GenericArray::from_slice(&self.0))
    }
}

impl From<[u8; SYMMETRIC_KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        SymmetricKey(bytes)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Generate a fresh symmetric key for one layer.
pub fn generate_symmetric_key() -> SymmetricKey {
    SymmetricKey::generate(&mut thread_rng())
}

/** Encrypt arbitrary payload with symmetric key.

Serialized form:

Length   | Content
-------- | ------
`24`     | Nonce
variable | Encrypted payload (plaintext length + 16)

*/
pub fn symmetric_encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, EncryptError> {
    let nonce = XSalsa20Poly1305::generate_nonce(&mut thread_rng());
    let encrypted = key.cipher().encrypt(&nonce, plaintext)
        .map_err(|AeadError| EncryptError::Encrypt)?;

    let mut ciphertext = Vec::with_capacity(nonce.len() + encrypted.len());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend_from_slice(&encrypted);
    Ok(ciphertext)
}

/// Decrypt payload produced by `symmetric_encrypt`.
pub fn symmetric_decrypt(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if ciphertext.len() < SYMMETRIC_OVERHEAD {
        return Err(DecryptError::Malformed { len: ciphertext.len() })
    }

    let (nonce, encrypted) = ciphertext.split_at(xsalsa20poly1305::NONCE_SIZE);
    key.cipher().decrypt(GenericArray::from_slice(nonce), encrypted)
        .map_err(|AeadError| DecryptError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_encrypt_decrypt() {
        let key = generate_symmetric_key();
        let plaintext = b"0000003001hello";
        let ciphertext = symmetric_encrypt(&key, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + SYMMETRIC_OVERHEAD);
        assert_eq!(symmetric_decrypt(&key, &ciphertext).unwrap(), plaintext.to_vec());
    }

    #[test]
    fn symmetric_encrypt_empty() {
        let key = generate_symmetric_key();
        let ciphertext = symmetric_encrypt(&key, &[]).unwrap();
        assert_eq!(ciphertext.len(), SYMMETRIC_OVERHEAD);
        assert!(symmetric_decrypt(&key, &ciphertext).unwrap().is_empty());
    }

    #[test]
    fn symmetric_encrypt_uses_fresh_nonce() {
        let key = generate_symmetric_key();
        let ciphertext_1 = symmetric_encrypt(&key, b"hello").unwrap();
        let ciphertext_2 = symmetric_encrypt(&key, b"hello").unwrap();
        assert_ne!(ciphertext_1, ciphertext_2);
    }

    #[test]
    fn symmetric_decrypt_invalid_key() {
        let key = generate_symmetric_key();
        let eve_key = generate_symmetric_key();
        let ciphertext = symmetric_encrypt(&key, b"hello").unwrap();
        assert_eq!(symmetric_decrypt(&eve_key, &ciphertext), Err(DecryptError::Decrypt));
    }

    #[test]
    fn symmetric_decrypt_tampered() {
        let key = generate_symmetric_key();
        let mut ciphertext = symmetric_encrypt(&key, b"hello").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert_eq!(symmetric_decrypt(&key, &ciphertext), Err(DecryptError::Decrypt));
    }

    #[test]
    fn symmetric_decrypt_too_short() {
        let key = generate_symmetric_key();
        let res = symmetric_decrypt(&key, &[42; SYMMETRIC_OVERHEAD - 1]);
        assert_eq!(res, Err(DecryptError::Malformed { len: SYMMETRIC_OVERHEAD - 1 }));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_symmetric_key(), generate_symmetric_key());
    }
}
