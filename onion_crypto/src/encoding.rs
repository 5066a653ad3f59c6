//! Text form of keys.

use hex::FromHex;

use crate::*;

/** Lossless conversion of a key to text that survives any transport.

Keys are written as uppercase hex. Decoding accepts either case and ignores
surrounding whitespace.
*/
pub trait EncodeKey: Sized {
    /// Encode key as text.
    fn encode_key(&self) -> String;
    /// Decode key from text produced by `encode_key`.
    fn decode_key(text: &str) -> Result<Self, DecodeKeyError>;
}

fn decode_bytes(text: &str) -> Result<[u8; KEY_SIZE], DecodeKeyError> {
    <[u8; KEY_SIZE]>::from_hex(text.trim()).map_err(DecodeKeyError::from)
}

impl EncodeKey for PublicKey {
    fn encode_key(&self) -> String {
        hex::encode_upper(self.as_bytes())
    }

    fn decode_key(text: &str) -> Result<Self, DecodeKeyError> {
        decode_bytes(text).map(PublicKey::from)
    }
}

impl EncodeKey for SecretKey {
    fn encode_key(&self) -> String {
        hex::encode_upper(self.as_bytes())
    }

    fn decode_key(text: &str) -> Result<Self, DecodeKeyError> {
        decode_bytes(text).map(SecretKey::from)
    }
}

impl EncodeKey for SymmetricKey {
    fn encode_key(&self) -> String {
        hex::encode_upper(self.as_bytes())
    }

    fn decode_key(text: &str) -> Result<Self, DecodeKeyError> {
        decode_bytes(text).map(SymmetricKey::from)
    }
}
