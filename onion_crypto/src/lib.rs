//! Functions for the layered cipher.
//!
//! Every onion layer is protected by a fresh symmetric key. The symmetric key
//! is encoded as text and sealed with the public key of the relay that owns
//! the layer, so a relay can recover the key with its `SecretKey` only.

#![forbid(unsafe_code)]

mod asymmetric;
mod encoding;
mod errors;
mod symmetric;

pub use self::asymmetric::*;
pub use self::encoding::*;
pub use self::errors::*;
pub use self::symmetric::*;

use crypto_box::{SalsaBox, aead::generic_array::typenum::marker_traits::Unsigned};
use crypto_box::aead::AeadCore;
use rand::RngCore;
use rand::rngs::OsRng;
pub use crypto_box::{PublicKey, SecretKey, KEY_SIZE};

/// Nonce of the asymmetric box.
pub type Nonce = [u8; <SalsaBox as AeadCore>::NonceSize::USIZE];
/// Size of the asymmetric box nonce.
pub const NONCEBYTES: usize = <SalsaBox as AeadCore>::NonceSize::USIZE;
/// Size of the authentication tag added by both ciphers.
pub const MACBYTES: usize = <SalsaBox as AeadCore>::TagSize::USIZE;

/// Size of the raw symmetric key.
pub const SYMMETRIC_KEY_SIZE: usize = xsalsa20poly1305::KEY_SIZE;
/// Size of a key in its text form: two hex digits per byte.
pub const ENCODED_KEY_SIZE: usize = KEY_SIZE * 2;

/// Bytes added by `asymmetric_encrypt`: ephemeral `PublicKey`, nonce and tag.
pub const ASYMMETRIC_OVERHEAD: usize = KEY_SIZE + NONCEBYTES + MACBYTES;
/// Bytes added by `symmetric_encrypt`: nonce and tag.
pub const SYMMETRIC_OVERHEAD: usize = xsalsa20poly1305::NONCE_SIZE + xsalsa20poly1305::TAG_SIZE;

/** Width of the key segment that starts every onion layer.

It's an encoded symmetric key sealed for the relay's `PublicKey`. The width
never changes so relays split layers without extra framing.
*/
pub const ENCRYPTED_KEY_SIZE: usize = ENCODED_KEY_SIZE + ASYMMETRIC_OVERHEAD;

/** Generate a fresh key pair for a node.

Key material is taken straight from the operating system. If it fails to
provide entropy the node can't work, so callers should treat the error as
fatal.
*/
pub fn generate_key_pair() -> Result<(PublicKey, SecretKey), KeyGenerationError> {
    let mut bytes = [0; KEY_SIZE];
    OsRng.try_fill_bytes(&mut bytes)
        .map_err(|e| KeyGenerationError::entropy(&e))?;
    let sk = SecretKey::from(bytes);
    Ok((sk.public_key(), sk))
}
