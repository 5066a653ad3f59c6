//! Sealing of symmetric keys for a relay's `PublicKey`.

use aead::{Aead, AeadCore, Error as AeadError};
use crypto_box::SalsaBox;
use nom::IResult;
use nom::combinator::{rest, verify};
use onion_binary_io::FromBytes;
use rand::thread_rng;

use crate::*;

/** Encrypt short plaintext for the owner of `public_key`.

A one-time key pair is generated for every call so the receiver needs only
its own `SecretKey` to open the box.

Serialized form:

Length   | Content
-------- | ------
`32`     | Ephemeral `PublicKey`
`24`     | Nonce
variable | Encrypted plaintext (plaintext length + 16)

Plaintext must not be longer than an encoded key.
*/
pub fn asymmetric_encrypt(plaintext: &[u8], public_key: &PublicKey) -> Result<Vec<u8>, EncryptError> {
    if plaintext.len() > ENCODED_KEY_SIZE {
        return Err(EncryptError::TooLong { len: plaintext.len(), max: ENCODED_KEY_SIZE })
    }

    let mut rng = thread_rng();
    let ephemeral_sk = SecretKey::generate(&mut rng);
    let salsa_box = SalsaBox::new(public_key, &ephemeral_sk);
    let nonce = SalsaBox::generate_nonce(&mut rng);
    let encrypted = salsa_box.encrypt(&nonce, plaintext)
        .map_err(|AeadError| EncryptError::Encrypt)?;

    let mut ciphertext = Vec::with_capacity(ASYMMETRIC_OVERHEAD + plaintext.len());
    ciphertext.extend_from_slice(ephemeral_sk.public_key().as_bytes());
    ciphertext.extend_from_slice(&nonce);
    ciphertext.extend_from_slice(&encrypted);
    Ok(ciphertext)
}

fn sealed_from_bytes(input: &[u8]) -> IResult<&[u8], (PublicKey, Nonce, &[u8])> {
    let (input, ephemeral_pk) = PublicKey::from_bytes(input)?;
    let (input, nonce) = Nonce::from_bytes(input)?;
    let (input, encrypted) = verify(rest, |encrypted: &[u8]| encrypted.len() >= MACBYTES)(input)?;
    Ok((input, (ephemeral_pk, nonce, encrypted)))
}

/// Open the box produced by `asymmetric_encrypt` with our `SecretKey`.
pub fn asymmetric_decrypt(ciphertext: &[u8], secret_key: &SecretKey) -> Result<Vec<u8>, DecryptError> {
    let (_, (ephemeral_pk, nonce, encrypted)) = sealed_from_bytes(ciphertext)
        .map_err(|_| DecryptError::Malformed { len: ciphertext.len() })?;

    let salsa_box = SalsaBox::new(&ephemeral_pk, secret_key);
    salsa_box.decrypt((&nonce).into(), encrypted)
        .map_err(|AeadError| DecryptError::Decrypt)
}
