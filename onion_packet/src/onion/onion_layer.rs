/*! OnionLayer packet with LayerPayload
*/

use super::*;

use std::str;

use nom::bytes::complete::take;
use nom::combinator::{rest, rest_len, verify};
use onion_binary_io::*;
use onion_crypto::*;

use crate::address::Address;

/** One layer of the onion. Only the relay owning the `SecretKey` that
matches the sealing `PublicKey` can peel it.

Serialized form:

Length   | Content
-------- | ------
`136`    | Encoded symmetric key sealed for the relay's `PublicKey`
variable | Payload

where payload is [`LayerPayload`](./struct.LayerPayload.html) encrypted with
the symmetric key.

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OnionLayer {
    /// Sealed symmetric key, always `ENCRYPTED_KEY_SIZE` bytes
    pub encrypted_key: Vec<u8>,
    /// Encrypted payload
    pub payload: Vec<u8>,
}

impl FromBytes for OnionLayer {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = verify(rest_len, |len| *len <= MAX_ONION_PACKET_SIZE)(input)?;
        let (input, encrypted_key) = take(ENCRYPTED_KEY_SIZE)(input)?;
        let (input, payload) = verify(rest, |payload: &[u8]| payload.len() >= MIN_LAYER_PAYLOAD_SIZE)(input)?;
        Ok((input, OnionLayer {
            encrypted_key: encrypted_key.to_vec(),
            payload: payload.to_vec(),
        }))
    }
}

impl ToBytes for OnionLayer {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_cond!(
                self.encrypted_key.len() != ENCRYPTED_KEY_SIZE || self.payload.len() < MIN_LAYER_PAYLOAD_SIZE,
                |buf| gen_error(buf, 0)
            ) >>
            gen_slice!(self.encrypted_key.as_slice()) >>
            gen_slice!(self.payload.as_slice()) >>
            gen_len_limit(MAX_ONION_PACKET_SIZE)
        )
    }
}

impl OnionLayer {
    /** Wrap `payload` into a layer for the relay owning `public_key`.

    A fresh symmetric key is generated for every layer.
    */
    pub fn new(public_key: &PublicKey, payload: &LayerPayload) -> Result<OnionLayer, WrapError> {
        let key = generate_symmetric_key();
        let body = serialize(payload, MAX_LAYER_BODY_SIZE)?;
        let payload = symmetric_encrypt(&key, &body)?;
        let encrypted_key = asymmetric_encrypt(key.encode_key().as_bytes(), public_key)?;

        Ok(OnionLayer { encrypted_key, payload })
    }

    /// Serialize the layer so it can be sent to a relay.
    pub fn to_vec(&self) -> Result<Vec<u8>, WrapError> {
        serialize(self, MAX_ONION_PACKET_SIZE).map_err(WrapError::from)
    }

    /** Recover the symmetric key, decrypt payload and parse it as
    `LayerPayload`.

    Returns `Error` in case of failure:

    - fails to open the key segment
    - key segment isn't an encoded symmetric key
    - fails to decrypt the payload
    - fails to parse as `LayerPayload`
    */
    pub fn get_payload(&self, secret_key: &SecretKey) -> Result<LayerPayload, GetPayloadError> {
        let encoded_key = asymmetric_decrypt(&self.encrypted_key, secret_key)
            .map_err(GetPayloadError::decrypt_key)?;
        let key = str::from_utf8(&encoded_key).ok()
            .and_then(|text| SymmetricKey::decode_key(text).ok())
            .ok_or(GetPayloadError::InvalidKey)?;
        let decrypted = symmetric_decrypt(&key, &self.payload)
            .map_err(GetPayloadError::decrypt)?;
        match LayerPayload::from_bytes(&decrypted) {
            Err(error) => {
                Err(GetPayloadError::deserialize(error, decrypted.clone()))
            },
            Ok((_, inner)) => {
                Ok(inner)
            }
        }
    }
}

/** Decrypted payload of `OnionLayer` packet.

Inner payload should be sent to the node with address from `destination`
field. For the exit relay the inner payload is the plaintext message.

Serialized form:

Length   | Content
-------- | ------
`10`     | `Address` of the next node
variable | Payload

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayerPayload {
    /// Address of the next node
    pub destination: Address,
    /// Inner onion payload
    pub inner: Vec<u8>,
}

impl FromBytes for LayerPayload {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, destination) = Address::from_bytes(input)?;
        let (input, inner) = rest(input)?;
        Ok((input, LayerPayload {
            destination,
            inner: inner.to_vec(),
        }))
    }
}

impl ToBytes for LayerPayload {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_call!(|buf, destination| Address::to_bytes(destination, buf), &self.destination) >>
            gen_slice!(self.inner.as_slice()) >>
            gen_len_limit(MAX_LAYER_BODY_SIZE)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        onion_layer_encode_decode,
        OnionLayer {
            encrypted_key: vec![42; ENCRYPTED_KEY_SIZE],
            payload: vec![42; MIN_LAYER_PAYLOAD_SIZE],
        }
    );

    encode_decode_test!(
        layer_payload_encode_decode,
        LayerPayload {
            destination: Address(4002),
            inner: vec![42; 123],
        }
    );

    fn layer_payload() -> LayerPayload {
        LayerPayload {
            destination: Address(3007),
            inner: b"hello".to_vec(),
        }
    }

    #[test]
    fn onion_layer_wrap_peel() {
        let (pk, sk) = generate_key_pair().unwrap();
        let payload = layer_payload();
        let layer = OnionLayer::new(&pk, &payload).unwrap();
        assert_eq!(layer.encrypted_key.len(), ENCRYPTED_KEY_SIZE);
        assert_eq!(layer.to_vec().unwrap().len(), LAYER_OVERHEAD + payload.inner.len());
        assert_eq!(layer.get_payload(&sk).unwrap(), payload);
    }

    #[test]
    fn onion_layer_wrap_twice_differs() {
        let (pk, _sk) = generate_key_pair().unwrap();
        let layer_1 = OnionLayer::new(&pk, &layer_payload()).unwrap();
        let layer_2 = OnionLayer::new(&pk, &layer_payload()).unwrap();
        assert_ne!(layer_1, layer_2);
    }

    #[test]
    fn onion_layer_peel_invalid_secret_key() {
        let (pk, _sk) = generate_key_pair().unwrap();
        let (_eve_pk, eve_sk) = generate_key_pair().unwrap();
        let layer = OnionLayer::new(&pk, &layer_payload()).unwrap();
        assert_eq!(
            layer.get_payload(&eve_sk),
            Err(GetPayloadError::DecryptKey { error: DecryptError::Decrypt })
        );
    }

    #[test]
    fn onion_layer_peel_tampered_key_segment() {
        let (pk, sk) = generate_key_pair().unwrap();
        let mut layer = OnionLayer::new(&pk, &layer_payload()).unwrap();
        layer.encrypted_key[ENCRYPTED_KEY_SIZE - 1] ^= 0x01;
        assert!(layer.get_payload(&sk).unwrap_err().is_decryption());
    }

    #[test]
    fn onion_layer_peel_tampered_payload() {
        let (pk, sk) = generate_key_pair().unwrap();
        let mut layer = OnionLayer::new(&pk, &layer_payload()).unwrap();
        layer.payload[SYMMETRIC_OVERHEAD] ^= 0x01;
        assert_eq!(
            layer.get_payload(&sk),
            Err(GetPayloadError::Decrypt { error: DecryptError::Decrypt })
        );
    }

    #[test]
    fn onion_layer_peel_invalid_key_text() {
        let (pk, sk) = generate_key_pair().unwrap();
        let key = generate_symmetric_key();
        let layer = OnionLayer {
            encrypted_key: asymmetric_encrypt(&[b'Z'; ENCODED_KEY_SIZE], &pk).unwrap(),
            payload: symmetric_encrypt(&key, b"0000003007hello").unwrap(),
        };
        assert_eq!(layer.get_payload(&sk), Err(GetPayloadError::InvalidKey));
    }

    #[test]
    fn onion_layer_peel_invalid_destination() {
        let (pk, sk) = generate_key_pair().unwrap();
        let key = generate_symmetric_key();
        let layer = OnionLayer {
            encrypted_key: asymmetric_encrypt(key.encode_key().as_bytes(), &pk).unwrap(),
            payload: symmetric_encrypt(&key, b"00000x3007hello").unwrap(),
        };
        let error = layer.get_payload(&sk).unwrap_err();
        assert!(matches!(error, GetPayloadError::Deserialize { ref payload, .. } if payload == b"00000x3007hello"));
        assert!(!error.is_decryption());
    }

    #[test]
    fn onion_layer_from_bytes_too_short() {
        assert!(OnionLayer::from_bytes(&[42; ENCRYPTED_KEY_SIZE + MIN_LAYER_PAYLOAD_SIZE - 1]).is_err());
    }

    #[test]
    fn onion_layer_from_bytes_too_long() {
        assert!(OnionLayer::from_bytes(&vec![42; MAX_ONION_PACKET_SIZE + 1]).is_err());
    }

    #[test]
    fn onion_layer_to_bytes_invalid_key_segment() {
        let layer = OnionLayer {
            encrypted_key: vec![42; ENCRYPTED_KEY_SIZE - 1],
            payload: vec![42; MIN_LAYER_PAYLOAD_SIZE],
        };
        assert!(layer.to_vec().is_err());
    }

    #[test]
    fn onion_layer_new_too_big() {
        let (pk, _sk) = generate_key_pair().unwrap();
        let payload = LayerPayload {
            destination: Address(3007),
            inner: vec![42; MAX_LAYER_BODY_SIZE],
        };
        assert!(matches!(OnionLayer::new(&pk, &payload), Err(WrapError::Serialize { .. })));
    }
}
