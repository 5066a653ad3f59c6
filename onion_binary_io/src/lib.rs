/*! Serialization traits shared by all onion overlay packets.

Packets are parsed with `nom` and written with `cookie-factory` into a
caller-provided buffer.
*/

#![forbid(unsafe_code)]

pub use nom::IResult;
pub use cookie_factory::GenError;

#[cfg(feature = "crypto")]
mod crypto;

#[cfg(feature = "crypto")]
pub use self::crypto::*;

use nom::bytes::streaming::take;
use nom::combinator::map_opt;
use std::convert::TryInto;

/// The trait provides method to deserialize struct from raw bytes
pub trait FromBytes: Sized {
    /// Deserialize struct using `nom` from raw bytes
    fn from_bytes(i: &[u8]) -> IResult<&[u8], Self>;
}

/// The trait provides method to serialize struct into raw bytes
pub trait ToBytes: Sized {
    /// Serialize struct into raw bytes using `cookie_factory`
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError>;
}

/// Nonces of `crypto_box` boxes.
impl FromBytes for [u8; 24] {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map_opt(take(24usize), |bytes: &[u8]| bytes.try_into().ok())(input)
    }
}

/// Generator that always fails with custom error.
pub fn gen_error(_buf: (&mut [u8], usize), error: u32) -> Result<(&mut [u8], usize), GenError> {
    Err(GenError::CustomError(error))
}

/// Generator that ensures that length of serialized data does not exceed
/// specified limit.
pub fn gen_len_limit(buf: (&mut [u8], usize), limit: usize) -> Result<(&mut [u8], usize), GenError> {
    if buf.1 <= limit {
        Ok(buf)
    } else {
        Err(GenError::BufferTooBig(limit))
    }
}

/** Serialize value into a freshly allocated vector.

`max_size` is the size of the scratch buffer, serialization fails with
`GenError::BufferTooSmall` when the value does not fit.
*/
pub fn serialize<T: ToBytes>(value: &T, max_size: usize) -> Result<Vec<u8>, GenError> {
    let mut buf = vec![0; max_size];
    let (_, size) = value.to_bytes((&mut buf, 0))?;
    buf.truncate(size);
    Ok(buf)
}

/// Generate a test that serializes value, deserializes it back and checks
/// that both values are equal.
#[macro_export]
macro_rules! encode_decode_test (
    ($test:ident, $value:expr) => (
        #[test]
        fn $test() {
            let value = $value;
            let buf = $crate::serialize(&value, 64 * 1024).unwrap();
            let (rest, decoded_value) = $crate::FromBytes::from_bytes(&buf).unwrap();
            // this helps compiler to infer type of decoded_value
            // i.e. it means that decoded_value has the same type as value
            fn infer<T>(_: &T, _: &T) { }
            infer(&decoded_value, &value);
            assert!(rest.is_empty());
            assert_eq!(decoded_value, value);
        }
    )
);
