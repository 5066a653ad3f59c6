use std::convert::TryInto;

use nom::IResult;
use nom::bytes::streaming::take;
use nom::combinator::map_opt;

use crypto_box::{PublicKey, KEY_SIZE};

use super::FromBytes;

/// Ephemeral keys prefixing sealed boxes.
impl FromBytes for PublicKey {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map_opt(take(KEY_SIZE), |pk: &[u8]| pk.try_into().ok().map(|pk: [u8; KEY_SIZE]| PublicKey::from(pk)))(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_from_bytes_keeps_rest() {
        let mut bytes = vec![42; KEY_SIZE];
        bytes.push(7);
        let (rest, pk) = PublicKey::from_bytes(&bytes).unwrap();

        assert_eq!(pk.as_bytes(), &[42; KEY_SIZE]);
        assert_eq!(rest, &[7]);
    }

    #[test]
    fn public_key_from_short_input() {
        assert!(PublicKey::from_bytes(&[42; KEY_SIZE - 1]).is_err());
    }
}
