/*! Network address of an overlay node.
*/

use std::fmt;
use std::str;

use nom::bytes::complete::take;
use nom::combinator::{map, map_res, verify};
use onion_binary_io::*;

/// Width in bytes of the destination field inside an onion layer.
pub const DESTINATION_SIZE: usize = 10;

/** Address of a node in the overlay.

Every relay and user is reachable at an address derived from a base value
plus its id. Address `0` is never assigned and means "no destination".

Serialized form inside an onion layer:

Length | Content
------ | ------
`10`   | Address as decimal ASCII digits, zero-padded

*/
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Address(pub u32);

impl Address {
    /// Address that routes nowhere.
    pub const NONE: Address = Address(0);

    /// Whether this address names an actual node.
    pub fn is_present(&self) -> bool {
        self.0 != 0
    }

    /// Fixed-width decimal form used in onion layers.
    pub fn to_fixed_width(&self) -> String {
        format!("{:0width$}", self.0, width = DESTINATION_SIZE)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Address {
    fn from(address: u32) -> Self {
        Address(address)
    }
}

impl FromBytes for Address {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let digits = verify(take(DESTINATION_SIZE), |digits: &[u8]| digits.iter().all(u8::is_ascii_digit));
        let digits = map_res(digits, str::from_utf8);
        map(map_res(digits, str::parse::<u32>), Address)(input)
    }
}

impl ToBytes for Address {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_slice!(self.to_fixed_width().as_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        address_encode_decode,
        Address(4001)
    );

    #[test]
    fn address_fixed_width() {
        assert_eq!(Address(3007).to_fixed_width(), "0000003007");
        assert_eq!(Address(u32::MAX).to_fixed_width(), "4294967295");
        assert_eq!(Address::NONE.to_fixed_width(), "0000000000");
    }

    #[test]
    fn address_from_bytes_keeps_rest() {
        let (rest, address) = Address::from_bytes(b"0000004002hello").unwrap();
        assert_eq!(address, Address(4002));
        assert_eq!(rest, b"hello");
    }

    #[test]
    fn address_from_bytes_not_digits() {
        assert!(Address::from_bytes(b"00000040x2").is_err());
        assert!(Address::from_bytes(b"-000004002").is_err());
    }

    #[test]
    fn address_from_bytes_overflow() {
        assert!(Address::from_bytes(b"9999999999").is_err());
    }

    #[test]
    fn address_from_bytes_too_short() {
        assert!(Address::from_bytes(b"4002").is_err());
    }

    #[test]
    fn address_is_present() {
        assert!(!Address::NONE.is_present());
        assert!(Address(1).is_present());
    }
}
