/*! Inspection enum
*/

use super::*;

use nom::combinator::map_opt;
use nom::number::complete::be_u8;

/** Piece of runtime state a node can be asked about.

Relays answer `LastReceivedEncryptedMessage`, `LastReceivedDecryptedMessage`,
`LastMessageDestination`, `PrivateKey`; users answer `LastReceivedMessage`,
`LastSentMessage` and `LastCircuit`.

Serialized form:

Length | Content
------ | ------
`1`    | Code of the inspected field

*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Inspection {
    /// Layer as it arrived at the relay.
    LastReceivedEncryptedMessage,
    /// Inner payload the relay forwarded after peeling one layer.
    LastReceivedDecryptedMessage,
    /// Address the relay forwarded the last message to.
    LastMessageDestination,
    /// Encoded `SecretKey` of the relay. Debug only.
    PrivateKey,
    /// Plaintext the user received last.
    LastReceivedMessage,
    /// Plaintext the user sent last.
    LastSentMessage,
    /// Relay ids of the last circuit, entry first.
    LastCircuit,
}

impl Inspection {
    fn code(self) -> u8 {
        match self {
            Inspection::LastReceivedEncryptedMessage => 0,
            Inspection::LastReceivedDecryptedMessage => 1,
            Inspection::LastMessageDestination => 2,
            Inspection::PrivateKey => 3,
            Inspection::LastReceivedMessage => 4,
            Inspection::LastSentMessage => 5,
            Inspection::LastCircuit => 6,
        }
    }

    fn from_code(code: u8) -> Option<Inspection> {
        match code {
            0 => Some(Inspection::LastReceivedEncryptedMessage),
            1 => Some(Inspection::LastReceivedDecryptedMessage),
            2 => Some(Inspection::LastMessageDestination),
            3 => Some(Inspection::PrivateKey),
            4 => Some(Inspection::LastReceivedMessage),
            5 => Some(Inspection::LastSentMessage),
            6 => Some(Inspection::LastCircuit),
            _ => None,
        }
    }
}

impl FromBytes for Inspection {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map_opt(be_u8, Inspection::from_code)(input)
    }
}

impl ToBytes for Inspection {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf, gen_be_u8!(self.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    encode_decode_test!(
        inspection_encode_decode,
        Inspection::LastMessageDestination
    );

    #[test]
    fn inspection_unknown_code() {
        assert!(Inspection::from_bytes(&[7]).is_err());
    }
}
