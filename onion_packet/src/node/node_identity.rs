/*! NodeIdentity struct
*/

use super::*;

use onion_crypto::{DecodeKeyError, EncodeKey, PublicKey};

/** Identity a relay registers in the directory.

The public key is kept in its text form: the directory only stores and
lists it, clients decode it when they build a circuit.

Serialized form:

Length   | Content
-------- | ------
`4`      | Id of the relay
`2`      | Length of the public key text
variable | Public key text

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeIdentity {
    /// Id of the relay, unique within the directory
    pub id: u32,
    /// Encoded `PublicKey` of the relay
    pub public_key: String,
}

impl NodeIdentity {
    /// Create identity for the relay with given `PublicKey`.
    pub fn new(id: u32, public_key: &PublicKey) -> NodeIdentity {
        NodeIdentity {
            id,
            public_key: public_key.encode_key(),
        }
    }

    /// Decode public key of the relay.
    pub fn decode_public_key(&self) -> Result<PublicKey, DecodeKeyError> {
        PublicKey::decode_key(&self.public_key)
    }
}

impl FromBytes for NodeIdentity {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, id) = be_u32(input)?;
        let (input, public_key) = string_from_bytes(input)?;
        Ok((input, NodeIdentity { id, public_key }))
    }
}

impl ToBytes for NodeIdentity {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        do_gen!(buf,
            gen_be_u32!(self.id) >>
            gen_call!(gen_string, &self.public_key)
        )
    }
}
