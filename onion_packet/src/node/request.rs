/*! Request enum
*/

use super::*;

use nom::sequence::pair;

/** Request sent to an overlay node.

Serialized form:

Length   | Content
-------- | ------
`1`      | Packet id
variable | Fields of the request

Packet id | Request          | Fields
--------- | ---------------- | ------
`0x00`    | `Status`         |
`0x01`    | `RegisterNode`   | [`NodeIdentity`](./struct.NodeIdentity.html)
`0x02`    | `GetNodeRegistry`|
`0x03`    | `Message`        | `u32` length, payload
`0x04`    | `SendMessage`    | `u16` length, UTF-8 message, `u32` user id
`0x05`    | `Inspect`        | [`Inspection`](./enum.Inspection.html)

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Liveness probe, answered by every node.
    Status,
    /// Register a relay in the directory.
    RegisterNode(NodeIdentity),
    /// List relays known to the directory.
    GetNodeRegistry,
    /// Deliver bytes to the node: an onion layer for relays, plaintext for
    /// users.
    Message(Vec<u8>),
    /// Ask a user node to send a message through a fresh circuit.
    SendMessage {
        /// Plaintext message
        message: String,
        /// Id of the receiving user
        destination_user_id: u32,
    },
    /// Read a piece of runtime state.
    Inspect(Inspection),
}

impl FromBytes for Request {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        alt((
            map(tag(&[0x00][..]), |_| Request::Status),
            map(preceded(tag(&[0x01][..]), NodeIdentity::from_bytes), Request::RegisterNode),
            map(tag(&[0x02][..]), |_| Request::GetNodeRegistry),
            map(preceded(tag(&[0x03][..]), blob_from_bytes), Request::Message),
            map(
                preceded(tag(&[0x04][..]), pair(string_from_bytes, be_u32)),
                |(message, destination_user_id)| Request::SendMessage { message, destination_user_id }
            ),
            map(preceded(tag(&[0x05][..]), Inspection::from_bytes), Request::Inspect),
        ))(input)
    }
}

impl ToBytes for Request {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let buf = match self {
            Request::Status => do_gen!(buf,
                gen_be_u8!(0x00)
            ),
            Request::RegisterNode(identity) => do_gen!(buf,
                gen_be_u8!(0x01) >>
                gen_call!(|buf, identity| NodeIdentity::to_bytes(identity, buf), identity)
            ),
            Request::GetNodeRegistry => do_gen!(buf,
                gen_be_u8!(0x02)
            ),
            Request::Message(payload) => do_gen!(buf,
                gen_be_u8!(0x03) >>
                gen_call!(gen_blob, payload)
            ),
            Request::SendMessage { message, destination_user_id } => do_gen!(buf,
                gen_be_u8!(0x04) >>
                gen_call!(gen_string, message) >>
                gen_be_u32!(*destination_user_id)
            ),
            Request::Inspect(inspection) => do_gen!(buf,
                gen_be_u8!(0x05) >>
                gen_call!(|buf, inspection| Inspection::to_bytes(inspection, buf), inspection)
            ),
        }?;
        gen_len_limit(buf, MAX_NODE_PACKET_SIZE)
    }
}
