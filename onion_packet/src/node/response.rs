/*! Response enum
*/

use super::*;

use nom::combinator::map_opt;
use nom::multi::{length_count, many0};
use nom::number::complete::be_u8;
use nom::sequence::pair;

use crate::address::Address;

/// Reason a node refused or failed a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailureKind {
    /// Relay id is already present in the directory.
    AlreadyRegistered,
    /// Relay public key is empty or can't be decoded.
    InvalidPublicKey,
    /// Directory knows less relays than a circuit needs.
    InsufficientNodes,
    /// Onion layer can't be peeled with the relay's key.
    Decryption,
    /// Peeled layer can't be delivered to its destination.
    Routing,
    /// Message can't be handed to the entry relay.
    Delivery,
    /// Requested state doesn't exist yet.
    NotFound,
    /// Node doesn't serve this request.
    Unsupported,
    /// Request is well formed but its content isn't.
    Malformed,
}

impl FailureKind {
    fn code(self) -> u8 {
        match self {
            FailureKind::AlreadyRegistered => 0,
            FailureKind::InvalidPublicKey => 1,
            FailureKind::InsufficientNodes => 2,
            FailureKind::Decryption => 3,
            FailureKind::Routing => 4,
            FailureKind::Delivery => 5,
            FailureKind::NotFound => 6,
            FailureKind::Unsupported => 7,
            FailureKind::Malformed => 8,
        }
    }

    fn from_code(code: u8) -> Option<FailureKind> {
        match code {
            0 => Some(FailureKind::AlreadyRegistered),
            1 => Some(FailureKind::InvalidPublicKey),
            2 => Some(FailureKind::InsufficientNodes),
            3 => Some(FailureKind::Decryption),
            4 => Some(FailureKind::Routing),
            5 => Some(FailureKind::Delivery),
            6 => Some(FailureKind::NotFound),
            7 => Some(FailureKind::Unsupported),
            8 => Some(FailureKind::Malformed),
            _ => None,
        }
    }
}

impl FromBytes for FailureKind {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        map_opt(be_u8, FailureKind::from_code)(input)
    }
}

/** Response of an overlay node.

Serialized form:

Length   | Content
-------- | ------
`1`      | Packet id
variable | Fields of the response

Packet id | Response       | Fields
--------- | -------------- | ------
`0x80`    | `Live`         |
`0x81`    | `Done`         |
`0x82`    | `Failure`      | `u8` kind, `u16` length, UTF-8 description
`0x83`    | `NodeRegistry` | `u16` count, [`NodeIdentity`](./struct.NodeIdentity.html) entries
`0x84`    | `Bytes`        | presence byte, `u32` length, bytes
`0x85`    | `Text`         | presence byte, `u16` length, UTF-8 text
`0x86`    | `Destination`  | presence byte, `u32` address
`0x87`    | `Circuit`      | `u32` relay ids up to the end of the packet

*/
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Node is up and serving.
    Live,
    /// Request was carried out.
    Done,
    /// Request failed.
    Failure {
        /// Reason of the failure
        kind: FailureKind,
        /// Human readable description
        message: String,
    },
    /// Relays known to the directory in registration order.
    NodeRegistry(Vec<NodeIdentity>),
    /// Inspected byte string, `None` when nothing was recorded yet.
    Bytes(Option<Vec<u8>>),
    /// Inspected text, `None` when nothing was recorded yet.
    Text(Option<String>),
    /// Inspected address, `None` when nothing was recorded yet.
    Destination(Option<Address>),
    /// Relay ids of a circuit, entry first.
    Circuit(Vec<u32>),
}

impl Response {
    /// Create failure response.
    pub fn failure<M: Into<String>>(kind: FailureKind, message: M) -> Response {
        Response::Failure { kind, message: message.into() }
    }
}

impl FromBytes for Response {
    fn from_bytes(input: &[u8]) -> IResult<&[u8], Self> {
        alt((
            map(tag(&[0x80][..]), |_| Response::Live),
            map(tag(&[0x81][..]), |_| Response::Done),
            map(
                preceded(tag(&[0x82][..]), pair(FailureKind::from_bytes, string_from_bytes)),
                |(kind, message)| Response::Failure { kind, message }
            ),
            map(
                preceded(tag(&[0x83][..]), length_count(be_u16, NodeIdentity::from_bytes)),
                Response::NodeRegistry
            ),
            map(preceded(tag(&[0x84][..]), option_from_bytes(blob_from_bytes)), Response::Bytes),
            map(preceded(tag(&[0x85][..]), option_from_bytes(string_from_bytes)), Response::Text),
            map(
                preceded(tag(&[0x86][..]), option_from_bytes(map(be_u32, Address))),
                Response::Destination
            ),
            map(preceded(tag(&[0x87][..]), many0(be_u32)), Response::Circuit),
        ))(input)
    }
}

impl ToBytes for Response {
    fn to_bytes<'a>(&self, buf: (&'a mut [u8], usize)) -> Result<(&'a mut [u8], usize), GenError> {
        let buf = match self {
            Response::Live => do_gen!(buf,
                gen_be_u8!(0x80)
            ),
            Response::Done => do_gen!(buf,
                gen_be_u8!(0x81)
            ),
            Response::Failure { kind, message } => do_gen!(buf,
                gen_be_u8!(0x82) >>
                gen_be_u8!(kind.code()) >>
                gen_call!(gen_string, message)
            ),
            Response::NodeRegistry(nodes) => do_gen!(buf,
                gen_be_u8!(0x83) >>
                gen_cond!(nodes.len() > usize::from(u16::MAX), |buf| gen_error(buf, 0)) >>
                gen_be_u16!(nodes.len() as u16) >>
                gen_many_ref!(nodes, |buf, node| NodeIdentity::to_bytes(node, buf))
            ),
            Response::Bytes(None) => do_gen!(buf,
                gen_be_u8!(0x84) >>
                gen_be_u8!(0x00)
            ),
            Response::Bytes(Some(bytes)) => do_gen!(buf,
                gen_be_u8!(0x84) >>
                gen_be_u8!(0x01) >>
                gen_call!(gen_blob, bytes)
            ),
            Response::Text(None) => do_gen!(buf,
                gen_be_u8!(0x85) >>
                gen_be_u8!(0x00)
            ),
            Response::Text(Some(text)) => do_gen!(buf,
                gen_be_u8!(0x85) >>
                gen_be_u8!(0x01) >>
                gen_call!(gen_string, text)
            ),
            Response::Destination(None) => do_gen!(buf,
                gen_be_u8!(0x86) >>
                gen_be_u8!(0x00)
            ),
            Response::Destination(Some(address)) => do_gen!(buf,
                gen_be_u8!(0x86) >>
                gen_be_u8!(0x01) >>
                gen_be_u32!(address.0)
            ),
            Response::Circuit(ids) => do_gen!(buf,
                gen_be_u8!(0x87) >>
                gen_many_ref!(ids, |buf, id: &u32| gen_be_u32!(buf, *id))
            ),
        }?;
        gen_len_limit(buf, MAX_NODE_PACKET_SIZE)
    }
}
