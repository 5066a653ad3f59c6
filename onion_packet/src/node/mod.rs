/*! Requests and responses exchanged between overlay nodes.

Every node, be it the directory, a relay or a user, answers a request with
exactly one response.
*/

mod inspection;
mod node_identity;
mod request;
mod response;

pub use self::inspection::*;
pub use self::node_identity::*;
pub use self::request::*;
pub use self::response::*;

use std::str;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::{map, map_res};
use nom::multi::length_data;
use nom::number::complete::{be_u16, be_u32};
use nom::sequence::preceded;
use onion_binary_io::*;
use onion_crypto::ENCODED_KEY_SIZE;

/** A serialized node packet should be not longer than 64 KiB.

The limit caps the registry a directory can send in one
`Response::NodeRegistry`: see [`MAX_REGISTRY_NODES`](./constant.MAX_REGISTRY_NODES.html).
*/
pub const MAX_NODE_PACKET_SIZE: usize = 64 * 1024;

/// Size of a serialized `NodeIdentity`: id, key length, encoded key.
pub const NODE_IDENTITY_SIZE: usize = 4 + 2 + ENCODED_KEY_SIZE;

/// Number of relays that fit into one `Response::NodeRegistry` after its
/// packet id and `u16` count. Larger registries fail to serialize.
pub const MAX_REGISTRY_NODES: usize = (MAX_NODE_PACKET_SIZE - 3) / NODE_IDENTITY_SIZE;

/// Parse UTF-8 string prefixed with its `u16` length.
fn string_from_bytes(input: &[u8]) -> IResult<&[u8], String> {
    map(map_res(length_data(be_u16), str::from_utf8), str::to_owned)(input)
}

/// Write UTF-8 string prefixed with its `u16` length.
fn gen_string<'a>(buf: (&'a mut [u8], usize), value: &str) -> Result<(&'a mut [u8], usize), GenError> {
    do_gen!(buf,
        gen_cond!(value.len() > usize::from(u16::MAX), |buf| gen_error(buf, 0)) >>
        gen_be_u16!(value.len() as u16) >>
        gen_slice!(value.as_bytes())
    )
}

/// Parse bytes prefixed with their `u32` length.
fn blob_from_bytes(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    map(length_data(be_u32), <[u8]>::to_vec)(input)
}

/// Write bytes prefixed with their `u32` length.
fn gen_blob<'a>(buf: (&'a mut [u8], usize), value: &[u8]) -> Result<(&'a mut [u8], usize), GenError> {
    do_gen!(buf,
        gen_be_u32!(value.len() as u32) >>
        gen_slice!(value)
    )
}

/// Parse optional value preceded by a presence byte.
fn option_from_bytes<'a, O, F>(parser: F) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], Option<O>>
where
    F: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
{
    alt((
        map(tag(&[0x00][..]), |_| None),
        map(preceded(tag(&[0x01][..]), parser), Some),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_encode_decode() {
        let mut buf = [0; 16];
        let (_, size) = gen_string((&mut buf, 0), "hello").unwrap();
        assert_eq!(&buf[..size], b"\x00\x05hello");
        assert_eq!(string_from_bytes(&buf[..size]).unwrap(), (&[][..], "hello".to_owned()));
    }

    #[test]
    fn string_too_long() {
        let mut buf = vec![0; MAX_NODE_PACKET_SIZE + 8];
        let value = "a".repeat(usize::from(u16::MAX) + 1);
        assert!(gen_string((&mut buf, 0), &value).is_err());
    }

    #[test]
    fn string_invalid_utf8() {
        assert!(string_from_bytes(b"\x00\x02\xff\xfe").is_err());
    }

    #[test]
    fn blob_encode_decode() {
        let mut buf = [0; 16];
        let (_, size) = gen_blob((&mut buf, 0), &[1, 2, 3]).unwrap();
        assert_eq!(&buf[..size], &[0, 0, 0, 3, 1, 2, 3]);
        assert_eq!(blob_from_bytes(&buf[..size]).unwrap(), (&[][..], vec![1, 2, 3]));
    }

    #[test]
    fn blob_truncated() {
        assert!(blob_from_bytes(&[0, 0, 0, 3, 1, 2]).is_err());
    }

    #[test]
    fn option_decode() {
        let mut parser = option_from_bytes(be_u16);
        assert_eq!(parser(&[0x00][..]).unwrap(), (&[][..], None));
        assert_eq!(parser(&[0x01, 0x12, 0x34][..]).unwrap(), (&[][..], Some(0x1234)));
        assert!(parser(&[0x02, 0x12, 0x34][..]).is_err());
    }
}
