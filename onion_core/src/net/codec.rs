/*! Codec for encoding/decoding node packets over TCP using tokio-io.

Every packet is prefixed with its length as a big-endian `u32`.
*/

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use nom::combinator::all_consuming;
use onion_binary_io::*;
use onion_packet::node::{Request, Response};
use tokio_util::codec::{Decoder, Encoder};

use super::*;

/// Size of the length prefix of a framed packet.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Struct to use for {de-,}serializing node packets. `T` is the type of
/// incoming packets, anything serializable can be sent.
pub struct NodeCodec<T> {
    phantom: PhantomData<fn() -> T>,
}

/// Codec of the side that receives requests.
pub type ServerCodec = NodeCodec<Request>;

/// Codec of the side that sends requests.
pub type ClientCodec = NodeCodec<Response>;

impl<T> NodeCodec<T> {
    /// Make object
    pub fn new() -> Self {
        NodeCodec { phantom: PhantomData }
    }
}

impl<T> Default for NodeCodec<T> {
    fn default() -> Self {
        NodeCodec::new()
    }
}

impl<T: FromBytes> Decoder for NodeCodec<T> {
    type Item = T;
    type Error = DecodeError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if len > MAX_NODE_PACKET_SIZE {
            return Err(DecodeError::too_big_packet(len))
        }

        if buf.len() < LENGTH_PREFIX_SIZE + len {
            buf.reserve(LENGTH_PREFIX_SIZE + len - buf.len());
            return Ok(None);
        }

        buf.advance(LENGTH_PREFIX_SIZE);
        let packet = buf.split_to(len);
        let result = match all_consuming(T::from_bytes)(&packet[..]) {
            Err(error) => {
                Err(DecodeError::deserialize(error, packet.to_vec()))
            },
            Ok((_, packet)) => {
                Ok(Some(packet))
            }
        };
        result
    }
}

impl<T, P: ToBytes> Encoder<P> for NodeCodec<T> {
    type Error = EncodeError;

    fn encode(&mut self, packet: P, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut packet_buf = vec![0; MAX_NODE_PACKET_SIZE];
        let (_, size) = packet.to_bytes((&mut packet_buf, 0))
            .map_err(EncodeError::serialize)?;

        buf.reserve(LENGTH_PREFIX_SIZE + size);
        buf.put_u32(size as u32);
        buf.extend_from_slice(&packet_buf[..size]);
        Ok(())
    }
}
