/*! Errors enum for node transports.
*/

use std::io::Error as IoError;

use cookie_factory::GenError;
use nom::error::Error as NomError;
use onion_packet::address::Address;
use onion_packet::node::{FailureKind, Response};
use thiserror::Error;

use super::MAX_NODE_PACKET_SIZE;

/// Error that can happen when decoding a node packet from bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Error indicates that we received too big packet.
    #[error("Packet should not be longer than {} bytes: {} bytes", MAX_NODE_PACKET_SIZE, len)]
    TooBigPacket {
        /// Length of received packet.
        len: usize
    },
    /// Error indicates that received packet can't be parsed.
    #[error("Deserialize Packet error: {:?}, packet: {:?}", error, packet)]
    Deserialize {
        /// Parsing error.
        error: nom::Err<NomError<Vec<u8>>>,
        /// Received packet.
        packet: Vec<u8>,
    },
    /// General IO error that can happen with TCP socket.
    #[error("IO Error")]
    Io(IoError),
}

impl DecodeError {
    pub(crate) fn too_big_packet(len: usize) -> DecodeError {
        DecodeError::TooBigPacket { len }
    }

    pub(crate) fn deserialize(e: nom::Err<NomError<&[u8]>>, packet: Vec<u8>) -> DecodeError {
        DecodeError::Deserialize { error: e.map(|e| NomError::new(e.input.to_vec(), e.code)), packet }
    }
}

/// Error that can happen when encoding a node packet to bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Error indicates that packet is invalid and can't be serialized.
    #[error("Serialize Packet error: {:?}", error)]
    Serialize {
        /// Serialization error.
        error: GenError
    },
    /// General IO error that can happen with TCP socket.
    #[error("IO Error")]
    Io(IoError),
}

impl EncodeError {
    pub(crate) fn serialize(error: GenError) -> EncodeError {
        EncodeError::Serialize { error }
    }
}

impl From<IoError> for DecodeError {
    fn from(error: IoError) -> DecodeError {
        DecodeError::Io(error)
    }
}

impl From<IoError> for EncodeError {
    fn from(error: IoError) -> EncodeError {
        EncodeError::Io(error)
    }
}

/// Error that can happen when a request is carried to another node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No node is listening on the address.
    #[error("Node {} is unreachable", address)]
    Unreachable {
        /// Address of the node.
        address: Address,
    },
    /// Address can't be mapped to a socket address.
    #[error("Address {} is out of the port range", address)]
    InvalidAddress {
        /// Address of the node.
        address: Address,
    },
    /// Connection to the node can't be established.
    #[error("Failed to connect to node {}: {}", address, error)]
    Connect {
        /// Address of the node.
        address: Address,
        /// Connection error.
        error: IoError,
    },
    /// Node didn't answer in time.
    #[error("Node {} didn't answer in time", address)]
    Timeout {
        /// Address of the node.
        address: Address,
    },
    /// Node closed connection without answering.
    #[error("Node {} closed connection without a response", address)]
    Closed {
        /// Address of the node.
        address: Address,
    },
    /// Request can't be written.
    #[error("Send request error: {}", error)]
    Encode {
        /// Encoding error.
        error: EncodeError,
    },
    /// Response can't be read.
    #[error("Receive response error: {}", error)]
    Decode {
        /// Decoding error.
        error: DecodeError,
    },
}

impl From<EncodeError> for TransportError {
    fn from(error: EncodeError) -> TransportError {
        TransportError::Encode { error }
    }
}

impl From<DecodeError> for TransportError {
    fn from(error: DecodeError) -> TransportError {
        TransportError::Decode { error }
    }
}

/// Error that can happen when one node asks another one to do something.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Request didn't reach the node or response didn't come back.
    #[error("Request to node {} failed: {}", address, error)]
    Transport {
        /// Address of the node.
        address: Address,
        /// Transport error.
        error: TransportError,
    },
    /// Node answered with a failure.
    #[error("Node {} refused request: {:?}: {}", address, kind, message)]
    Failure {
        /// Address of the node.
        address: Address,
        /// Reason reported by the node.
        kind: FailureKind,
        /// Description reported by the node.
        message: String,
    },
    /// Node answered with a response that doesn't fit the request.
    #[error("Unexpected response from node {}: {:?}", address, response)]
    UnexpectedResponse {
        /// Address of the node.
        address: Address,
        /// Received response.
        response: Response,
    },
}

impl RequestError {
    /// Reason reported by the remote node, if it answered with a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RequestError::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
