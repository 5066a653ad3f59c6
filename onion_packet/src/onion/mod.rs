/*! Onion layers.

A message travels through the overlay wrapped in one layer per relay. Each
layer names the next hop and carries the next layer (or, for the exit relay,
the plaintext message) as an opaque byte string.
*/

mod errors;
mod onion_layer;

pub use self::errors::*;
pub use self::onion_layer::*;

use onion_crypto::{ENCRYPTED_KEY_SIZE, SYMMETRIC_OVERHEAD};

use crate::address::DESTINATION_SIZE;

/// The maximum size of a whole onion packet including every layer.
pub const MAX_ONION_PACKET_SIZE: usize = 60 * 1024;

/// Bytes added by one layer: key segment, cipher framing and destination.
pub const LAYER_OVERHEAD: usize = ENCRYPTED_KEY_SIZE + SYMMETRIC_OVERHEAD + DESTINATION_SIZE;

/// Encrypted body must contain at least a destination.
pub const MIN_LAYER_PAYLOAD_SIZE: usize = SYMMETRIC_OVERHEAD + DESTINATION_SIZE;

/// The maximum size of the decrypted body of a single layer.
pub const MAX_LAYER_BODY_SIZE: usize = MAX_ONION_PACKET_SIZE - ENCRYPTED_KEY_SIZE - SYMMETRIC_OVERHEAD;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_overhead() {
        assert_eq!(LAYER_OVERHEAD, 186);
        assert_eq!(MIN_LAYER_PAYLOAD_SIZE, 50);
    }
}
