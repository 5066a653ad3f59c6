/*! Packets exchanged by onion overlay nodes.

- [`address`](./address/index.html): addresses of overlay nodes;
- [`onion`](./onion/index.html): layered ciphertext peeled by relays;
- [`node`](./node/index.html): requests and responses between nodes.
*/

#![forbid(unsafe_code)]
// Remove it when it will be fixed in nom parser
#![allow(clippy::redundant_closure)]

#[macro_use]
extern crate cookie_factory;

pub mod address;
pub mod onion;
pub mod node;
