/*!
Nodes of the onion overlay.

- [`directory`](./directory/index.html) keeps the registry of relays;
- [`relay`](./relay/index.html) peels one layer of every message and
  forwards the rest;
- [`client`](./client/index.html) builds circuits and sends messages through
  them;
- [`net`](./net/index.html) carries requests between nodes.

*/

#![forbid(unsafe_code)]
// Remove it when it will be fixed in nom parser
#![allow(clippy::redundant_closure)]

#[macro_use]
extern crate log;

pub mod net;
pub mod directory;
pub mod relay;
pub mod client;
