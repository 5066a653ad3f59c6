/*! Request/response plumbing between overlay nodes.

Nodes never share memory: a node talks to another one only by sending it a
[`Request`](../../onion_packet/node/enum.Request.html) and awaiting the
[`Response`](../../onion_packet/node/enum.Response.html). Two transports
are provided: [`LocalNetwork`](./struct.LocalNetwork.html) keeps every node in
one process, [`TcpTransport`](./struct.TcpTransport.html) reaches nodes
listening on TCP ports.
*/

mod codec;
mod errors;
mod local;
mod tcp;

pub use self::codec::*;
pub use self::errors::*;
pub use self::local::*;
pub use self::tcp::*;

use futures::future::BoxFuture;
pub use onion_packet::address::Address;
pub use onion_packet::node::MAX_NODE_PACKET_SIZE;
use onion_packet::node::{Request, Response};

/// Default address of the directory.
pub const DEFAULT_DIRECTORY_ADDRESS: u32 = 8080;
/// Default base of relay addresses.
pub const DEFAULT_BASE_RELAY_ADDRESS: u32 = 4000;
/// Default base of user addresses.
pub const DEFAULT_BASE_USER_ADDRESS: u32 = 3000;

/// Node that answers requests.
pub trait Service: Send + Sync {
    /// Handle one request. Failures are reported inside the response.
    fn handle(&self, request: Request) -> BoxFuture<'_, Response>;
}

/// Way to carry a request to the node with given address.
pub trait Transport: Send + Sync {
    /// Send request and wait for the response.
    fn send(&self, address: Address, request: Request) -> BoxFuture<'_, Result<Response, TransportError>>;
}

/** Where nodes can be found.

Relays and users live at `base + id`, each kind with its own base, the
directory has a fixed address.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddressBook {
    /// Address of the directory.
    pub directory: Address,
    /// Base of relay addresses.
    pub base_relay: u32,
    /// Base of user addresses.
    pub base_user: u32,
}

impl Default for AddressBook {
    fn default() -> Self {
        AddressBook {
            directory: Address(DEFAULT_DIRECTORY_ADDRESS),
            base_relay: DEFAULT_BASE_RELAY_ADDRESS,
            base_user: DEFAULT_BASE_USER_ADDRESS,
        }
    }
}

impl AddressBook {
    /// Address of the relay with given id.
    pub fn relay(&self, id: u32) -> Address {
        Address(self.base_relay.saturating_add(id))
    }

    /// Address of the user with given id.
    pub fn user(&self, id: u32) -> Address {
        Address(self.base_user.saturating_add(id))
    }
}

/** Send request and turn failure responses into errors.

Any other response is returned as is, the caller checks it's the one it
expects.
*/
pub async fn send_request(transport: &dyn Transport, address: Address, request: Request) -> Result<Response, RequestError> {
    match transport.send(address, request).await {
        Err(error) => Err(RequestError::Transport { address, error }),
        Ok(Response::Failure { kind, message }) => Err(RequestError::Failure { address, kind, message }),
        Ok(response) => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_book_default() {
        let book = AddressBook::default();
        assert_eq!(book.directory, Address(8080));
        assert_eq!(book.relay(1), Address(4001));
        assert_eq!(book.user(7), Address(3007));
    }

    #[test]
    fn address_book_saturates() {
        let book = AddressBook { directory: Address(1), base_relay: u32::MAX - 1, base_user: 0 };
        assert_eq!(book.relay(5), Address(u32::MAX));
        assert_eq!(book.user(0), Address::NONE);
    }
}
