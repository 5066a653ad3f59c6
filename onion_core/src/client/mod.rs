/*! Client side of the overlay: circuits and user nodes.
*/

mod circuit;
mod errors;
mod user;

pub use self::circuit::*;
pub use self::errors::*;
pub use self::user::*;
