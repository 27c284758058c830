//! Generic netlink transport abstraction.
//!
//! [`GenericNetlink`] is the capability everything above this crate is
//! written against: resolve a family, join a multicast group, receive,
//! set a deadline, close. Two implementations ship here:
//! - [`NetlinkSocket`]: a raw `NETLINK_GENERIC` socket (Linux)
//! - [`fake::FakeConnection`]: an in-memory transport for tests (`fake` feature)

pub mod error;
pub mod family;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod socket;

#[cfg(feature = "fake")]
pub mod fake;

pub use error::{Result, TransportError};
pub use family::{Family, MulticastGroup};
pub use quotanl_wire::GenlHeader;
pub use traits::{GenericNetlink, Message};

#[cfg(target_os = "linux")]
pub use socket::{NetlinkSocket, SocketConfig};
