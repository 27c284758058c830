//! Netlink message and attribute codec.
//!
//! This is the lowest layer of quotanl. It knows nothing about sockets; it
//! turns bytes into netlink headers and tag-length-value attributes and back:
//! - [`message`]: the 16-byte `nlmsghdr` and the 4-byte generic netlink header
//! - [`attr`]: attribute streams (`len | type | value | pad`), nested or flat
//! - [`ctrl`]: constants of the generic netlink controller family
//!
//! All integers are little-endian on the wire.

pub mod attr;
pub mod ctrl;
pub mod error;
pub mod message;

pub use attr::{encode_attribute, Attribute, AttributeDecoder, AttributeEncoder, NLA_HDRLEN};
pub use error::{Result, WireError};
pub use message::{
    decode_messages, encode_genl_message, GenlHeader, NetlinkHeader, NetlinkMessage,
    GENL_HDRLEN, NLMSG_HDRLEN,
};
