use std::time::SystemTime;

use bytes::Bytes;
use quotanl_wire::GenlHeader;

use crate::error::Result;
use crate::family::Family;

/// A generic netlink message as delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: GenlHeader,
    /// Attribute stream following the generic netlink header.
    pub data: Bytes,
}

impl Message {
    /// Create a message with protocol version 1.
    pub fn new(command: u8, data: impl Into<Bytes>) -> Self {
        Self {
            header: GenlHeader {
                command,
                version: 1,
            },
            data: data.into(),
        }
    }
}

/// A connected generic netlink endpoint.
///
/// Implementations are shared between threads: every operation takes `&self`,
/// and `close` must unblock a concurrent `receive`.
pub trait GenericNetlink: Send + Sync {
    /// Look up a family and its multicast groups by name.
    fn resolve_family(&self, name: &str) -> Result<Family>;

    /// Subscribe to a multicast group.
    fn join_group(&self, group: u32) -> Result<()>;

    /// Block until the next datagram and return the messages it carries.
    fn receive(&self) -> Result<Vec<Message>>;

    /// Set an absolute read deadline; `None` disables it.
    fn set_deadline(&self, deadline: Option<SystemTime>) -> Result<()>;

    /// Release the connection.
    fn close(&self) -> Result<()>;
}
