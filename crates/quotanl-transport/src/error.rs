/// Errors that can occur in generic netlink transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to create the netlink socket.
    #[error("failed to open netlink socket: {0}")]
    Socket(std::io::Error),

    /// Failed to bind the netlink socket.
    #[error("failed to bind netlink socket: {0}")]
    Bind(std::io::Error),

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The kernel does not know the requested family.
    #[error("generic netlink family {name:?} not found")]
    FamilyNotFound { name: String },

    /// The kernel answered a request with an error.
    #[error("netlink error {errno}: {}", errno_message(.errno))]
    Netlink { errno: i32 },

    /// A datagram could not be decoded.
    #[error("malformed netlink data: {0}")]
    Wire(#[from] quotanl_wire::WireError),

    /// A datagram did not fit the receive buffer.
    #[error("datagram of {size} bytes exceeds receive buffer ({max} bytes)")]
    MessageTooLarge { size: usize, max: usize },

    /// The kernel answered with something other than what was asked for.
    #[error("unexpected netlink response: {0}")]
    UnexpectedResponse(String),

    /// The read deadline passed before a message arrived.
    #[error("deadline exceeded")]
    Timeout,

    /// The transport has been closed.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// True for a passed read deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

fn errno_message(errno: &i32) -> String {
    std::io::Error::from_raw_os_error(*errno).to_string()
}

pub type Result<T> = std::result::Result<T, TransportError>;
