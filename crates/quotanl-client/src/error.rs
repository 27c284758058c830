use quotanl_transport::TransportError;
use quotanl_wire::WireError;

/// Errors returned by quota notification operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// The underlying netlink connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The family has no usable multicast group with the requested name.
    #[error("could not find {group:?} multicast group in family {family:?}")]
    GroupNotFound { family: String, group: String },

    /// A datagram carried other than exactly one message.
    #[error("expected 1 generic netlink message, but received {count}")]
    UnexpectedMessageCount { count: usize },

    /// A message carried a command other than the warning command.
    #[error("unexpected generic netlink command: {command}")]
    UnexpectedCommand { command: u8 },

    /// The message payload is not a well-formed attribute stream.
    #[error("malformed attribute stream: {0}")]
    MalformedAttributes(#[from] WireError),

    /// The client has been closed.
    #[error("client is closed")]
    Closed,
}

impl QuotaError {
    /// True when a received batch broke the one-message, one-command rule.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            QuotaError::UnexpectedMessageCount { .. } | QuotaError::UnexpectedCommand { .. }
        )
    }

    /// True when the read deadline passed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QuotaError::Transport(err) if err.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, QuotaError>;
