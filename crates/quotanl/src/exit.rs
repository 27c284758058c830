use std::fmt;
use std::io;

use quotanl_client::QuotaError;
use quotanl_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::Unsupported => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Socket(source) | TransportError::Bind(source) | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::Timeout => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Netlink { errno }
            if io::Error::from_raw_os_error(errno).kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Wire(_) | TransportError::MessageTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        TransportError::Shutdown => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn quota_error(context: &str, err: QuotaError) -> CliError {
    match err {
        QuotaError::Transport(err) => transport_error(context, err),
        QuotaError::UnexpectedMessageCount { .. }
        | QuotaError::UnexpectedCommand { .. }
        | QuotaError::MalformedAttributes(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        QuotaError::GroupNotFound { .. } | QuotaError::Closed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use quotanl_wire::WireError;

    use super::*;

    #[test]
    fn permission_errors_map_to_50() {
        let err = transport_error(
            "dial failed",
            TransportError::Bind(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.starts_with("dial failed: "));

        let err = transport_error("join failed", TransportError::Netlink { errno: 1 });
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn timeout_maps_to_124() {
        let err = quota_error("receive failed", QuotaError::Transport(TransportError::Timeout));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn protocol_and_decode_errors_are_data_invalid() {
        let cases = [
            QuotaError::UnexpectedMessageCount { count: 2 },
            QuotaError::UnexpectedCommand { command: 7 },
            QuotaError::MalformedAttributes(WireError::InvalidLength {
                what: "attribute",
                len: 2,
            }),
            QuotaError::Transport(TransportError::Wire(WireError::InvalidLength {
                what: "message",
                len: 3,
            })),
        ];
        for err in cases {
            assert_eq!(quota_error("receive failed", err).code, DATA_INVALID);
        }
    }

    #[test]
    fn lookup_errors() {
        let err = quota_error(
            "connect failed",
            QuotaError::GroupNotFound {
                family: "VFS_DQUOT".into(),
                group: "events".into(),
            },
        );
        assert_eq!(err.code, FAILURE);

        let err = transport_error(
            "resolve failed",
            TransportError::FamilyNotFound {
                name: "VFS_DQUOT".into(),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
