/// Errors that can occur while encoding or decoding netlink data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The buffer ended before a complete header or value.
    #[error("truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// A length prefix is smaller than its own header.
    #[error("invalid {what} length {len}")]
    InvalidLength { what: &'static str, len: usize },

    /// A fixed-width accessor was used on a value of a different size.
    #[error("attribute {kind}: expected {expected}-byte value, got {actual} bytes")]
    InvalidWidth {
        kind: u16,
        expected: usize,
        actual: usize,
    },

    /// A string attribute is not valid UTF-8.
    #[error("attribute {kind}: string value is not valid UTF-8")]
    InvalidString { kind: u16 },

    /// The encoded item does not fit its length prefix.
    #[error("{what} too large ({size} bytes, max {max})")]
    TooLarge {
        what: &'static str,
        size: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, WireError>;
