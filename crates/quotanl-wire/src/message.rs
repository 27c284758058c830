use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Netlink header: length (4) + type (2) + flags (2) + seq (4) + pid (4).
pub const NLMSG_HDRLEN: usize = 16;

/// Generic netlink header: cmd (1) + version (1) + reserved (2).
pub const GENL_HDRLEN: usize = 4;

/// Messages start on 4-byte boundaries.
pub const NLMSG_ALIGNTO: usize = 4;

pub const NLMSG_NOOP: u16 = 0x1;
pub const NLMSG_ERROR: u16 = 0x2;
pub const NLMSG_DONE: u16 = 0x3;
pub const NLMSG_OVERRUN: u16 = 0x4;

pub const NLM_F_REQUEST: u16 = 0x1;
pub const NLM_F_MULTI: u16 = 0x2;
pub const NLM_F_ACK: u16 = 0x4;

/// Round `len` up to the message alignment.
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// The `nlmsghdr` preceding every netlink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetlinkHeader {
    /// Total message length including this header.
    pub length: u32,
    /// Message type; for generic netlink this is the family id.
    pub kind: u16,
    pub flags: u16,
    pub sequence: u32,
    /// Sending port id; 0 for the kernel.
    pub pid: u32,
}

/// The generic netlink header following `nlmsghdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenlHeader {
    pub command: u8,
    pub version: u8,
}

/// A single netlink message with its payload sliced out of the datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlinkMessage {
    pub header: NetlinkHeader,
    pub payload: Bytes,
}

impl NetlinkMessage {
    /// Split the payload into a generic netlink header and attribute bytes.
    pub fn genl(&self) -> Result<(GenlHeader, Bytes)> {
        if self.payload.len() < GENL_HDRLEN {
            return Err(WireError::Truncated {
                what: "generic netlink header",
                needed: GENL_HDRLEN,
                available: self.payload.len(),
            });
        }
        let header = GenlHeader {
            command: self.payload[0],
            version: self.payload[1],
        };
        Ok((header, self.payload.slice(GENL_HDRLEN..)))
    }

    /// The errno carried by an `NLMSG_ERROR` message, as a positive value.
    ///
    /// Returns 0 for an acknowledgement.
    pub fn error_code(&self) -> Result<i32> {
        if self.payload.len() < 4 {
            return Err(WireError::Truncated {
                what: "netlink error",
                needed: 4,
                available: self.payload.len(),
            });
        }
        let raw = i32::from_le_bytes([
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
        ]);
        Ok(raw.saturating_neg())
    }
}

/// Encode a generic netlink request.
///
/// Wire format:
/// ```text
/// ┌──────────┬────────┬─────────┬────────┬────────┬─────┬─────────┬──────────┬────────────┐
/// │ Length   │ Type   │ Flags   │ Seq    │ Pid    │ Cmd │ Version │ Reserved │ Attributes │
/// │ (4B LE)  │ (2B)   │ (2B)    │ (4B)   │ (4B)   │ (1) │ (1)     │ (2)      │            │
/// └──────────┴────────┴─────────┴────────┴────────┴─────┴─────────┴──────────┴────────────┘
/// ```
pub fn encode_genl_message(
    kind: u16,
    flags: u16,
    sequence: u32,
    genl: GenlHeader,
    attrs: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let len = NLMSG_HDRLEN + GENL_HDRLEN + attrs.len();
    if len > u32::MAX as usize {
        return Err(WireError::TooLarge {
            what: "netlink message",
            size: len,
            max: u32::MAX as usize,
        });
    }

    let padded = nlmsg_align(len);
    dst.reserve(padded);
    dst.put_u32_le(len as u32);
    dst.put_u16_le(kind);
    dst.put_u16_le(flags);
    dst.put_u32_le(sequence);
    dst.put_u32_le(0);
    dst.put_u8(genl.command);
    dst.put_u8(genl.version);
    dst.put_u16_le(0);
    dst.put_slice(attrs);
    dst.put_bytes(0, padded - len);
    Ok(())
}

/// Decode every netlink message contained in one datagram.
pub fn decode_messages(src: &Bytes) -> Result<Vec<NetlinkMessage>> {
    let mut messages = Vec::new();
    let mut offset = 0usize;

    while offset < src.len() {
        let rest = &src[offset..];
        if rest.len() < NLMSG_HDRLEN {
            return Err(WireError::Truncated {
                what: "netlink header",
                needed: NLMSG_HDRLEN,
                available: rest.len(),
            });
        }

        let header = NetlinkHeader {
            length: u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]),
            kind: u16::from_le_bytes([rest[4], rest[5]]),
            flags: u16::from_le_bytes([rest[6], rest[7]]),
            sequence: u32::from_le_bytes([rest[8], rest[9], rest[10], rest[11]]),
            pid: u32::from_le_bytes([rest[12], rest[13], rest[14], rest[15]]),
        };

        let len = header.length as usize;
        if len < NLMSG_HDRLEN {
            return Err(WireError::InvalidLength {
                what: "netlink message",
                len,
            });
        }
        if len > rest.len() {
            return Err(WireError::Truncated {
                what: "netlink message",
                needed: len,
                available: rest.len(),
            });
        }

        let payload = src.slice(offset + NLMSG_HDRLEN..offset + len);
        messages.push(NetlinkMessage { header, payload });
        offset += nlmsg_align(len).min(rest.len());
    }

    Ok(messages)
}
