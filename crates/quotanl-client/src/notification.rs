use std::fmt;

use quotanl_wire::AttributeDecoder;
use serde::Serialize;
use tracing::trace;

use crate::constants::*;
use crate::error::Result;

/// A disk quota notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Notification {
    /// Which kind of quota was crossed.
    #[serde(rename = "type")]
    pub quota_type: QuotaType,
    /// User, group or project id the quota belongs to.
    pub id: i64,
    pub warning: Warning,
    /// Block device the quota lives on.
    pub device_major: i64,
    pub device_minor: i64,
    /// User id of the process whose write triggered the event.
    pub caused_id: i64,
}

/// A quota type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    #[default]
    User,
    Group,
    Project,
    /// A type this crate does not know yet; carries the raw value.
    Unknown(u32),
}

impl From<u32> for QuotaType {
    fn from(raw: u32) -> Self {
        match raw {
            USRQUOTA => QuotaType::User,
            GRPQUOTA => QuotaType::Group,
            PRJQUOTA => QuotaType::Project,
            other => QuotaType::Unknown(other),
        }
    }
}

impl From<QuotaType> for u32 {
    fn from(t: QuotaType) -> Self {
        match t {
            QuotaType::User => USRQUOTA,
            QuotaType::Group => GRPQUOTA,
            QuotaType::Project => PRJQUOTA,
            QuotaType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaType::User => f.write_str("user"),
            QuotaType::Group => f.write_str("group"),
            QuotaType::Project => f.write_str("project"),
            QuotaType::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// The event that caused a notification to be sent.
///
/// `*Below` variants report usage falling back under a limit; the others
/// report a limit being exceeded. "Long" soft warnings mean the grace period
/// ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    #[default]
    None,
    InodeHard,
    InodeSoftLong,
    InodeSoft,
    BlockHard,
    BlockSoftLong,
    BlockSoft,
    InodeHardBelow,
    InodeSoftBelow,
    BlockHardBelow,
    BlockSoftBelow,
    /// A warning this crate does not know yet; carries the raw value.
    Unknown(u32),
}

impl From<u32> for Warning {
    fn from(raw: u32) -> Self {
        match raw {
            QUOTA_NL_NOWARN => Warning::None,
            QUOTA_NL_IHARDWARN => Warning::InodeHard,
            QUOTA_NL_ISOFTLONGWARN => Warning::InodeSoftLong,
            QUOTA_NL_ISOFTWARN => Warning::InodeSoft,
            QUOTA_NL_BHARDWARN => Warning::BlockHard,
            QUOTA_NL_BSOFTLONGWARN => Warning::BlockSoftLong,
            QUOTA_NL_BSOFTWARN => Warning::BlockSoft,
            QUOTA_NL_IHARDBELOW => Warning::InodeHardBelow,
            QUOTA_NL_ISOFTBELOW => Warning::InodeSoftBelow,
            QUOTA_NL_BHARDBELOW => Warning::BlockHardBelow,
            QUOTA_NL_BSOFTBELOW => Warning::BlockSoftBelow,
            other => Warning::Unknown(other),
        }
    }
}

impl From<Warning> for u32 {
    fn from(w: Warning) -> Self {
        match w {
            Warning::None => QUOTA_NL_NOWARN,
            Warning::InodeHard => QUOTA_NL_IHARDWARN,
            Warning::InodeSoftLong => QUOTA_NL_ISOFTLONGWARN,
            Warning::InodeSoft => QUOTA_NL_ISOFTWARN,
            Warning::BlockHard => QUOTA_NL_BHARDWARN,
            Warning::BlockSoftLong => QUOTA_NL_BSOFTLONGWARN,
            Warning::BlockSoft => QUOTA_NL_BSOFTWARN,
            Warning::InodeHardBelow => QUOTA_NL_IHARDBELOW,
            Warning::InodeSoftBelow => QUOTA_NL_ISOFTBELOW,
            Warning::BlockHardBelow => QUOTA_NL_BHARDBELOW,
            Warning::BlockSoftBelow => QUOTA_NL_BSOFTBELOW,
            Warning::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Warning::None => "none",
            Warning::InodeHard => "inode hard limit reached",
            Warning::InodeSoftLong => "inode soft limit exceeded too long",
            Warning::InodeSoft => "inode soft limit exceeded",
            Warning::BlockHard => "block hard limit reached",
            Warning::BlockSoftLong => "block soft limit exceeded too long",
            Warning::BlockSoft => "block soft limit exceeded",
            Warning::InodeHardBelow => "inode usage below hard limit",
            Warning::InodeSoftBelow => "inode usage below soft limit",
            Warning::BlockHardBelow => "block usage below hard limit",
            Warning::BlockSoftBelow => "block usage below soft limit",
            Warning::Unknown(raw) => return write!(f, "unknown({raw})"),
        };
        f.write_str(name)
    }
}

/// Parse the attribute stream of a warning message into a [`Notification`].
///
/// Attributes may come in any order; unknown ones are skipped and missing
/// ones leave their field at zero. A malformed stream, or a known attribute
/// of the wrong width, fails the whole decode.
pub fn decode_notification(payload: &[u8]) -> Result<Notification> {
    let mut n = Notification::default();

    for attr in AttributeDecoder::new(payload) {
        let attr = attr?;
        match attr.kind {
            QUOTA_NL_A_QTYPE => n.quota_type = QuotaType::from(attr.u32()?),
            QUOTA_NL_A_EXCESS_ID => n.id = attr.u64()? as i64,
            QUOTA_NL_A_WARNING => n.warning = Warning::from(attr.u32()?),
            QUOTA_NL_A_DEV_MAJOR => n.device_major = i64::from(attr.u32()?),
            QUOTA_NL_A_DEV_MINOR => n.device_minor = i64::from(attr.u32()?),
            QUOTA_NL_A_CAUSED_ID => n.caused_id = attr.u64()? as i64,
            QUOTA_NL_A_PAD => {}
            other => trace!(kind = other, "skipping unknown quota attribute"),
        }
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use quotanl_wire::{AttributeEncoder, WireError};

    use super::*;
    use crate::error::QuotaError;

    fn full_payload() -> AttributeEncoder {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_QTYPE, GRPQUOTA)
            .put_u64(QUOTA_NL_A_EXCESS_ID, 1000)
            .put_u32(QUOTA_NL_A_WARNING, QUOTA_NL_BSOFTWARN)
            .put_u32(QUOTA_NL_A_DEV_MAJOR, 8)
            .put_u32(QUOTA_NL_A_DEV_MINOR, 1)
            .put_u64(QUOTA_NL_A_CAUSED_ID, 1001);
        enc
    }

    fn expected_full() -> Notification {
        Notification {
            quota_type: QuotaType::Group,
            id: 1000,
            warning: Warning::BlockSoft,
            device_major: 8,
            device_minor: 1,
            caused_id: 1001,
        }
    }

    #[test]
    fn decodes_all_fields() {
        let n = decode_notification(&full_payload().finish()).unwrap();
        assert_eq!(n, expected_full());
    }

    #[test]
    fn attribute_order_does_not_matter() {
        let mut enc = AttributeEncoder::new();
        enc.put_u64(QUOTA_NL_A_CAUSED_ID, 1001)
            .put_u32(QUOTA_NL_A_DEV_MINOR, 1)
            .put_u32(QUOTA_NL_A_WARNING, QUOTA_NL_BSOFTWARN)
            .put_u32(QUOTA_NL_A_DEV_MAJOR, 8)
            .put_u64(QUOTA_NL_A_EXCESS_ID, 1000)
            .put_u32(QUOTA_NL_A_QTYPE, GRPQUOTA);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n, expected_full());
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_QTYPE, GRPQUOTA)
            .put_u64(99, u64::MAX)
            .put_u64(QUOTA_NL_A_EXCESS_ID, 1000)
            .put_u32(QUOTA_NL_A_WARNING, QUOTA_NL_BSOFTWARN);
        enc.put_bytes(42, b"future kernel field").unwrap();
        enc.put_u32(QUOTA_NL_A_DEV_MAJOR, 8)
            .put_u32(QUOTA_NL_A_DEV_MINOR, 1)
            .put_u64(QUOTA_NL_A_CAUSED_ID, 1001);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n, expected_full());
    }

    #[test]
    fn pad_attributes_are_ignored() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_QTYPE, PRJQUOTA);
        enc.put_bytes(QUOTA_NL_A_PAD, &[]).unwrap();
        enc.put_u64(QUOTA_NL_A_EXCESS_ID, 7);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n.quota_type, QuotaType::Project);
        assert_eq!(n.id, 7);
    }

    #[test]
    fn missing_warning_defaults_to_none() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_QTYPE, USRQUOTA)
            .put_u64(QUOTA_NL_A_EXCESS_ID, 5);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n.warning, Warning::None);
        assert_eq!(n.id, 5);
        assert_eq!(n.device_major, 0);
        assert_eq!(n.caused_id, 0);
    }

    #[test]
    fn empty_payload_is_all_zero() {
        assert_eq!(decode_notification(&[]).unwrap(), Notification::default());
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let mut bytes = full_payload().finish().to_vec();
        // Claim the first attribute runs past the end of the buffer.
        bytes.truncate(4);

        let err = decode_notification(&bytes).unwrap_err();
        assert!(matches!(
            err,
            QuotaError::MalformedAttributes(WireError::Truncated { .. })
        ));
    }

    #[test]
    fn corrupt_length_after_valid_attributes_is_malformed() {
        let mut bytes = full_payload().finish().to_vec();
        bytes.extend_from_slice(&[0xFF, 0x00, 0x01, 0x00, 0x00]);

        let err = decode_notification(&bytes).unwrap_err();
        assert!(matches!(err, QuotaError::MalformedAttributes(_)));
    }

    #[test]
    fn wrong_width_for_known_attribute_is_malformed() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_EXCESS_ID, 1);

        let err = decode_notification(&enc.finish()).unwrap_err();
        assert!(matches!(
            err,
            QuotaError::MalformedAttributes(WireError::InvalidWidth {
                kind: QUOTA_NL_A_EXCESS_ID,
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn unknown_enum_values_are_preserved() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_QTYPE, 9)
            .put_u32(QUOTA_NL_A_WARNING, 42);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n.quota_type, QuotaType::Unknown(9));
        assert_eq!(n.warning, Warning::Unknown(42));
        assert_eq!(u32::from(n.warning), 42);
    }

    #[test]
    fn large_ids_widen() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(QUOTA_NL_A_DEV_MAJOR, u32::MAX)
            .put_u64(QUOTA_NL_A_EXCESS_ID, u64::from(u32::MAX) + 1);

        let n = decode_notification(&enc.finish()).unwrap();
        assert_eq!(n.device_major, i64::from(u32::MAX));
        assert_eq!(n.id, 1 << 32);
    }

    #[test]
    fn warning_values_match_kernel() {
        for raw in 0..=10u32 {
            let w = Warning::from(raw);
            assert!(!matches!(w, Warning::Unknown(_)), "value {raw}");
            assert_eq!(u32::from(w), raw);
        }
        assert_eq!(Warning::from(1), Warning::InodeHard);
        assert_eq!(Warning::from(10), Warning::BlockSoftBelow);
        assert_eq!(u32::from(QuotaType::Project), 2);
    }

    #[test]
    fn display_names() {
        assert_eq!(QuotaType::User.to_string(), "user");
        assert_eq!(QuotaType::Unknown(5).to_string(), "unknown(5)");
        assert_eq!(Warning::BlockHard.to_string(), "block hard limit reached");
        assert_eq!(Warning::Unknown(11).to_string(), "unknown(11)");
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_value(expected_full()).unwrap();
        assert_eq!(json["type"], "group");
        assert_eq!(json["warning"], "block_soft");
        assert_eq!(json["id"], 1000);
        assert_eq!(json["device_major"], 8);
    }
}
