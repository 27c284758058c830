//! Quota netlink ABI, from `include/uapi/linux/quota.h`.

/// Generic netlink family registered by the quota subsystem.
pub const FAMILY_NAME: &str = "VFS_DQUOT";

/// Multicast group carrying warnings.
pub const GROUP_NAME: &str = "events";

/// The only command the family sends.
pub const QUOTA_NL_C_WARNING: u8 = 1;

pub const QUOTA_NL_A_QTYPE: u16 = 1;
pub const QUOTA_NL_A_EXCESS_ID: u16 = 2;
pub const QUOTA_NL_A_WARNING: u16 = 3;
pub const QUOTA_NL_A_DEV_MAJOR: u16 = 4;
pub const QUOTA_NL_A_DEV_MINOR: u16 = 5;
pub const QUOTA_NL_A_CAUSED_ID: u16 = 6;
/// Alignment padding before 64-bit attributes; carries nothing.
pub const QUOTA_NL_A_PAD: u16 = 7;

pub const USRQUOTA: u32 = 0;
pub const GRPQUOTA: u32 = 1;
pub const PRJQUOTA: u32 = 2;

pub const QUOTA_NL_NOWARN: u32 = 0;
pub const QUOTA_NL_IHARDWARN: u32 = 1;
pub const QUOTA_NL_ISOFTLONGWARN: u32 = 2;
pub const QUOTA_NL_ISOFTWARN: u32 = 3;
pub const QUOTA_NL_BHARDWARN: u32 = 4;
pub const QUOTA_NL_BSOFTLONGWARN: u32 = 5;
pub const QUOTA_NL_BSOFTWARN: u32 = 6;
pub const QUOTA_NL_IHARDBELOW: u32 = 7;
pub const QUOTA_NL_ISOFTBELOW: u32 = 8;
pub const QUOTA_NL_BHARDBELOW: u32 = 9;
pub const QUOTA_NL_BSOFTBELOW: u32 = 10;
