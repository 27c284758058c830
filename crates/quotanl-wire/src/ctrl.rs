//! Generic netlink controller (`nlctrl`) constants.
//!
//! The controller is the fixed family through which every other generic
//! netlink family is discovered by name.

/// Netlink message type of the controller family.
pub const GENL_ID_CTRL: u16 = 0x10;

/// Controller protocol version.
pub const GENL_CTRL_VERSION: u8 = 2;

/// Look up a family by name or id.
pub const CTRL_CMD_GETFAMILY: u8 = 3;

pub const CTRL_ATTR_FAMILY_ID: u16 = 1;
pub const CTRL_ATTR_FAMILY_NAME: u16 = 2;
pub const CTRL_ATTR_VERSION: u16 = 3;
pub const CTRL_ATTR_HDRSIZE: u16 = 4;
pub const CTRL_ATTR_MAXATTR: u16 = 5;
pub const CTRL_ATTR_OPS: u16 = 6;
pub const CTRL_ATTR_MCAST_GROUPS: u16 = 7;

pub const CTRL_ATTR_MCAST_GRP_NAME: u16 = 1;
pub const CTRL_ATTR_MCAST_GRP_ID: u16 = 2;

/// Maximum family name length, including the terminating NUL.
pub const GENL_NAMSIZ: usize = 16;
