use crate::constants::{FAMILY_NAME, GROUP_NAME};

/// Names used to find the notification channel.
///
/// The defaults match the kernel; overriding them is only useful against a
/// test family or a patched kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Generic netlink family name. Default: `VFS_DQUOT`.
    pub family_name: String,
    /// Multicast group name within the family. Default: `events`.
    pub group_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            family_name: FAMILY_NAME.to_string(),
            group_name: GROUP_NAME.to_string(),
        }
    }
}
