//! Linux disk quota notifications.
//!
//! The kernel multicasts a message on the `events` group of the `VFS_DQUOT`
//! generic netlink family whenever a user, group or project crosses a soft or
//! hard quota limit, or falls back below one. [`Client`] finds and joins that
//! group and turns each message into a [`Notification`].
//!
//! ```no_run
//! # fn main() -> quotanl_client::Result<()> {
//! let client = quotanl_client::QuotaClient::new()?;
//! loop {
//!     let n = client.receive()?;
//!     println!("{} {} on {}:{}: {}", n.quota_type, n.id, n.device_major, n.device_minor, n.warning);
//! }
//! # }
//! ```
//!
//! See <https://www.kernel.org/doc/Documentation/filesystems/quota.txt>.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod negotiate;
pub mod notification;

pub use client::Client;
pub use config::ClientConfig;
pub use constants::{FAMILY_NAME, GROUP_NAME, QUOTA_NL_C_WARNING};
pub use error::{QuotaError, Result};
pub use negotiate::resolve_group;
pub use notification::{decode_notification, Notification, QuotaType, Warning};

#[cfg(target_os = "linux")]
pub use client::QuotaClient;
