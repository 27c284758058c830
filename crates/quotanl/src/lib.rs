//! Linux disk quota notifications over generic netlink.
//!
//! The kernel reports quota limit crossings as multicast messages on the
//! `events` group of the `VFS_DQUOT` generic netlink family. This crate
//! bundles the pieces needed to receive them.
//!
//! # Crate Structure
//!
//! - [`wire`]: netlink header and attribute codec
//! - [`transport`]: the generic netlink socket and its trait seam
//! - [`client`]: group negotiation, notification decoding, the client facade

/// Re-export wire codec types.
pub mod wire {
    pub use quotanl_wire::*;
}

/// Re-export transport types.
pub mod transport {
    pub use quotanl_transport::*;
}

/// Re-export client types.
pub mod client {
    pub use quotanl_client::*;
}

pub use quotanl_client::{Client, ClientConfig, Notification, QuotaError, QuotaType, Warning};

#[cfg(target_os = "linux")]
pub use quotanl_client::QuotaClient;
