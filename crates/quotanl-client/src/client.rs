use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use quotanl_transport::GenericNetlink;
#[cfg(target_os = "linux")]
use quotanl_transport::NetlinkSocket;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::constants::QUOTA_NL_C_WARNING;
use crate::error::{QuotaError, Result};
use crate::negotiate::resolve_group;
use crate::notification::{decode_notification, Notification};

/// A client backed by a real generic netlink socket.
#[cfg(target_os = "linux")]
pub type QuotaClient = Client<NetlinkSocket>;

/// Receives quota notifications from the kernel.
///
/// Safe for concurrent use when the connection is: `receive`,
/// `set_deadline` and `close` all take `&self`. Concurrent `receive` calls
/// compete for the same messages; each notification goes to one caller.
#[derive(Debug)]
pub struct Client<C> {
    conn: C,
    closed: AtomicBool,
}

#[cfg(target_os = "linux")]
impl Client<NetlinkSocket> {
    /// Open a netlink socket and join the quota `events` group.
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Open a netlink socket and join the group named by `config`.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        Self::dial(NetlinkSocket::dial, config)
    }
}

impl<C: GenericNetlink> Client<C> {
    /// Dial a connection with `dial`, then resolve and join the group.
    pub fn dial<F>(dial: F, config: &ClientConfig) -> Result<Self>
    where
        F: FnOnce() -> quotanl_transport::Result<C>,
    {
        let conn = dial()?;
        Self::from_connection(conn, config)
    }

    /// Resolve and join the group on an already dialed connection.
    ///
    /// The connection is closed before returning if either step fails.
    pub fn from_connection(conn: C, config: &ClientConfig) -> Result<Self> {
        let group = match resolve_group(&conn, &config.family_name, &config.group_name) {
            Ok(group) => group,
            Err(err) => {
                close_after_failure(&conn);
                return Err(err);
            }
        };

        if let Err(err) = conn.join_group(group) {
            close_after_failure(&conn);
            return Err(err.into());
        }

        info!(
            family = %config.family_name,
            group = %config.group_name,
            group_id = group,
            "listening for quota notifications"
        );

        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    /// Block until the kernel sends a quota notification.
    ///
    /// Each datagram must hold exactly one warning message. Anything else is
    /// rejected without touching the payload, and the client stays usable.
    pub fn receive(&self) -> Result<Notification> {
        self.ensure_open()?;

        let messages = self.conn.receive()?;
        let [message] = messages.as_slice() else {
            debug!(count = messages.len(), "rejecting datagram");
            return Err(QuotaError::UnexpectedMessageCount {
                count: messages.len(),
            });
        };

        let command = message.header.command;
        if command != QUOTA_NL_C_WARNING {
            debug!(command, "rejecting message");
            return Err(QuotaError::UnexpectedCommand { command });
        }

        decode_notification(&message.data)
    }

    /// Set the absolute read deadline for `receive`; `None` clears it.
    pub fn set_deadline(&self, deadline: Option<SystemTime>) -> Result<()> {
        self.ensure_open()?;
        self.conn.set_deadline(deadline)?;
        Ok(())
    }

    /// Release the connection. Later calls are no-ops.
    ///
    /// If the transport fails to close, the client is marked open again so
    /// the close can be retried.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(err) = self.conn.close() {
            self.closed.store(false, Ordering::Release);
            return Err(err.into());
        }
        Ok(())
    }

    /// Whether `close` has completed, or is in progress on another thread.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(QuotaError::Closed);
        }
        Ok(())
    }
}

fn close_after_failure<C: GenericNetlink>(conn: &C) {
    // The setup error is what the caller needs to see.
    if let Err(err) = conn.close() {
        debug!(%err, "failed to close connection after setup error");
    }
}
