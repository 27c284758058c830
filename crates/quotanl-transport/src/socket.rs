use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use bytes::{Bytes, BytesMut};
use quotanl_wire::ctrl::{
    CTRL_ATTR_FAMILY_NAME, CTRL_CMD_GETFAMILY, GENL_CTRL_VERSION, GENL_ID_CTRL, GENL_NAMSIZ,
};
use quotanl_wire::message::{NLMSG_DONE, NLMSG_ERROR, NLMSG_NOOP, NLMSG_OVERRUN, NLM_F_REQUEST};
use quotanl_wire::{decode_messages, encode_genl_message, AttributeEncoder, GenlHeader};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::family::Family;
use crate::traits::{GenericNetlink, Message};

/// Default receive buffer: large enough for any controller reply.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 32 * 1024;

/// Upper bound on one blocking `poll`, so deadline changes are picked up.
const POLL_SLICE: Duration = Duration::from_millis(250);

/// Configuration for a netlink socket.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Bytes allocated per `recv`. Larger datagrams fail with
    /// [`TransportError::MessageTooLarge`].
    pub receive_buffer_size: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
        }
    }
}

/// A `NETLINK_GENERIC` socket.
///
/// Safe for concurrent use. `close` wakes any thread blocked in `receive`
/// through an internal pipe, then waits for it to let go of the descriptor
/// before closing it, so a descriptor number is never reused under a reader.
pub struct NetlinkSocket {
    fd: RwLock<Option<OwnedFd>>,
    wake_rx: OwnedFd,
    wake_tx: OwnedFd,
    closed: AtomicBool,
    deadline: Mutex<Option<SystemTime>>,
    sequence: AtomicU32,
    pid: u32,
    config: SocketConfig,
}

impl NetlinkSocket {
    /// Open and bind a generic netlink socket with default configuration.
    pub fn dial() -> Result<Self> {
        Self::dial_with_config(SocketConfig::default())
    }

    /// Open and bind a generic netlink socket with explicit configuration.
    pub fn dial_with_config(config: SocketConfig) -> Result<Self> {
        // SAFETY: plain syscall with constant arguments.
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                libc::NETLINK_GENERIC,
            )
        };
        if raw < 0 {
            return Err(TransportError::Socket(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nothing else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // Port id 0 asks the kernel to assign one.
        let addr = kernel_addr();
        // SAFETY: `addr` is a valid sockaddr_nl and the length matches it.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_nl).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TransportError::Bind(io::Error::last_os_error()));
        }

        let pid = local_port_id(fd.as_raw_fd()).map_err(TransportError::Bind)?;
        let (wake_rx, wake_tx) = wake_pipe().map_err(TransportError::Socket)?;

        debug!(pid, "opened generic netlink socket");

        Ok(Self {
            fd: RwLock::new(Some(fd)),
            wake_rx,
            wake_tx,
            closed: AtomicBool::new(false),
            deadline: Mutex::new(None),
            sequence: AtomicU32::new(1),
            pid,
            config,
        })
    }

    /// Kernel-assigned port id of this socket.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn with_fd<T>(&self, f: impl FnOnce(RawFd) -> Result<T>) -> Result<T> {
        let guard = self.fd.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(fd) if !self.is_closed() => f(fd.as_raw_fd()),
            _ => Err(TransportError::Shutdown),
        }
    }

    fn current_deadline(&self) -> Option<SystemTime> {
        *self.deadline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_request(&self, fd: RawFd, request: &[u8]) -> Result<()> {
        let addr = kernel_addr();
        loop {
            // SAFETY: `request` and `addr` are valid for the lengths passed.
            let rc = unsafe {
                libc::sendto(
                    fd,
                    request.as_ptr().cast::<libc::c_void>(),
                    request.len(),
                    0,
                    (&addr as *const libc::sockaddr_nl).cast::<libc::sockaddr>(),
                    std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
                )
            };
            if rc >= 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(TransportError::Io(err));
            }
        }
    }

    /// Wait until `fd` is readable, the deadline passes, or the socket closes.
    fn wait_readable(&self, fd: RawFd) -> Result<()> {
        loop {
            if self.is_closed() {
                return Err(TransportError::Shutdown);
            }

            let slice = match self.current_deadline() {
                None => POLL_SLICE,
                Some(deadline) => match deadline.duration_since(SystemTime::now()) {
                    Ok(remaining) if !remaining.is_zero() => remaining.min(POLL_SLICE),
                    _ => return Err(TransportError::Timeout),
                },
            };
            let timeout_ms = slice.as_millis().clamp(1, POLL_SLICE.as_millis()) as libc::c_int;

            let mut fds = [
                libc::pollfd {
                    fd,
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.wake_rx.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];
            // SAFETY: `fds` is a valid array of two pollfd structs.
            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(TransportError::Io(err));
            }

            if fds[1].revents != 0 {
                return Err(TransportError::Shutdown);
            }
            if fds[0].revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) != 0 {
                return Ok(());
            }
        }
    }

    /// Receive one whole datagram.
    fn recv_datagram(&self, fd: RawFd) -> Result<Bytes> {
        let max = self.config.receive_buffer_size;
        loop {
            self.wait_readable(fd)?;

            let mut buf = BytesMut::zeroed(max);
            // MSG_TRUNC reports the real datagram size even when it is cut off.
            // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
            let n = unsafe {
                libc::recv(
                    fd,
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    libc::MSG_DONTWAIT | libc::MSG_TRUNC,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                match err.kind() {
                    // Another receiver won the race for this datagram.
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => continue,
                    _ => return Err(TransportError::Io(err)),
                }
            }

            let size = n as usize;
            if size > max {
                return Err(TransportError::MessageTooLarge { size, max });
            }
            buf.truncate(size);
            return Ok(buf.freeze());
        }
    }

    fn request_family(&self, fd: RawFd, name: &str) -> Result<Family> {
        // The kernel answers EINVAL for names that cannot fit, and no such
        // family can be registered.
        if name.len() >= GENL_NAMSIZ {
            return Err(TransportError::FamilyNotFound {
                name: name.to_string(),
            });
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut attrs = AttributeEncoder::new();
        attrs.put_string(CTRL_ATTR_FAMILY_NAME, name)?;
        let mut request = BytesMut::new();
        encode_genl_message(
            GENL_ID_CTRL,
            NLM_F_REQUEST,
            sequence,
            GenlHeader {
                command: CTRL_CMD_GETFAMILY,
                version: GENL_CTRL_VERSION,
            },
            &attrs.finish(),
            &mut request,
        )?;
        self.send_request(fd, &request)?;

        loop {
            let datagram = self.recv_datagram(fd)?;
            for msg in decode_messages(&datagram)? {
                if msg.header.sequence != sequence {
                    trace!(
                        sequence = msg.header.sequence,
                        "skipping message for another request"
                    );
                    continue;
                }
                match msg.header.kind {
                    NLMSG_NOOP | NLMSG_DONE => continue,
                    NLMSG_ERROR => match msg.error_code()? {
                        0 => continue,
                        libc::ENOENT => {
                            return Err(TransportError::FamilyNotFound {
                                name: name.to_string(),
                            })
                        }
                        errno => return Err(TransportError::Netlink { errno }),
                    },
                    GENL_ID_CTRL => {
                        let (_, data) = msg.genl()?;
                        return Family::from_attributes(&data);
                    }
                    other => {
                        return Err(TransportError::UnexpectedResponse(format!(
                            "message type {other:#x} in reply to family lookup"
                        )))
                    }
                }
            }
        }
    }
}

impl GenericNetlink for NetlinkSocket {
    fn resolve_family(&self, name: &str) -> Result<Family> {
        let family = self.with_fd(|fd| self.request_family(fd, name))?;
        debug!(
            family = %family.name,
            id = family.id,
            groups = family.groups.len(),
            "resolved generic netlink family"
        );
        Ok(family)
    }

    fn join_group(&self, group: u32) -> Result<()> {
        self.with_fd(|fd| {
            // SAFETY: `group` is a valid u32 and the length matches it.
            let rc = unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_NETLINK,
                    libc::NETLINK_ADD_MEMBERSHIP,
                    (&group as *const u32).cast::<libc::c_void>(),
                    std::mem::size_of::<u32>() as libc::socklen_t,
                )
            };
            if rc < 0 {
                return Err(TransportError::Io(io::Error::last_os_error()));
            }
            debug!(group, "joined multicast group");
            Ok(())
        })
    }

    fn receive(&self) -> Result<Vec<Message>> {
        let datagram = self.with_fd(|fd| self.recv_datagram(fd))?;

        let mut messages = Vec::new();
        for msg in decode_messages(&datagram)? {
            match msg.header.kind {
                NLMSG_NOOP | NLMSG_DONE => continue,
                NLMSG_ERROR => match msg.error_code()? {
                    0 => continue,
                    errno => return Err(TransportError::Netlink { errno }),
                },
                NLMSG_OVERRUN => {
                    return Err(TransportError::Io(io::Error::other(
                        "netlink receive buffer overrun",
                    )))
                }
                _ => {
                    let (header, data) = msg.genl()?;
                    messages.push(Message { header, data });
                }
            }
        }

        trace!(count = messages.len(), bytes = datagram.len(), "received datagram");
        Ok(messages)
    }

    fn set_deadline(&self, deadline: Option<SystemTime>) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Shutdown);
        }
        *self.deadline.lock().unwrap_or_else(PoisonError::into_inner) = deadline;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // The pipe is never drained, so every current and future poller wakes.
        let byte = [1u8];
        // SAFETY: writing one byte from a valid buffer to our own pipe.
        let rc = unsafe {
            libc::write(
                self.wake_tx.as_raw_fd(),
                byte.as_ptr().cast::<libc::c_void>(),
                1,
            )
        };
        if rc < 0 {
            // Blocked receivers still see `closed` at their next poll slice.
            debug!(err = %io::Error::last_os_error(), "failed to wake receivers on close");
        }

        let mut guard = self.fd.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(fd) = guard.take() {
            let raw = fd.into_raw_fd();
            // SAFETY: `raw` came out of an OwnedFd and is closed exactly once.
            if unsafe { libc::close(raw) } < 0 {
                return Err(TransportError::Io(io::Error::last_os_error()));
            }
        }

        debug!(pid = self.pid, "closed generic netlink socket");
        Ok(())
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("pid", &self.pid)
            .field("closed", &self.is_closed())
            .field("config", &self.config)
            .finish()
    }
}

fn kernel_addr() -> libc::sockaddr_nl {
    // SAFETY: sockaddr_nl is plain data; all-zero is a valid value.
    let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
    addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
    addr
}

fn local_port_id(fd: RawFd) -> io::Result<u32> {
    let mut addr = kernel_addr();
    let mut len = std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
    // SAFETY: `addr` and `len` are valid writable pointers for the sizes given.
    let rc = unsafe {
        libc::getsockname(
            fd,
            (&mut addr as *mut libc::sockaddr_nl).cast::<libc::sockaddr>(),
            &mut len,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(addr.nl_pid)
}

fn wake_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: `fds` has room for the two descriptors pipe2 writes.
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe2 succeeded, so both descriptors are open and owned by us.
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}
