//! In-memory [`GenericNetlink`] for tests.
//!
//! A [`FakeConnection`] answers family lookups from a fixed table and hands
//! out scripted receive results in order. A [`FakeHandle`] shares its state,
//! so a test can keep observing the connection after moving it into the code
//! under test.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::error::{Result, TransportError};
use crate::family::{Family, MulticastGroup};
use crate::traits::{GenericNetlink, Message};

#[derive(Debug, Default)]
struct FakeState {
    joined_groups: Vec<u32>,
    resolved: Vec<String>,
    deadline: Option<SystemTime>,
    close_calls: usize,
    closed: bool,
    receive_queue: VecDeque<Result<Vec<Message>>>,
    join_error: Option<TransportError>,
    close_error: Option<TransportError>,
}

/// A scripted generic netlink connection.
#[derive(Debug, Default)]
pub struct FakeConnection {
    families: Vec<Family>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family that `resolve_family` will find.
    pub fn with_family(mut self, family: Family) -> Self {
        self.families.push(family);
        self
    }

    /// Make the next `join_group` call fail with `err`.
    pub fn fail_join(self, err: TransportError) -> Self {
        self.lock().join_error = Some(err);
        self
    }

    /// Make the next `close` call fail with `err`, leaving the connection open.
    pub fn fail_close(self, err: TransportError) -> Self {
        self.lock().close_error = Some(err);
        self
    }

    /// A handle observing and scripting this connection.
    pub fn handle(&self) -> FakeHandle {
        FakeHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build a family with the given `(id, name)` multicast groups.
pub fn family(id: u16, name: &str, groups: &[(u32, &str)]) -> Family {
    Family {
        id,
        version: 1,
        name: name.to_string(),
        groups: groups
            .iter()
            .map(|(id, name)| MulticastGroup {
                id: *id,
                name: name.to_string(),
            })
            .collect(),
    }
}

impl GenericNetlink for FakeConnection {
    fn resolve_family(&self, name: &str) -> Result<Family> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Shutdown);
        }
        state.resolved.push(name.to_string());
        self.families
            .iter()
            .find(|family| family.name == name)
            .cloned()
            .ok_or_else(|| TransportError::FamilyNotFound {
                name: name.to_string(),
            })
    }

    fn join_group(&self, group: u32) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Shutdown);
        }
        if let Some(err) = state.join_error.take() {
            return Err(err);
        }
        state.joined_groups.push(group);
        Ok(())
    }

    fn receive(&self) -> Result<Vec<Message>> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Shutdown);
        }
        // An empty script behaves like a deadline with nothing delivered.
        state
            .receive_queue
            .pop_front()
            .unwrap_or(Err(TransportError::Timeout))
    }

    fn set_deadline(&self, deadline: Option<SystemTime>) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(TransportError::Shutdown);
        }
        state.deadline = deadline;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.lock();
        state.close_calls += 1;
        if let Some(err) = state.close_error.take() {
            return Err(err);
        }
        state.closed = true;
        Ok(())
    }
}

/// Shared view of a [`FakeConnection`].
#[derive(Debug, Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeHandle {
    /// Queue one datagram for `receive`.
    pub fn push_messages(&self, messages: Vec<Message>) {
        self.lock().receive_queue.push_back(Ok(messages));
    }

    /// Queue a receive failure.
    pub fn push_error(&self, err: TransportError) {
        self.lock().receive_queue.push_back(Err(err));
    }

    pub fn joined_groups(&self) -> Vec<u32> {
        self.lock().joined_groups.clone()
    }

    /// Family names passed to `resolve_family`, in call order.
    pub fn resolved_families(&self) -> Vec<String> {
        self.lock().resolved.clone()
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        self.lock().deadline
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Scripted receive results not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock().receive_queue.len()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
