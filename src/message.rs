//! The in-flight message entity.
//!
//! A [`Message`] is the unit of work that travels from a producer, through a
//! queue, to a worker, and is tracked across retries until it reaches a
//! terminal state.
//!
//! # Lifecycle
//!
//! 1. Messages are created `Active` with `Low` priority, unlocked, and with
//!    an empty retry schedule and callback registry
//! 2. The owning worker sets the retry schedule and registers callbacks
//!    before processing begins
//! 3. Processing ends in `Processed` or `Failed`, or suspends in `Paused`
//! 4. Once unlocked and terminal the message may be reclaimed by its queue
//!
//! A message is not internally synchronized. One owner mutates it at a time;
//! [`Message::lock`] is an advisory "do not reclaim" flag and does not guard
//! concurrent access.

use std::fmt;

use bytes::Bytes;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    callback::{Callback, CallbackRegistry},
    codec::{self, Format},
    error::Error,
    monitor::MonitorRef,
    priority::Priority,
    queue::QueueRef,
    state::State,
};

/// Unique identifier of a message. Parent links refer to messages by id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) String);

impl MessageId {
    /// Generates a random 16-byte id, encoded in base58.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bs58::encode(bytes).into_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of work in flight between a producer and a worker.
///
/// Fields are reached through accessors only. Priority and state are kept as
/// raw ranks so that a message decoded from a newer producer keeps whatever
/// rank it was sent with; reading them back resolves the rank or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier, generated at construction
    pub(crate) id: MessageId,
    /// Logical session or conversation the message belongs to, empty by default
    pub(crate) session_id: String,
    /// Queue the message is routed to, unset until dispatch
    pub(crate) destination: Option<QueueRef>,
    /// Message this one was derived from, by id only
    pub(crate) parent: Option<MessageId>,
    /// Observer attached for collaborators; never notified by the message
    pub(crate) monitor: Option<MonitorRef>,

    /// Raw rank, resolved through [`Priority::from_rank`] on read
    pub(crate) priority: i32,
    /// Raw rank, resolved through [`State::from_rank`] on read
    pub(crate) state: i32,

    /// Advisory "do not reclaim" flag, independent of state
    pub(crate) locked: bool,
    /// Index `i` is the delay in seconds before retry attempt `i`
    pub(crate) retry_timeouts: Vec<u64>,
    /// Callbacks to run once the message stops advancing
    pub(crate) callbacks: CallbackRegistry,
}

impl Default for Message {
    fn default() -> Self {
        Self::with_id(MessageId::generate())
    }
}

#[bon::bon]
impl Message {
    /// Builds a message, falling back to the construction defaults for
    /// anything not set.
    #[builder]
    pub fn compose(
        id: Option<MessageId>,
        #[builder(into, default)] session_id: String,
        destination: Option<QueueRef>,
        parent: Option<MessageId>,
        monitor: Option<MonitorRef>,
        #[builder(default)] priority: Priority,
        #[builder(default)] state: State,
        #[builder(default)] retry_timeouts: Vec<u64>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(MessageId::generate),
            session_id,
            destination,
            parent,
            monitor,
            priority: priority.rank(),
            state: state.rank(),
            locked: false,
            retry_timeouts,
            callbacks: CallbackRegistry::new(),
        }
    }
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: MessageId) -> Self {
        Self {
            id,
            session_id: String::new(),
            destination: None,
            parent: None,
            monitor: None,
            priority: Priority::default().rank(),
            state: State::default().rank(),
            locked: false,
            retry_timeouts: Vec::new(),
            callbacks: CallbackRegistry::new(),
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
    }

    pub fn destination(&self) -> Option<&QueueRef> {
        self.destination.as_ref()
    }

    pub fn set_destination(&mut self, destination: QueueRef) {
        self.destination = Some(destination);
    }

    /// Id of the message this one was derived from, if any.
    pub fn parent(&self) -> Option<&MessageId> {
        self.parent.as_ref()
    }

    /// Links `parent` by id. The parent is not retained.
    pub fn set_parent(&mut self, parent: &Message) {
        self.parent = Some(parent.id.clone());
    }

    pub fn set_parent_id(&mut self, parent: MessageId) {
        self.parent = Some(parent);
    }

    pub fn monitor(&self) -> Option<&MonitorRef> {
        self.monitor.as_ref()
    }

    pub fn set_monitor(&mut self, monitor: MonitorRef) {
        self.monitor = Some(monitor);
    }

    pub fn priority(&self) -> Result<Priority, Error> {
        Priority::from_rank(self.priority)
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority.rank();
    }

    pub fn state(&self) -> Result<State, Error> {
        State::from_rank(self.state)
    }

    pub fn set_state(&mut self, state: State) {
        tracing::trace!(id = %self.id, from = self.state, to = %state, "state changed");
        self.state = state.rank();
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether the message has finished, successfully or not.
    pub fn is_terminal(&self) -> Result<bool, Error> {
        Ok(self.state()?.is_terminal())
    }

    /// Whether the owning queue may reclaim this message: terminal and unlocked.
    pub fn is_reclaimable(&self) -> Result<bool, Error> {
        Ok(!self.locked && self.is_terminal()?)
    }

    /// Replaces the retry schedule wholesale.
    pub fn set_retry_timeouts(&mut self, timeouts: Vec<u64>) {
        self.retry_timeouts = timeouts;
    }

    pub fn retry_timeouts(&self) -> &[u64] {
        &self.retry_timeouts
    }

    /// Delay in seconds before retry attempt `attempt`.
    ///
    /// Asking for an attempt beyond the configured schedule is an error, not
    /// a zero delay.
    pub fn retry_timeout(&self, attempt: usize) -> Result<u64, Error> {
        self.retry_timeouts
            .get(attempt)
            .copied()
            .ok_or_else(|| Error::invalid_retry_index(attempt, self.retry_timeouts.len()))
    }

    /// Maximum number of retries allowed, which is the schedule length.
    pub fn retry_counter(&self) -> usize {
        self.retry_timeouts.len()
    }

    /// Registers `callback` to run when the message reaches `state`.
    ///
    /// Fails with [`Error::UnsupportedCallbackState`] unless `state` is
    /// `Failed`, `Processed` or `Paused`.
    pub fn add_callback(&mut self, state: State, callback: Callback) -> Result<(), Error> {
        self.callbacks.add(state, callback).inspect_err(|e| {
            tracing::debug!(id = %self.id, "rejected callback: {e}");
        })
    }

    pub fn callbacks(&self, state: State) -> &[Callback] {
        self.callbacks.get(state)
    }

    pub fn has_callbacks(&self, state: State) -> bool {
        self.callbacks.has(state)
    }

    pub fn callback_registry(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn encode(&self, format: Format) -> Result<Bytes, Error> {
        codec::encode(self, format)
    }

    pub fn decode(format: Format, bytes: &[u8]) -> Result<Self, Error> {
        codec::decode(format, bytes)
    }
}
