//! Callback descriptors and the state-gated registry that holds them.
//!
//! A [`Callback`] names work to run once a message stops advancing: a
//! `target` used to look up the handler and an `action` to perform on it.
//! Nothing in this crate invokes callbacks; collaborators read them back from
//! the registry and run them in insertion order.

use std::{collections::BTreeMap, fmt, str::FromStr};

use pom::utf8::{end, none_of, one_of, Parser};
use serde::{Deserialize, Serialize};

use crate::{error::Error, state::State};

/// An opaque `(target, action)` pair.
///
/// Its text form is `target::action`, split at the last `::`, so targets may
/// themselves contain `::` (`billing::invoices::close`). The text form only
/// round-trips when the target is non-empty without whitespace and the action
/// is `[A-Za-z0-9_]+`; [`Callback::new`] accepts any strings, which the wire
/// codec carries verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Callback {
    target: String,
    action: String,
}

impl Callback {
    pub fn new(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.target, self.action)
    }
}

pub fn target<'a>() -> Parser<'a, &'a str> {
    none_of(" \t\r\n").repeat(1..).collect()
}

pub fn action<'a>() -> Parser<'a, &'a str> {
    one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890_")
        .repeat(1..)
        .collect()
}

impl FromStr for Callback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target_part, action_part) = s
            .rsplit_once("::")
            .ok_or_else(|| Error::invalid_callback(format!("{s:?}: missing \"::\"")))?;

        let parsed_target = (target() - end())
            .name("callback target")
            .parse_str(target_part)
            .map_err(|e| Error::invalid_callback(format!("{s:?}: {e}")))?;

        let parsed_action = (action() - end())
            .name("callback action")
            .parse_str(action_part)
            .map_err(|e| Error::invalid_callback(format!("{s:?}: {e}")))?;

        Ok(Callback::new(parsed_target, parsed_action))
    }
}

/// Callbacks keyed by the state they fire on.
///
/// Only callback-eligible states ([`State::supports_callbacks`]) ever appear
/// as keys, and a key is present only while it has at least one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRegistry {
    entries: BTreeMap<State, Vec<Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the list for `state`.
    pub fn add(&mut self, state: State, callback: Callback) -> Result<(), Error> {
        if !state.supports_callbacks() {
            return Err(Error::unsupported_callback_state(state));
        }

        self.entries.entry(state).or_default().push(callback);

        Ok(())
    }

    /// Callbacks for `state` in insertion order. Empty when none were added.
    pub fn get(&self, state: State) -> &[Callback] {
        self.entries.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, state: State) -> bool {
        !self.get(state).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of registered callbacks across all states.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Populated states in ascending rank order, each with its callbacks.
    pub fn iter(&self) -> impl Iterator<Item = (State, &[Callback])> + '_ {
        self.entries
            .iter()
            .map(|(state, callbacks)| (*state, callbacks.as_slice()))
    }
}
