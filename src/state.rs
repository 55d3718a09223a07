//! Lifecycle state of a message.
//!
//! The lifecycle is:
//!
//! ```text
//!            +---> Processed
//!            |
//! Active ----+---> Failed
//!            |
//!            +---> Paused
//! ```
//!
//! `Processed` and `Failed` are terminal. `Paused` is suspended: the work is
//! not advancing but the message is not finished either. All three are the
//! states at which callbacks may be registered.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum State {
    /// In flight: queued or currently being worked on
    #[default]
    Active = 0,
    /// Gave up after exhausting the retry schedule
    Failed = 1,
    /// Handled successfully
    Processed = 2,
    /// Suspended until something resumes it
    Paused = 3,
}

/// States for which callbacks may be registered, in ascending rank order.
pub const CALLBACK_STATES: [State; 3] = [State::Failed, State::Processed, State::Paused];

impl State {
    pub const fn rank(self) -> i32 {
        self as i32
    }

    /// Resolves a stored rank to its canonical variant.
    pub fn from_rank(rank: i32) -> Result<Self, Error> {
        Self::iter()
            .find(|s| s.rank() == rank)
            .ok_or_else(|| Error::unknown_state(rank))
    }

    /// Whether work has stopped advancing in this state.
    pub const fn supports_callbacks(self) -> bool {
        matches!(self, Self::Failed | Self::Processed | Self::Paused)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Processed)
    }
}

impl TryFrom<i32> for State {
    type Error = Error;

    fn try_from(rank: i32) -> Result<Self, Self::Error> {
        Self::from_rank(rank)
    }
}
