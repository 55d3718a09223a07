//! Dispatch priority of a message.
//!
//! A message stores its priority as a raw integer rank. Reading it back goes
//! through [`Priority::from_rank`], so every read yields one of the canonical
//! variants or an [`Error::UnknownEnumerationValue`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::Error;

/// Ordered dispatch classification. Higher ranks are dispatched first.
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
pub enum Priority {
    #[default]
    Low = 0,
    Normal = 1,
    High = 2,
    Urgent = 3,
}

impl Priority {
    /// The stable integer rank stored on the message and written to the wire.
    pub const fn rank(self) -> i32 {
        self as i32
    }

    /// Resolves a stored rank to its canonical variant.
    pub fn from_rank(rank: i32) -> Result<Self, Error> {
        Self::iter()
            .find(|p| p.rank() == rank)
            .ok_or_else(|| Error::unknown_priority(rank))
    }
}

impl TryFrom<i32> for Priority {
    type Error = Error;

    fn try_from(rank: i32) -> Result<Self, Self::Error> {
        Self::from_rank(rank)
    }
}
