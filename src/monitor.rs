use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the observer attached to a message.
///
/// Attach-and-return only: a message never notifies its monitor. Whoever
/// processes the message looks the monitor up by this key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorRef(pub String);

impl MonitorRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl AsRef<str> for MonitorRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
