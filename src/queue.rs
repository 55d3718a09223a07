use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to the queue a message is routed to.
///
/// The message stores and returns this verbatim; resolving it to an actual
/// queue is up to whoever dispatches the message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct QueueRef {
    /// Namespace the queue lives in
    pub namespace: String,
    pub name: String,
}

impl QueueRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QueueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
