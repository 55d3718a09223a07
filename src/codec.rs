//! Versioned wire form of a [`Message`].
//!
//! Both formats carry the same explicit field list, in this order:
//!
//! | # | field            | encoding                                  |
//! |---|------------------|-------------------------------------------|
//! | 0 | `version`        | `u16`, currently [`WIRE_VERSION`]         |
//! | 1 | `id`             | string                                    |
//! | 2 | `session_id`     | string                                    |
//! | 3 | `destination`    | optional `{ namespace, name }`            |
//! | 4 | `parent`         | optional message id                       |
//! | 5 | `monitor`        | optional monitor key                      |
//! | 6 | `priority`       | raw `i32` rank                            |
//! | 7 | `state`          | raw `i32` rank                            |
//! | 8 | `locked`         | bool                                      |
//! | 9 | `retry_timeouts` | list of `u64` seconds                     |
//! |10 | `callbacks`      | list of `{ state, entries }`, state order |
//!
//! Priority and state ranks are carried verbatim and only resolved when read
//! from the decoded message. Callback keys are checked at decode time.

use std::collections::BTreeSet;

use bincode::Options;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    callback::{Callback, CallbackRegistry},
    error::Error,
    message::{Message, MessageId},
    monitor::MonitorRef,
    queue::QueueRef,
    state::State,
};

pub const WIRE_VERSION: u16 = 1;

/// Upper bound for one encoded message, in bytes.
pub const MAX_ENCODED_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Compact bincode encoding
    #[default]
    Binary,
    /// JSON document, one object per message
    Json,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage {
    version: u16,
    id: MessageId,
    session_id: String,
    destination: Option<QueueRef>,
    parent: Option<MessageId>,
    monitor: Option<MonitorRef>,
    priority: i32,
    state: i32,
    locked: bool,
    retry_timeouts: Vec<u64>,
    callbacks: Vec<WireCallbacks>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireCallbacks {
    state: i32,
    entries: Vec<Callback>,
}

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_ENCODED_LEN as u64)
        .reject_trailing_bytes()
}

impl WireMessage {
    fn from_message(message: &Message) -> Self {
        Self {
            version: WIRE_VERSION,
            id: message.id.clone(),
            session_id: message.session_id.clone(),
            destination: message.destination.clone(),
            parent: message.parent.clone(),
            monitor: message.monitor.clone(),
            priority: message.priority,
            state: message.state,
            locked: message.locked,
            retry_timeouts: message.retry_timeouts.clone(),
            callbacks: message
                .callbacks
                .iter()
                .map(|(state, entries)| WireCallbacks {
                    state: state.rank(),
                    entries: entries.to_vec(),
                })
                .collect(),
        }
    }

    fn into_message(self) -> Result<Message, Error> {
        if self.version != WIRE_VERSION {
            return Err(Error::decode(format!(
                "unsupported wire version {} (expected {WIRE_VERSION})",
                self.version
            )));
        }

        let mut callbacks = CallbackRegistry::new();
        let mut seen = BTreeSet::new();
        for WireCallbacks { state, entries } in self.callbacks {
            let state = State::from_rank(state)
                .map_err(|_| Error::decode(format!("unknown callback state {state}")))?;

            if !seen.insert(state) {
                return Err(Error::decode(format!("duplicate callbacks for state {state}")));
            }

            for entry in entries {
                callbacks
                    .add(state, entry)
                    .map_err(|e| Error::decode(e.to_string()))?;
            }
        }

        Ok(Message {
            id: self.id,
            session_id: self.session_id,
            destination: self.destination,
            parent: self.parent,
            monitor: self.monitor,
            priority: self.priority,
            state: self.state,
            locked: self.locked,
            retry_timeouts: self.retry_timeouts,
            callbacks,
        })
    }
}

pub fn encode(message: &Message, format: Format) -> Result<Bytes, Error> {
    let wire = WireMessage::from_message(message);

    let encoded = match format {
        Format::Binary => bincode_options()
            .serialize(&wire)
            .map_err(|e| Error::encode(e.to_string()))?,
        Format::Json => serde_json::to_vec(&wire).map_err(|e| Error::encode(e.to_string()))?,
    };

    Ok(Bytes::from(encoded))
}

pub fn decode(format: Format, bytes: &[u8]) -> Result<Message, Error> {
    let wire: WireMessage = match format {
        Format::Binary => bincode_options()
            .deserialize(bytes)
            .map_err(|e| Error::decode(e.to_string()))?,
        Format::Json => serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))?,
    };

    wire.into_message().inspect_err(|e| tracing::warn!("Rejected message: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Priority;

    fn populated() -> Message {
        let parent = Message::new();

        let mut message = Message::compose()
            .session_id("session-7")
            .destination(QueueRef::new("billing", "invoices"))
            .monitor(MonitorRef::new("monitor-a"))
            .priority(Priority::Urgent)
            .state(State::Paused)
            .retry_timeouts(vec![5, 10, 30])
            .call();

        message.set_parent(&parent);
        message.lock();

        message
            .add_callback(State::Failed, Callback::new("alerts", "page"))
            .unwrap();
        message
            .add_callback(State::Processed, Callback::new("billing", "close"))
            .unwrap();
        message
            .add_callback(State::Paused, Callback::new("lookupA", "resume"))
            .unwrap();
        message
            .add_callback(State::Paused, Callback::new("lookupB", "notify"))
            .unwrap();

        message
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let message = populated();

        for format in [Format::Binary, Format::Json] {
            let bytes = message.encode(format).unwrap();
            let decoded = Message::decode(format, &bytes).unwrap();

            assert_eq!(decoded, message, "{format}");
            assert_eq!(
                decoded.callbacks(State::Paused),
                message.callbacks(State::Paused)
            );
        }
    }

    #[test]
    fn test_json_field_order() {
        let json = String::from_utf8(populated().encode(Format::Json).unwrap().to_vec()).unwrap();

        let fields = [
            "\"version\"",
            "\"id\"",
            "\"session_id\"",
            "\"destination\"",
            "\"parent\"",
            "\"monitor\"",
            "\"priority\"",
            "\"state\"",
            "\"locked\"",
            "\"retry_timeouts\"",
            "\"callbacks\"",
        ];
        let positions: Vec<usize> = fields.iter().map(|f| json.find(f).unwrap()).collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn test_ranks_are_carried_verbatim() {
        let mut message = Message::new();
        message.priority = 42;

        let bytes = message.encode(Format::Binary).unwrap();
        let decoded = Message::decode(Format::Binary, &bytes).unwrap();

        assert!(matches!(
            decoded.priority(),
            Err(Error::UnknownEnumerationValue { rank: 42, .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Message::decode(Format::Binary, &[0xff, 0x00, 0x13]),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            Message::decode(Format::Json, b"{\"hello\": \"world\"}"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            Message::decode(Format::Json, b""),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = Message::new().encode(Format::Binary).unwrap().to_vec();
        bytes.push(0);

        assert!(matches!(
            Message::decode(Format::Binary, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = populated().encode(Format::Binary).unwrap();

        assert!(matches!(
            Message::decode(Format::Binary, &bytes[..bytes.len() - 1]),
            Err(Error::Decode { .. })
        ));
    }

    fn json_with(patch: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
        let mut value: serde_json::Value =
            serde_json::from_slice(&populated().encode(Format::Json).unwrap()).unwrap();
        patch(&mut value);
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_rejects_unknown_version() {
        let bytes = json_with(|v| v["version"] = 2.into());

        assert!(matches!(
            Message::decode(Format::Json, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let bytes = json_with(|v| v["extra"] = true.into());

        assert!(matches!(
            Message::decode(Format::Json, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_ineligible_callback_state() {
        let bytes = json_with(|v| {
            v["callbacks"] = serde_json::json!([
                { "state": State::Active.rank(), "entries": [{ "target": "a", "action": "b" }] }
            ])
        });

        assert!(matches!(
            Message::decode(Format::Json, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_callback_state() {
        let bytes = json_with(|v| {
            v["callbacks"] = serde_json::json!([
                { "state": State::Failed.rank(), "entries": [{ "target": "a", "action": "b" }] },
                { "state": State::Failed.rank(), "entries": [{ "target": "c", "action": "d" }] }
            ])
        });

        assert!(matches!(
            Message::decode(Format::Json, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_after_empty_list() {
        let bytes = json_with(|v| {
            v["callbacks"] = serde_json::json!([
                { "state": State::Failed.rank(), "entries": [] },
                { "state": State::Failed.rank(), "entries": [{ "target": "a", "action": "b" }] }
            ])
        });

        assert!(matches!(
            Message::decode(Format::Json, &bytes),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_empty_callback_list_leaves_no_key() {
        let bytes = json_with(|v| {
            v["callbacks"] = serde_json::json!([
                { "state": State::Failed.rank(), "entries": [] }
            ])
        });

        let decoded = Message::decode(Format::Json, &bytes).unwrap();
        assert!(!decoded.has_callbacks(State::Failed));
        assert!(decoded.callback_registry().is_empty());
    }

    #[test]
    fn test_rejects_unknown_nested_fields() {
        let patches: [fn(&mut serde_json::Value); 2] = [
            |v| v["destination"]["junk"] = 1.into(),
            |v| v["callbacks"][0]["entries"][0]["junk"] = 1.into(),
        ];

        for patch in patches {
            assert!(matches!(
                Message::decode(Format::Json, &json_with(patch)),
                Err(Error::Decode { .. })
            ));
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("Binary".parse::<Format>().unwrap(), Format::Binary);
        assert!("yaml".parse::<Format>().is_err());
    }
}
