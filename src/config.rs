use serde::Deserialize;

use crate::{codec::Format, message::Message, priority::Priority};

/// Settings read from `MISSIVE_*` environment variables.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Wire format for framed input and output
    pub format: Option<Format>,
    /// Priority given to new messages
    pub default_priority: Option<Priority>,
    /// Retry schedule given to new messages, comma-separated seconds
    pub retry_timeouts: Option<Vec<u64>>,
}

impl Config {
    pub fn load() -> eyre::Result<Self> {
        Ok(envy::prefixed("MISSIVE_").from_env::<Self>()?)
    }

    pub fn format(&self) -> Format {
        self.format.unwrap_or_default()
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority.unwrap_or_default()
    }

    pub fn retry_timeouts(&self) -> &[u64] {
        self.retry_timeouts.as_deref().unwrap_or(&[])
    }

    /// A fresh message carrying the configured defaults.
    pub fn new_message(&self) -> Message {
        Message::compose()
            .priority(self.default_priority())
            .retry_timeouts(self.retry_timeouts().to_vec())
            .call()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    fn from_vars(vars: &[(&str, &str)]) -> Config {
        envy::prefixed("MISSIVE_")
            .from_iter(
                vars.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            )
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.format(), Format::Binary);
        assert_eq!(config.default_priority(), Priority::Low);
        assert!(config.retry_timeouts().is_empty());
    }

    #[test]
    fn test_from_env() {
        let config = from_vars(&[
            ("MISSIVE_FORMAT", "json"),
            ("MISSIVE_DEFAULT_PRIORITY", "high"),
            ("MISSIVE_RETRY_TIMEOUTS", "5,10,30"),
            ("UNRELATED", "ignored"),
        ]);

        assert_eq!(config.format(), Format::Json);
        assert_eq!(config.default_priority(), Priority::High);
        assert_eq!(config.retry_timeouts(), &[5, 10, 30]);
    }

    #[test]
    fn test_new_message_uses_defaults() {
        let config = from_vars(&[
            ("MISSIVE_DEFAULT_PRIORITY", "normal"),
            ("MISSIVE_RETRY_TIMEOUTS", "1,2"),
        ]);
        let message = config.new_message();

        assert_eq!(message.priority().unwrap(), Priority::Normal);
        assert_eq!(message.state().unwrap(), State::Active);
        assert_eq!(message.retry_counter(), 2);
        assert_eq!(message.retry_timeout(1).unwrap(), 2);
    }
}
