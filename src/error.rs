use snafu::Snafu;

use crate::state::State;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Retry index {index} not found ({configured} retries configured)"))]
    InvalidRetryIndex { index: usize, configured: usize },

    #[snafu(display("State {state} does not support callbacks"))]
    UnsupportedCallbackState { state: State },

    #[snafu(display("Unknown {kind}: {rank}"))]
    UnknownEnumerationValue { kind: &'static str, rank: i32 },

    #[snafu(display("Decode error: {message}"))]
    Decode { message: String },

    #[snafu(display("Encode error: {message}"))]
    Encode { message: String },

    #[snafu(display("Invalid callback descriptor: {message}"))]
    InvalidCallback { message: String },

    #[snafu(display("I/O error"))]
    Io {
        #[snafu(source)]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

impl Error {
    pub fn invalid_retry_index(index: usize, configured: usize) -> Self {
        Self::InvalidRetryIndex { index, configured }
    }

    pub fn unsupported_callback_state(state: State) -> Self {
        Self::UnsupportedCallbackState { state }
    }

    pub fn unknown_priority(rank: i32) -> Self {
        Self::UnknownEnumerationValue {
            kind: "priority",
            rank,
        }
    }

    pub fn unknown_state(rank: i32) -> Self {
        Self::UnknownEnumerationValue {
            kind: "state",
            rank,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    pub fn invalid_callback(message: impl Into<String>) -> Self {
        Self::InvalidCallback {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_values() {
        assert_eq!(
            Error::unsupported_callback_state(State::Active).to_string(),
            "State Active does not support callbacks"
        );
        assert_eq!(
            Error::unknown_priority(9).to_string(),
            "Unknown priority: 9"
        );
        assert_eq!(
            Error::invalid_retry_index(3, 3).to_string(),
            "Retry index 3 not found (3 retries configured)"
        );
    }
}
