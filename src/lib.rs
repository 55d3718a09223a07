//! The in-flight message entity of a queue/worker system.
//!
//! [`Message`] carries routing fields, a priority and lifecycle [`State`], an
//! advisory lock, a per-attempt retry schedule and a registry of callbacks
//! gated on the states where work stops advancing. It can be encoded into a
//! versioned wire form ([`codec`]) and moved over byte streams ([`frame`]).

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter, FmtSubscriber};

pub mod callback;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod message;
pub mod monitor;
pub mod priority;
pub mod queue;
pub mod state;

pub use callback::{Callback, CallbackRegistry};
pub use codec::Format;
pub use error::Error;
pub use message::{Message, MessageId};
pub use monitor::MonitorRef;
pub use priority::Priority;
pub use queue::QueueRef;
pub use state::State;

/// Installs the global tracing subscriber, filtered by `MISSIVE_LOG`.
pub fn init_logging() -> eyre::Result<()> {
    #[cfg(debug_assertions)]
    FmtSubscriber::builder()
        .pretty()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("MISSIVE_LOG")
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .finish()
        .try_init()?;

    #[cfg(not(debug_assertions))]
    FmtSubscriber::builder()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("MISSIVE_LOG")
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .finish()
        .try_init()?;

    Ok(())
}
