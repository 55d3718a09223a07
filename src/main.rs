//! Reads length-delimited messages from stdin and prints each one as a JSON
//! wire document per line.

use itertools::Itertools;
use missive::{codec::Format, config::Config, frame};
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    missive::init_logging()?;

    let config = Config::load()?;
    let format = config.format();

    tracing::info!(%format, "reading messages from stdin");

    let mut messages = frame::read_messages(tokio::io::stdin(), format);
    let mut stdout = tokio::io::stdout();
    let mut count = 0usize;

    while let Some(message) = messages.next().await.transpose()? {
        tracing::info!(
            id = %message.id(),
            session = message.session_id(),
            priority = ?message.priority().ok(),
            state = ?message.state().ok(),
            locked = message.is_locked(),
            retries = %message.retry_timeouts().iter().join(","),
            callbacks = message.callback_registry().len(),
            "decoded message"
        );

        stdout.write_all(&message.encode(Format::Json)?).await?;
        stdout.write_all(b"\n").await?;
        count += 1;
    }

    stdout.flush().await?;

    tracing::info!(count, "done");

    Ok(())
}
