//! Moving messages over byte streams.
//!
//! Each encoded message travels as one length-delimited frame: a 4-byte
//! big-endian length followed by the encoded bytes in the chosen [`Format`].

use bytes::Bytes;
use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_stream::{Stream, StreamExt as _};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::{
    codec::{Format, MAX_ENCODED_LEN},
    error::Error,
    message::Message,
};

fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_ENCODED_LEN)
        .new_codec()
}

/// Writes `messages` as frames and flushes the writer.
pub async fn write_messages<'a, W>(
    writer: W,
    format: Format,
    messages: impl IntoIterator<Item = &'a Message>,
) -> Result<usize, Error>
where
    W: AsyncWrite + Unpin,
{
    let mut framed = FramedWrite::new(writer, frame_codec());
    let mut written = 0;

    for message in messages {
        framed.feed(message.encode(format)?).await?;
        written += 1;
    }

    SinkExt::<Bytes>::flush(&mut framed).await?;

    tracing::debug!(count = written, %format, "wrote messages");

    Ok(written)
}

/// Decodes frames from `reader` until it reaches end of stream.
pub fn read_messages<R>(
    reader: R,
    format: Format,
) -> impl Stream<Item = Result<Message, Error>> + Unpin
where
    R: AsyncRead + Unpin,
{
    FramedRead::new(reader, frame_codec()).map(move |frame| {
        let frame = frame.inspect_err(|e| tracing::warn!("Frame read error: {e}"))?;
        Message::decode(format, &frame)
    })
}

/// Reads every message from `reader`, stopping at the first error.
pub async fn read_all<R>(reader: R, format: Format) -> Result<Vec<Message>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut stream = read_messages(reader, format);
    let mut messages = Vec::new();

    while let Some(message) = stream.next().await.transpose()? {
        messages.push(message);
    }

    Ok(messages)
}
