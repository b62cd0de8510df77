//! Event framing for the outbound transport.
//!
//! One frame per event: `data: <json>\n\n` for server-sent events, or
//! `<json>\n` for JSON lines. Both decode with
//! [`StreamDecoder`](super::decoder::StreamDecoder).

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tribunal_domain::Event;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write frame: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame layout on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStyle {
    /// `data: <json>` followed by a blank line
    Sse,
    /// One JSON document per line
    JsonLines,
}

/// Render one event as a complete frame
pub fn encode_frame(event: &Event, style: FrameStyle) -> Result<String, FrameError> {
    let json = serde_json::to_string(event)?;
    Ok(match style {
        FrameStyle::Sse => format!("data: {}\n\n", json),
        FrameStyle::JsonLines => format!("{}\n", json),
    })
}

/// Writes framed events to any async sink, flushing after every frame
pub struct EventWriter<W> {
    writer: W,
    style: FrameStyle,
}

impl<W: AsyncWrite + Unpin> EventWriter<W> {
    pub fn new(writer: W, style: FrameStyle) -> Self {
        Self { writer, style }
    }

    pub async fn write(&mut self, event: &Event) -> Result<(), FrameError> {
        let frame = encode_frame(event, self.style)?;
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
