//! Event stream decoder.
//!
//! Rebuilds [`Event`]s from the raw bytes of a framed transport. Each line
//! carries one JSON event, optionally behind an SSE `data:` marker. Lines
//! that do not decode are surfaced as [`Event::Text`]; the decoder itself
//! never fails.

use super::line_assembler::LineAssembler;
use futures::stream::{self, Stream, StreamExt};
use std::fmt::Display;
use tracing::{trace, warn};
use tribunal_domain::Event;

/// Incremental decoder from byte chunks to events
#[derive(Debug, Default)]
pub struct StreamDecoder {
    lines: LineAssembler,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the events it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| Self::parse_line(line))
            .collect()
    }

    /// End of input: decode whatever is left in the buffers
    pub fn finish(&mut self) -> Vec<Event> {
        self.lines
            .finish()
            .and_then(|line| Self::parse_line(&line))
            .into_iter()
            .collect()
    }

    /// Decode a single transport line.
    ///
    /// Returns `None` for blank lines and bare `data:` markers.
    pub fn parse_line(line: &str) -> Option<Event> {
        let line = line.trim();
        let body = line
            .strip_prefix("data:")
            .map(str::trim_start)
            .unwrap_or(line);
        if body.is_empty() {
            return None;
        }

        match serde_json::from_str::<Event>(body) {
            Ok(event) => Some(event),
            Err(e) => {
                trace!("Undecodable line ({}): {}", e, body);
                Some(Event::Text {
                    text: body.to_string(),
                })
            }
        }
    }
}

/// Decode a stream of byte chunks into a stream of events.
///
/// A transport error ends the stream with a final [`Event::Error`]; a clean
/// end of input flushes the decoder.
pub fn decode_stream<S, B, E>(chunks: S) -> impl Stream<Item = Event>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = Some((Box::pin(chunks), StreamDecoder::new()));

    stream::unfold(state, |state| async move {
        let (mut chunks, mut decoder) = state?;
        match chunks.next().await {
            Some(Ok(chunk)) => {
                let events = decoder.push(chunk.as_ref());
                Some((stream::iter(events), Some((chunks, decoder))))
            }
            Some(Err(e)) => {
                warn!("Transport error while decoding: {}", e);
                let events = vec![Event::error(format!("Transport error: {}", e))];
                Some((stream::iter(events), None))
            }
            None => Some((stream::iter(decoder.finish()), None)),
        }
    })
    .flatten()
}
