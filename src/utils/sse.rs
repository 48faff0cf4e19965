//! Minimal server-sent event decoding for provider event streams.
//!
//! Chunks are buffered as bytes until a full line is available, so multi-byte
//! characters split across reads survive. An event is dispatched on a blank
//! line, or at end of stream if one is still pending.
use futures_util::{pin_mut, Stream, StreamExt};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
            if let Some(event) = self.feed_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end().to_string();
            if let Some(event) = self.feed_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let event = SseEvent {
            event: self.event.take(),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(event)
    }
}

pub enum Flow<T> {
    Continue,
    Done(T),
}

/// Read `stream` for at most `max_reads` chunks, handing each decoded event to
/// `on_event` until it returns `Flow::Done` or an error.
///
/// Hitting the read cap is a `Timeout`; the stream closing first is
/// `NoImageReturned`.
pub async fn read_events<S, B, E, T, F>(
    stream: S,
    max_reads: usize,
    mut on_event: F,
) -> AppResult<T>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<AppError>,
    F: FnMut(SseEvent) -> AppResult<Flow<T>>,
{
    pin_mut!(stream);
    let mut decoder = EventStreamDecoder::new();

    for read in 0..max_reads {
        let Some(chunk) = stream.next().await else {
            if let Some(event) = decoder.finish() {
                if let Flow::Done(value) = on_event(event)? {
                    return Ok(value);
                }
            }
            tracing::warn!(reads = read, "event stream closed before a result");
            return Err(AppError::NoImageReturned);
        };
        let chunk = chunk.map_err(Into::into)?;
        for event in decoder.push(chunk.as_ref()) {
            if let Flow::Done(value) = on_event(event)? {
                return Ok(value);
            }
        }
    }

    tracing::warn!(max_reads, "event stream read cap reached");
    Err(AppError::Timeout(max_reads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::cell::Cell;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, AppError>> {
        let owned: Vec<Result<Vec<u8>, AppError>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    #[test]
    fn decodes_data_only_events() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder
            .push(b"data: {\"msg\":\"estimation\"}\n\ndata: {\"msg\":\"process_starts\"}\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, None);
        assert_eq!(events[1].data, "{\"msg\":\"process_starts\"}");
    }

    #[test]
    fn decodes_named_events_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: comp").is_empty());
        assert!(decoder.push(b"lete\r\ndata: [1,").is_empty());
        let events = decoder.push(b"2]\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent { event: Some("complete".into()), data: "[1,2]".into() }]
        );
    }

    #[test]
    fn keeps_multibyte_characters_split_between_reads() {
        let mut decoder = EventStreamDecoder::new();
        let bytes = "data: 🐉\n\n".as_bytes();
        assert!(decoder.push(&bytes[..8]).is_empty());
        let events = decoder.push(&bytes[8..]);
        assert_eq!(events[0].data, "🐉");
    }

    #[test]
    fn ignores_comments_and_flushes_on_finish() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b": keep-alive\n").is_empty());
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().map(|e| e.data), Some("tail".to_string()));
    }

    #[tokio::test]
    async fn stops_at_first_done() {
        let result = read_events(chunks(&["data: 1\n\n", "data: 2\n\n", "data: 3\n\n"]), 10, |ev| {
            Ok(if ev.data == "2" { Flow::Done(ev.data) } else { Flow::Continue })
        })
        .await
        .unwrap();
        assert_eq!(result, "2");
    }

    #[tokio::test]
    async fn closed_stream_is_no_image() {
        let err = read_events(chunks(&["data: 1\n\n"]), 10, |_| Ok(Flow::<()>::Continue))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoImageReturned));
    }

    #[tokio::test]
    async fn infinite_stream_is_cut_off_at_the_cap() {
        let reads = Cell::new(0usize);
        let endless = stream::repeat_with(|| {
            reads.set(reads.get() + 1);
            Ok::<_, AppError>(b"data: {\"msg\":\"heartbeat\"}\n\n".to_vec())
        });
        let err = read_events(endless, 200, |_| Ok(Flow::<()>::Continue))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Timeout(200)));
        assert_eq!(reads.get(), 200);
    }

    #[tokio::test]
    async fn handler_error_propagates() {
        let err = read_events(chunks(&["data: boom\n\n"]), 10, |_| {
            Err::<Flow<()>, _>(AppError::Upstream("boom".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
