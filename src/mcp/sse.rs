//! Incremental parser for server-sent event streams.
//!
//! Network chunks can split an event anywhere, so bytes are buffered until a
//! blank line terminates a frame.

/// A single parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if the frame carried one. Absent means the default
    /// `message` event.
    pub event: Option<String>,
    /// Concatenated `data:` lines.
    pub data: String,
}

impl SseEvent {
    /// Event name, defaulting to `message` per the SSE spec.
    pub fn name(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// Buffering SSE frame parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the stream and drain any complete events.
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buf.push_str(chunk);

        let mut events = Vec::new();
        // A frame ends at a blank line.
        while let Some(end) = self.buf.find("\n\n") {
            let frame: String = self.buf.drain(..end + 2).collect();
            if let Some(event) = parse_frame(frame.trim_end_matches('\n')) {
                events.push(event);
            }
        }
        events
    }
}

/// Parse one complete frame into an event. Frames with no data (comments,
/// keep-alives) yield None.
fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines = Vec::new();

    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim_start_matches(' ').to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // id:, retry: and comment lines are ignored.
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}
