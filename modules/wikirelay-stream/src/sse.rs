//! Incremental server-sent-events frame decoder.
//!
//! Feed raw body chunks as they arrive; complete frames come out once their
//! terminating blank line has been seen. Partial lines are buffered across
//! chunks, so a frame split anywhere by the transport reassembles intact.

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes, returning any frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.flush() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') {
                // Heartbeat comment; the feed sends these to keep the
                // connection alive.
            } else if let Some(value) = field_value(line, "event") {
                self.event = Some(value.to_string());
            } else if let Some(value) = field_value(line, "data") {
                self.data.push(value.to_string());
            }
            // `id:` and `retry:` are ignored; no resume cursor is kept across
            // reconnects.
        }
        frames
    }

    fn flush(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    let rest = rest.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame_decodes() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"event: message\ndata: {\"title\":\"Earth\"}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("message"));
        assert_eq!(frames[0].data, "{\"title\":\"Earth\"}");
    }

    #[test]
    fn frame_split_across_chunks_reassembles() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: hel").is_empty());
        assert!(decoder.feed(b"lo\n").is_empty());
        let frames = decoder.feed(b"\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: one\ndata: two\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "one\ntwo");
    }

    #[test]
    fn comments_and_stray_blank_lines_emit_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b":ok\n\n").is_empty());
        assert!(decoder.feed(b"\n\n").is_empty());
    }

    #[test]
    fn crlf_line_endings_tolerated() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: x\r\n\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: a\n\ndata: b\n\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "a");
        assert_eq!(frames[1].data, "b");
    }

    #[test]
    fn multibyte_title_split_mid_character_survives() {
        let bytes = "data: Путин\n\n".as_bytes();
        let (a, b) = bytes.split_at(9); // splits inside a Cyrillic codepoint
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(a).is_empty());
        let frames = decoder.feed(b);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "Путин");
    }
}
