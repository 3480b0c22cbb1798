//! Incremental decoder for the newline-delimited `data: <json>` stream.
//!
//! Network reads split the body at arbitrary byte offsets, including inside a
//! multi-byte UTF-8 sequence. The decoder buffers raw bytes and only decodes a
//! line once its terminating `\n` has arrived, so partial lines are carried
//! over to the next `feed` call and never lost or duplicated.

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::frame::Frame;

const DATA_PREFIX: &str = "data:";

/// Longest line held back while waiting for its newline.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Turns raw body chunks into complete [`Frame`]s.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    // Bytes of `buf` already known to contain no newline.
    scanned: usize,
    max_line: usize,
    // Inside an oversized line whose head was already discarded.
    skipping: bool,
    malformed: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that holds back at most `max_line` bytes of an unterminated
    /// line; a longer line is dropped as malformed.
    pub fn with_max_line_bytes(max_line: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            max_line: max_line.max(1),
            skipping: false,
            malformed: 0,
        }
    }

    /// Accepts the next chunk and returns every frame it completed, in order.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk.as_ref());
        let mut frames = Vec::new();
        while let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let newline = self.scanned + offset;
            let line = self.buf.split_to(newline + 1);
            self.scanned = 0;
            if std::mem::take(&mut self.skipping) {
                continue;
            }
            if let Some(frame) = self.decode_line(&line[..newline]) {
                frames.push(frame);
            }
        }
        self.scanned = self.buf.len();
        if self.buf.len() > self.max_line {
            if !self.skipping {
                self.malformed += 1;
                warn!(limit = self.max_line, "dropping oversized stream line");
            }
            self.skipping = true;
            self.buf.clear();
            self.scanned = 0;
        }
        frames
    }

    /// Decodes whatever is left in the buffer as a final line.
    ///
    /// Called once the body has ended; a well-formed stream leaves nothing
    /// behind, but a last line without a trailing newline is still honoured.
    pub fn flush(&mut self) -> Vec<Frame> {
        self.scanned = 0;
        if std::mem::take(&mut self.skipping) || self.buf.is_empty() {
            self.buf.clear();
            return Vec::new();
        }
        let line = self.buf.split();
        self.decode_line(&line).into_iter().collect()
    }

    /// Number of `data:` lines dropped because their body did not decode or
    /// exceeded the line limit.
    pub fn malformed_lines(&self) -> u64 {
        self.malformed
    }

    /// Bytes currently held back waiting for a newline.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Frame> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                self.malformed += 1;
                debug!(error = %err, "dropping stream line with invalid UTF-8");
                return None;
            }
        };
        let body = line.strip_prefix(DATA_PREFIX)?.trim();
        if body.is_empty() {
            return None;
        }
        let frame = Frame::from_json(body);
        if frame.is_none() {
            self.malformed += 1;
            debug!(line = %body, "dropping undecodable stream frame");
        }
        frame
    }
}
