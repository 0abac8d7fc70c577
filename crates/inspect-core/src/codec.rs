/*!
Framing: newline-delimited UTF-8 JSON, BOM-tolerant.

Each wire message is exactly one JSON object followed by `\n`; a leading
U+FEFF is stripped before parsing, and a trailing `\r` is tolerated. There
are no length prefixes. This module owns only the byte-level framing; it
deliberately knows nothing about request/response/notification shapes so
both the endpoint (server reads) and the bridge (client reads) share one
implementation.
*/

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Strip a leading UTF-8 BOM from a frame, if present.
#[must_use]
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
  bytes.strip_prefix(&BOM[..]).unwrap_or(bytes)
}

/// Strip a leading BOM and a trailing `\r`, leaving the bytes a JSON parser
/// can consume directly.
#[must_use]
pub fn trim_frame(bytes: &[u8]) -> &[u8] {
  let bytes = strip_bom(bytes);
  bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Accumulates bytes read off a byte-stream transport and yields complete
/// newline-terminated frames as they become available.
///
/// Frames not yet terminated by `\n` are never handed to a caller — the
/// accumulator buffers them until the terminator arrives (or the
/// connection closes, in which case any unterminated tail is simply
/// discarded by the caller, matching "frames not terminated by `\n` are not
/// delivered to handlers").
#[derive(Debug, Default)]
pub struct FrameReader {
  buf: Vec<u8>,
}

impl FrameReader {
  /// Create an empty reader.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Feed newly read bytes in, returning every complete frame extracted in
  /// order. Frame bytes are BOM/`\r`-trimmed and exclude the trailing `\n`.
  pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
    self.buf.extend_from_slice(chunk);

    let mut frames = Vec::new();
    loop {
      let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
        break;
      };
      let frame = self.buf.drain(..=pos).collect::<Vec<u8>>();
      // drop the trailing '\n' we just consumed
      let frame = &frame[..frame.len() - 1];
      frames.push(trim_frame(frame).to_vec());
    }
    frames
  }

  /// Number of bytes currently buffered without a terminating `\n`.
  #[must_use]
  pub fn pending_len(&self) -> usize {
    self.buf.len()
  }
}

/// Append a trailing `\n` to an encoded frame, as every written message
/// must carry one.
#[must_use]
pub fn frame_line(mut encoded: Vec<u8>) -> Vec<u8> {
  encoded.push(b'\n');
  encoded
}
