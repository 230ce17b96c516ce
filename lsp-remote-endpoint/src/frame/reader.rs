use crate::error::{Diagnostic, DiagnosticKind, Level};
use crate::transport::Log;
use std::io::{self, BufRead, Read};

enum FrameAttempt {
  Payload(String),
  Eof,
  Resync,
}

/// Decodes a Content-Length framed byte stream into payload strings. Does
/// not parse JSON; it only knows about headers and byte counts.
///
/// A `FrameReader` is single-use per stream: it holds no buffered bytes
/// across calls to `next` other than whatever the underlying `BufRead`
/// itself buffers.
pub struct FrameReader {
  resync_limit: Option<usize>,
}

impl Default for FrameReader {
  fn default() -> Self {
    FrameReader { resync_limit: None }
  }
}

impl FrameReader {
  pub fn new() -> Self {
    Self::default()
  }

  /// Caps how many consecutive malformed header blocks are skipped before
  /// giving up and treating the stream as closed, so a persistently
  /// garbled peer cannot spin the producer thread forever.
  pub fn with_resync_limit(limit: usize) -> Self {
    FrameReader {
      resync_limit: Some(limit),
    }
  }

  /// Reads the next frame. `Ok(None)` means clean end-of-input. A read
  /// error on the transport itself is propagated so the caller can treat
  /// it as input closure.
  pub fn next<R: BufRead>(&mut self, reader: &mut R, log: &dyn Log) -> io::Result<Option<String>> {
    let mut resyncs = 0usize;
    loop {
      match self.read_one_frame(reader, log)? {
        FrameAttempt::Payload(body) => return Ok(Some(body)),
        FrameAttempt::Eof => return Ok(None),
        FrameAttempt::Resync => {
          resyncs += 1;
          if let Some(limit) = self.resync_limit {
            if resyncs > limit {
              log.log(Diagnostic::new(
                Level::Severe,
                DiagnosticKind::Framing,
                "resync limit exceeded, closing stream",
              ));
              return Ok(None);
            }
          }
        },
      }
    }
  }

  fn read_one_frame<R: BufRead>(
    &mut self,
    reader: &mut R,
    log: &dyn Log,
  ) -> io::Result<FrameAttempt> {
    let mut content_length: Option<usize> = None;
    loop {
      let mut line = String::new();
      if reader.read_line(&mut line)? == 0 {
        return Ok(FrameAttempt::Eof);
      }
      let trimmed = line.trim_end_matches(['\r', '\n']);
      if trimmed.is_empty() {
        break;
      }
      match trimmed.split_once(':') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("content-length") => {
          match value.trim().parse::<usize>() {
            Ok(len) => content_length = Some(len),
            Err(_) => log.log(Diagnostic::new(
              Level::Severe,
              DiagnosticKind::Framing,
              format!("unparseable Content-Length: {:?}", value.trim()),
            )),
          }
        },
        Some(_) => {
          // other headers (e.g. Content-Type) are tolerated and ignored
        },
        None => log.log(Diagnostic::new(
          Level::Severe,
          DiagnosticKind::Framing,
          format!("malformed header line: {:?}", trimmed),
        )),
      }
    }

    let len = match content_length {
      Some(len) => len,
      None => {
        log.log(Diagnostic::new(
          Level::Severe,
          DiagnosticKind::Framing,
          "missing Content-Length header, resynchronizing",
        ));
        return Ok(FrameAttempt::Resync);
      },
    };

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    match String::from_utf8(buf) {
      Ok(body) => Ok(FrameAttempt::Payload(body)),
      Err(_) => {
        log.log(Diagnostic::new(
          Level::Severe,
          DiagnosticKind::Framing,
          "frame body is not valid UTF-8, resynchronizing",
        ));
        Ok(FrameAttempt::Resync)
      },
    }
  }
}
