use parking_lot::Mutex;
use std::io::{self, Write};

/// Serializes writes onto an output stream using Content-Length framing.
/// The mutex spans header + body + flush, mirroring the original's
/// `m_sendMutex` guarding the whole `WriterMsg` call, so two writers can
/// never interleave bytes (data model invariant 3).
pub struct FrameWriter<W: Write> {
  inner: Mutex<W>,
}

impl<W: Write> FrameWriter<W> {
  pub fn new(writer: W) -> Self {
    FrameWriter {
      inner: Mutex::new(writer),
    }
  }

  /// Writes one already-serialized JSON body as a framed message and
  /// flushes. Returns the underlying io error on failure; the caller (the
  /// dispatcher) is responsible for downgrading that into a non-fatal
  /// send-failure diagnostic.
  pub fn send(&self, body: &str) -> io::Result<()> {
    let mut writer = self.inner.lock();
    write!(writer, "Content-Length: {}\r\n\r\n{}", body.len(), body)?;
    writer.flush()
  }
}
