use crate::error::Diagnostic;
use std::io::{self, Read, Write};

/// The input half of a duplex transport. Blanket-implemented for anything
/// that is `Read` plus a liveness check; `start` takes one of these rather
/// than a concrete stdio/TCP/WebSocket type.
pub trait InputStream: Read + Send {
  /// Whether the stream is still expected to produce bytes. Transports that
  /// can't detect this cheaply may always return `true` and rely on `read`
  /// returning `Ok(0)`/an error at EOF instead.
  fn is_alive(&self) -> bool {
    true
  }
}

impl<T: Read + Send> InputStream for T {}

/// The output half of a duplex transport.
pub trait OutputStream: Write + Send {
  fn is_alive(&self) -> bool {
    true
  }
}

impl<T: Write + Send> OutputStream for T {}

/// Severity-tagged logging sink for protocol-level diagnostics (see
/// [`crate::error::Diagnostic`]). Distinct from the crate's own `tracing`
/// instrumentation: this is the channel an embedder uses to forward
/// diagnostics to, say, an LSP client's `window/logMessage`.
pub trait Log: Send + Sync {
  fn log(&self, diagnostic: Diagnostic);
}

/// A `Log` that forwards everything to `tracing` at a level matching the
/// diagnostic's severity. The default when no embedder-supplied `Log` is
/// given.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl Log for TracingLog {
  fn log(&self, diagnostic: Diagnostic) {
    use crate::error::Level;
    match diagnostic.level {
      Level::Info => tracing::info!(%diagnostic),
      Level::Warning => tracing::warn!(%diagnostic),
      Level::Severe => tracing::error!(%diagnostic),
    }
  }
}

pub(crate) fn io_is_closed(err: &io::Error) -> bool {
  matches!(
    err.kind(),
    io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
  )
}
