use std::fmt;

/// Fatal failures that can occur while constructing or starting an endpoint.
///
/// Everything the protocol itself can shrug off (bad frames, unknown methods,
/// handler panics) is reported through [`Diagnostic`] instead; `EndpointError`
/// is reserved for conditions the caller must actually handle.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
  #[error("endpoint already started")]
  AlreadyStarted,
  #[error("endpoint not started")]
  NotStarted,
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Severity of a [`Diagnostic`], ordered roughly by how worried the embedder
/// should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Info,
  Warning,
  Severe,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Level::Info => "info",
      Level::Warning => "warning",
      Level::Severe => "severe",
    };
    f.write_str(s)
  }
}

/// The non-fatal taxonomy from the error handling design: every one of these
/// is logged and the dispatcher keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  Framing,
  Parse,
  Protocol,
  UnknownMethod,
  HandlerException,
  SendFailure,
}

impl fmt::Display for DiagnosticKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      DiagnosticKind::Framing => "framing",
      DiagnosticKind::Parse => "parse",
      DiagnosticKind::Protocol => "protocol",
      DiagnosticKind::UnknownMethod => "unknown_method",
      DiagnosticKind::HandlerException => "handler_exception",
      DiagnosticKind::SendFailure => "send_failure",
    };
    f.write_str(s)
  }
}

/// One reportable event from the protocol layer, handed to [`crate::handler::Log`].
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub level: Level,
  pub kind: Option<DiagnosticKind>,
  pub message: String,
}

impl Diagnostic {
  pub fn new(level: Level, kind: DiagnosticKind, message: impl Into<String>) -> Self {
    Diagnostic {
      level,
      kind: Some(kind),
      message: message.into(),
    }
  }

  pub fn plain(level: Level, message: impl Into<String>) -> Self {
    Diagnostic {
      level,
      kind: None,
      message: message.into(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      Some(kind) => write!(f, "[{}/{}] {}", self.level, kind, self.message),
      None => write!(f, "[{}] {}", self.level, self.message),
    }
  }
}
