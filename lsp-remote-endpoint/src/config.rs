/// Constructor-time configuration for a [`crate::endpoint::RemoteEndpoint`].
/// No environment variables, no persisted state: everything the dispatcher
/// needs is passed in here or as one of the injected collaborator traits.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
  /// Worker pool size. Spec recommends a small default (2-4); chosen to
  /// keep a slow handler from being able to stall framing entirely while
  /// not spawning more threads than most embedders need.
  pub max_workers: usize,
  /// Caps consecutive resynchronizations `FrameReader` will attempt after
  /// a malformed header block before giving up on the stream. `None`
  /// means unbounded, matching the spec's framing behavior literally.
  pub frame_resync_limit: Option<usize>,
  /// Grace period `stop()` waits for the producer thread to notice
  /// `running = false` before logging a warning and detaching it.
  pub shutdown_grace: std::time::Duration,
}

impl Default for EndpointConfig {
  fn default() -> Self {
    EndpointConfig {
      max_workers: 4,
      frame_resync_limit: None,
      shutdown_grace: std::time::Duration::from_millis(500),
    }
  }
}
