use crate::message::RequestId;
use std::sync::atomic::{AtomicI64, Ordering};

/// Strictly monotonic outbound request id source, generalizing the
/// teacher's `request_id_counter: AtomicUsize`. No lock: `fetch_add` alone
/// is the synchronization point, so the order two threads observe their
/// assigned ids in is the order they acquired the send path, per data
/// model invariant 4.
#[derive(Debug, Default)]
pub struct IdAllocator {
  next: AtomicI64,
}

impl IdAllocator {
  pub fn new() -> Self {
    IdAllocator {
      next: AtomicI64::new(1),
    }
  }

  pub fn next_id(&self) -> RequestId {
    RequestId::Number(self.next.fetch_add(1, Ordering::Relaxed))
  }
}
