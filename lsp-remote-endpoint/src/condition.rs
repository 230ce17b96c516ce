use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A one-shot rendezvous: exactly one `notify(value)`, exactly one
/// `wait(timeout)`. Generalizes the teacher's `rx_queue`/`rx_cvar` pair in
/// `RpcState` (a multi-item queue) down to a single slot, which is all
/// `waitResponse` needs.
pub struct Condition<T> {
  slot: Mutex<Option<T>>,
  cvar: Condvar,
}

impl<T> Default for Condition<T> {
  fn default() -> Self {
    Condition {
      slot: Mutex::new(None),
      cvar: Condvar::new(),
    }
  }
}

impl<T> Condition<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Delivers `value` to a waiter. A second call is a no-op: the slot is
  /// only ever filled once, matching the "subsequent notifies are no-ops"
  /// rule.
  pub fn notify(&self, value: T) {
    let mut slot = self.slot.lock();
    if slot.is_none() {
      *slot = Some(value);
      self.cvar.notify_one();
    }
  }

  /// Blocks until `notify` is called or `timeout` elapses, returning the
  /// value in the former case and `None` in the latter. `wait_for` permits
  /// spurious wakeups, so a wakeup with the slot still empty re-checks
  /// against the deadline rather than treating it as a timeout.
  pub fn wait(&self, timeout: Duration) -> Option<T> {
    let deadline = Instant::now() + timeout;
    let mut slot = self.slot.lock();
    loop {
      if slot.is_some() {
        return slot.take();
      }
      let remaining = deadline.saturating_duration_since(Instant::now());
      if remaining.is_zero() {
        return None;
      }
      self.cvar.wait_for(&mut slot, remaining);
    }
  }
}
