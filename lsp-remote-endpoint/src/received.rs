use crate::message::RequestId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Table of requests the peer sent that we've accepted but not yet handed
/// to the local handler. Only the method name is kept (for diagnostics);
/// the in-flight message content is irrelevant once dispatched, so unlike
/// the original's raw pointer into a shared map, there is nothing here to
/// dangle.
#[derive(Default)]
pub struct ReceivedRequests {
  in_flight: Mutex<HashMap<RequestId, String>>,
}

impl ReceivedRequests {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records that an inbound request is in flight.
  pub fn insert(&self, id: RequestId, method: String) {
    self.in_flight.lock().insert(id, method);
  }

  /// The dispatch commitment point: removes `id` and returns whether it was
  /// still present. `false` means a concurrent `cancel` already removed it,
  /// and the caller must suppress dispatch.
  pub fn commit(&self, id: &RequestId) -> bool {
    self.in_flight.lock().remove(id).is_some()
  }

  /// Looks up and removes `id`, returning whether it was present. A `true`
  /// result means the cancellation preempted dispatch; `false` means the
  /// local handler had already committed to dispatching (or `id` was never
  /// received), so the cancellation is a no-op at this layer.
  pub fn cancel(&self, id: &RequestId) -> bool {
    self.in_flight.lock().remove(id).is_some()
  }

  pub fn contains(&self, id: &RequestId) -> bool {
    self.in_flight.lock().contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.in_flight.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    self.in_flight.lock().clear();
  }
}
