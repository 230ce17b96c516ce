use crate::handler::TypedMessage;
use crate::message::RequestId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Invoked with the decoded response message, consuming it. Returns
/// `Some(message)` to hand the same message back for forwarding to
/// `LocalEndpoint::on_response` as well, or `None` if the completion fully
/// consumed it (the typical case for `waitResponse`).
pub type Completion = Box<dyn FnOnce(TypedMessage) -> Option<TypedMessage> + Send>;

struct Entry {
  method: String,
  completion: Completion,
}

/// Table of requests this endpoint sent and is awaiting a response for.
/// Serialized by a single mutex; the table is expected to stay small (a
/// few thousand entries at most).
#[derive(Default)]
pub struct OutstandingRequests {
  entries: Mutex<HashMap<RequestId, Entry>>,
}

pub struct TakenEntry {
  pub method: String,
  pub completion: Completion,
}

impl OutstandingRequests {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts a new entry. Precondition: `id` is unique among live entries
  /// (the id allocator guarantees this for ids this endpoint assigned).
  pub fn insert(&self, id: RequestId, method: String, completion: Completion) {
    self.entries.lock().insert(id, Entry { method, completion });
  }

  /// Atomically removes and returns the entry for `id`, used when a
  /// matching response arrives.
  pub fn take(&self, id: &RequestId) -> Option<TakenEntry> {
    self.entries.lock().remove(id).map(|e| TakenEntry {
      method: e.method,
      completion: e.completion,
    })
  }

  /// Read-only check for whether `id` is currently outstanding.
  pub fn contains(&self, id: &RequestId) -> bool {
    self.entries.lock().contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Wipes all entries, e.g. on endpoint shutdown. Returns the removed
  /// entries so the caller can fail their completions rather than just
  /// dropping them silently.
  pub fn clear(&self) -> Vec<TakenEntry> {
    self
      .entries
      .lock()
      .drain()
      .map(|(_, e)| TakenEntry {
        method: e.method,
        completion: e.completion,
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn take_removes_entry() {
    let table = OutstandingRequests::new();
    let id = RequestId::Number(1);
    table.insert(id.clone(), "x/foo".to_string(), Box::new(|_| None));
    assert!(table.contains(&id));
    let entry = table.take(&id).unwrap();
    assert_eq!(entry.method, "x/foo");
    assert!(table.take(&id).is_none());
  }

  #[test]
  fn clear_drops_all_entries_and_returns_them() {
    let table = OutstandingRequests::new();
    table.insert(RequestId::Number(1), "a".into(), Box::new(|_| None));
    table.insert(RequestId::Number(2), "b".into(), Box::new(|_| None));
    let drained = table.clear();
    assert_eq!(drained.len(), 2);
    assert!(table.is_empty());
  }
}
