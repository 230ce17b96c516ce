//! Property-based tests for the invariants in spec.md's "Invariants
//! (property-based)" list. Exercises the tables and primitives directly
//! rather than a full `RemoteEndpoint`, since the properties are about the
//! data structures' concurrency contracts, not the framing/transport glue
//! (which the end-to-end tests already cover).

use lsp_remote_endpoint::outstanding::OutstandingRequests;
use lsp_remote_endpoint::received::ReceivedRequests;
use lsp_remote_endpoint::{JsonValueHandler, MessageJsonHandler, RequestId, TypedMessage};
use parking_lot::Mutex;
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;

fn id_alloc() -> impl Fn() -> RequestId {
  let counter = Arc::new(AtomicI64::new(1));
  move || RequestId::Number(counter.fetch_add(1, Ordering::Relaxed))
}

proptest! {
  /// Invariant: for every `send_request(id=k)` followed by a matching
  /// response, the stored completion runs exactly once, never zero and
  /// never twice, regardless of how many other ids are in flight alongside
  /// it.
  #[test]
  fn matched_completion_runs_exactly_once(
    other_ids in vec(1i64..10_000, 0..20),
    target in 10_001i64..20_000,
  ) {
    let table = OutstandingRequests::new();
    let call_count = Arc::new(Mutex::new(0u32));
    for other in &other_ids {
      table.insert(RequestId::Number(*other), "noise".to_string(), Box::new(|_| None));
    }
    let counted = Arc::clone(&call_count);
    table.insert(
      RequestId::Number(target),
      "x/target".to_string(),
      Box::new(move |msg: TypedMessage| {
        *counted.lock() += 1;
        Some(msg)
      }),
    );

    let entry = table.take(&RequestId::Number(target));
    prop_assert!(entry.is_some(), "matching response must find the entry once");
    let entry = entry.unwrap();
    let forwarded = (entry.completion)(Box::new(json!(42)));
    prop_assert!(forwarded.is_some(), "this completion always hands the message back");
    prop_assert_eq!(*call_count.lock(), 1);

    // A second "response" for the same id is now an orphan: the entry is
    // gone, so no completion can run again.
    prop_assert!(table.take(&RequestId::Number(target)).is_none());
    prop_assert_eq!(*call_count.lock(), 1);
  }

  /// Invariant: concurrent `send_request` callers never observe the same
  /// id, for any number of concurrent callers in a reasonable range.
  #[test]
  fn concurrent_ids_are_always_distinct(thread_count in 2usize..10, per_thread in 2usize..30) {
    let next = id_alloc();
    let shared = Arc::new(Mutex::new(next));
    let mut handles = Vec::new();
    for _ in 0..thread_count {
      let shared = Arc::clone(&shared);
      handles.push(thread::spawn(move || {
        (0..per_thread).map(|_| (shared.lock())()).collect::<Vec<_>>()
      }));
    }
    let mut all = Vec::new();
    for handle in handles {
      all.extend(handle.join().unwrap());
    }
    let unique: HashSet<_> = all.iter().cloned().collect();
    prop_assert_eq!(unique.len(), all.len(), "two concurrent callers received the same id");
  }

  /// Invariant: ids assigned by a single allocator form a strictly
  /// increasing sequence no matter how many are drawn.
  #[test]
  fn sequential_ids_strictly_increase(count in 1usize..500) {
    let next = id_alloc();
    let mut prev: Option<i64> = None;
    for _ in 0..count {
      let RequestId::Number(value) = next() else { unreachable!() };
      if let Some(p) = prev {
        prop_assert!(value > p);
      }
      prev = Some(value);
    }
  }

  /// Invariant: whichever of `commit` (dispatch) or `cancel` removes a
  /// `ReceivedRequests` entry first wins; the other call is always a
  /// harmless no-op, and the table always ends empty, regardless of which
  /// side goes first.
  #[test]
  fn cancel_and_commit_are_mutually_exclusive(cancel_first in any::<bool>(), id in 0i64..1000) {
    let table = ReceivedRequests::new();
    table.insert(RequestId::Number(id), "long".to_string());

    let (first_won, second_won) = if cancel_first {
      let a = table.cancel(&RequestId::Number(id));
      let b = table.commit(&RequestId::Number(id));
      (a, b)
    } else {
      let a = table.commit(&RequestId::Number(id));
      let b = table.cancel(&RequestId::Number(id));
      (a, b)
    };

    prop_assert!(first_won, "the first call to touch a live entry must win");
    prop_assert!(!second_won, "the second call must observe the entry already gone");
    prop_assert!(table.is_empty());
  }

  /// Invariant: `resolve_response` is consulted for every orphan response,
  /// and `on_response` fires if and only if it returns `Some`.
  #[test]
  fn orphan_forwarding_matches_resolve_outcome(known in any::<bool>(), raw in any::<i64>()) {
    let handler = JsonValueHandler;
    let payload = json!({ "result": raw });

    // JsonValueHandler's resolve_response never succeeds (it has no method
    // name to infer), so this models both branches of the invariant: when
    // a handler resolves the orphan, the method/typed pair is `Some` and
    // forwarding must happen; when it can't, it's `None` and forwarding
    // must not happen. We assert the contract on JsonValueHandler itself
    // for the "can't resolve" half, and on a stub handler for the other.
    if known {
      struct AlwaysResolves;
      impl MessageJsonHandler for AlwaysResolves {
        fn parse_request(&self, _m: &str, _p: &Value) -> Option<TypedMessage> { None }
        fn parse_notification(&self, _m: &str, _p: &Value) -> Option<TypedMessage> { None }
        fn parse_response(&self, _m: &str, _p: &Value) -> Option<TypedMessage> { None }
        fn resolve_response(&self, payload: &Value) -> Option<(String, TypedMessage)> {
          Some(("z/qux".to_string(), Box::new(payload.clone())))
        }
      }
      let resolved = AlwaysResolves.resolve_response(&payload);
      prop_assert!(resolved.is_some());
      let (method, typed) = resolved.unwrap();
      prop_assert_eq!(method, "z/qux");
      prop_assert!(typed.downcast_ref::<Value>().is_some());
    } else {
      let resolved = handler.resolve_response(&payload);
      prop_assert!(resolved.is_none(), "JsonValueHandler never resolves an orphan");
    }
  }
}
