use crate::classify::{classify, Classified};
use crate::condition::Condition;
use crate::config::EndpointConfig;
use crate::error::{Diagnostic, DiagnosticKind, EndpointError, Level};
use crate::frame::{FrameReader, FrameWriter};
use crate::handler::{
  IncomingNotification, IncomingRequest, IncomingResponse, LocalEndpoint, MessageJsonHandler,
  TypedMessage,
};
use crate::id_alloc::IdAllocator;
use crate::message::{CancelParams, Message, RequestId, ResponseError, CANCEL_METHOD};
use crate::outstanding::{Completion, OutstandingRequests};
use crate::received::ReceivedRequests;
use crate::transport::{io_is_closed, InputStream, Log, OutputStream};
use crate::worker_pool::WorkerPool;
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::io::{BufReader, Read, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Boxed output, erased so `RemoteEndpoint` itself (and the [`EndpointHandle`]
/// handed to request handlers) is a concrete, non-generic type regardless
/// of the concrete transport an embedder connects.
type BoxedWriter = FrameWriter<Box<dyn Write + Send>>;

struct Inner {
  writer: Mutex<Option<Arc<BoxedWriter>>>,
  outstanding: OutstandingRequests,
  received: ReceivedRequests,
  id_alloc: IdAllocator,
  worker_pool: Mutex<Option<WorkerPool>>,
  producer: Mutex<Option<JoinHandle<()>>>,
  running: AtomicBool,
  json_handler: Arc<dyn MessageJsonHandler>,
  local_endpoint: Arc<dyn LocalEndpoint>,
  log: Arc<dyn Log>,
  config: EndpointConfig,
}

/// The remote endpoint dispatcher: owns the worker pool, the id counter,
/// and both request tables; streams are injected at [`RemoteEndpoint::start`].
/// Cloning is cheap (an `Arc` bump) and is how the handle passed to
/// [`LocalEndpoint::on_request`] is produced — `EndpointHandle` is the same
/// type, so a handler can call `ctx.send_response(...)` directly.
pub struct RemoteEndpoint(Arc<Inner>);

pub type EndpointHandle = RemoteEndpoint;

impl Clone for RemoteEndpoint {
  fn clone(&self) -> Self {
    RemoteEndpoint(Arc::clone(&self.0))
  }
}

impl RemoteEndpoint {
  pub fn new(
    config: EndpointConfig,
    json_handler: Arc<dyn MessageJsonHandler>,
    local_endpoint: Arc<dyn LocalEndpoint>,
    log: Arc<dyn Log>,
  ) -> Self {
    RemoteEndpoint(Arc::new(Inner {
      writer: Mutex::new(None),
      outstanding: OutstandingRequests::new(),
      received: ReceivedRequests::new(),
      id_alloc: IdAllocator::new(),
      worker_pool: Mutex::new(None),
      producer: Mutex::new(None),
      running: AtomicBool::new(false),
      json_handler,
      local_endpoint,
      log,
      config,
    }))
  }

  pub fn is_running(&self) -> bool {
    self.0.running.load(Ordering::SeqCst)
  }

  /// Binds `input`/`output`, spawns the producer thread, and starts the
  /// worker pool. Sets `running = true`.
  pub fn start<I, O>(&self, input: I, output: O) -> Result<(), EndpointError>
  where
    I: InputStream + 'static,
    O: OutputStream + 'static,
  {
    if self.0.running.swap(true, Ordering::SeqCst) {
      return Err(EndpointError::AlreadyStarted);
    }

    let writer = Arc::new(FrameWriter::new(Box::new(output) as Box<dyn Write + Send>));
    *self.0.writer.lock() = Some(writer);
    *self.0.worker_pool.lock() = Some(WorkerPool::new(self.0.config.max_workers));

    tracing::debug!(workers = self.0.config.max_workers, "endpoint starting");

    let this = self.clone();
    let resync_limit = self.0.config.frame_resync_limit;
    let handle = thread::Builder::new()
      .name("lsp-endpoint-producer".to_string())
      .spawn(move || this.producer_loop(input, resync_limit))
      .map_err(EndpointError::Io)?;
    *self.0.producer.lock() = Some(handle);
    Ok(())
  }

  /// Sets `running = false`, joins the producer thread (best-effort, with
  /// a grace period), drains the worker pool, and clears both tables.
  pub fn stop(&self) {
    if !self.0.running.swap(false, Ordering::SeqCst) {
      return;
    }
    self.0.log.log(Diagnostic::plain(Level::Info, "stopping endpoint"));
    tracing::debug!("endpoint stopping");

    if let Some(handle) = self.0.producer.lock().take() {
      let grace = self.0.config.shutdown_grace;
      let started = Instant::now();
      while !handle.is_finished() && started.elapsed() < grace {
        thread::sleep(Duration::from_millis(10));
      }
      if handle.is_finished() {
        let _ = handle.join();
      } else {
        self.0.log.log(Diagnostic::plain(
          Level::Warning,
          "producer thread did not exit within the shutdown grace period; detaching",
        ));
      }
    }

    if let Some(pool) = self.0.worker_pool.lock().take() {
      pool.shutdown();
    }

    // Dropping these entries without invoking their completions is
    // intentional: a blocked `wait_response` times out on its own Condition
    // regardless, and any async completion is documented as dropped here.
    self.0.outstanding.clear();
    self.0.received.clear();
    *self.0.writer.lock() = None;
  }

  pub fn send_notification(&self, method: &str, params: Value) {
    if !self.is_running() {
      self.0.log.log(Diagnostic::new(
        Level::Info,
        DiagnosticKind::SendFailure,
        format!("send_notification({}) after stop, ignored", method),
      ));
      return;
    }
    self.emit(&Message::notification(method, params));
  }

  pub fn send_response(&self, id: RequestId, result: Result<Value, ResponseError>) {
    let message = match result {
      Ok(value) => Message::success(id, value),
      Err(error) => Message::failure(id, error),
    };
    self.emit(&message);
  }

  /// Assigns the next monotonic id, registers `completion`, and emits the
  /// request. Returns immediately; the id is returned so callers (notably
  /// `wait_response`) can later look the entry back up.
  pub fn send_request(&self, method: &str, params: Value, completion: Completion) -> RequestId {
    let id = self.0.id_alloc.next_id();
    self.0.outstanding.insert(id.clone(), method.to_string(), completion);
    self.emit(&Message::request(id.clone(), method, params));
    id
  }

  /// Blocking `sendRequest` via an internal one-shot [`Condition`]. On
  /// timeout, removes the `OutstandingRequests` entry (see SPEC_FULL.md
  /// design note 1) so a late reply surfaces as an orphan response rather
  /// than silently vanishing.
  pub fn wait_response(
    &self,
    method: &str,
    params: Value,
    timeout: Duration,
  ) -> Option<TypedMessage> {
    let condition: Arc<Condition<TypedMessage>> = Arc::new(Condition::new());
    let waiter = Arc::clone(&condition);
    let completion: Completion = Box::new(move |typed| {
      waiter.notify(typed);
      None
    });
    let id = self.send_request(method, params, completion);
    let result = condition.wait(timeout);
    if result.is_none() {
      self.0.outstanding.take(&id);
    }
    result
  }

  fn emit(&self, message: &Message) {
    let writer = self.0.writer.lock().clone();
    match writer {
      Some(writer) => {
        let body = serde_json::to_string(&message.to_wire()).expect("message always serializes");
        if let Err(err) = writer.send(&body) {
          self.0.log.log(Diagnostic::new(
            Level::Info,
            DiagnosticKind::SendFailure,
            format!("output unavailable: {}", err),
          ));
        }
      },
      None => {
        self.0.log.log(Diagnostic::new(
          Level::Info,
          DiagnosticKind::SendFailure,
          "endpoint not started, message dropped",
        ));
      },
    }
  }

  fn submit_job(&self, job: impl FnOnce() + Send + 'static) {
    let pool = self.0.worker_pool.lock();
    if let Some(pool) = pool.as_ref() {
      pool.submit(Box::new(job));
    }
  }

  fn producer_loop<R: Read + Send>(self, input: R, resync_limit: Option<usize>) {
    let mut buffered = BufReader::new(input);
    let mut frame_reader = match resync_limit {
      Some(limit) => FrameReader::with_resync_limit(limit),
      None => FrameReader::new(),
    };

    loop {
      if !self.is_running() {
        break;
      }
      match frame_reader.next(&mut buffered, self.0.log.as_ref()) {
        Ok(Some(payload)) => {
          let endpoint = self.clone();
          self.submit_job(move || endpoint.process_payload(payload));
        },
        Ok(None) => {
          self
            .0
            .log
            .log(Diagnostic::plain(Level::Info, "input stream closed"));
          break;
        },
        Err(err) if io_is_closed(&err) => {
          self.0.log.log(Diagnostic::plain(
            Level::Info,
            format!("input stream closed: {}", err),
          ));
          break;
        },
        Err(err) => {
          self.0.log.log(Diagnostic::new(
            Level::Severe,
            DiagnosticKind::Framing,
            format!("transport read error: {}", err),
          ));
          break;
        },
      }
    }
    tracing::debug!("producer thread exiting");
  }

  /// The receive path from §4.7: parse, validate, classify, and route.
  fn process_payload(&self, payload: String) {
    let value: Value = match serde_json::from_str(&payload) {
      Ok(value) => value,
      Err(err) => {
        self.0.log.log(Diagnostic::new(
          Level::Severe,
          DiagnosticKind::Parse,
          format!(
            "JSON parse error at line {} column {}: {}",
            err.line(),
            err.column(),
            truncate(&payload, 200)
          ),
        ));
        return;
      },
    };

    match classify(&value) {
      Classified::Malformed(reason) => {
        self
          .0
          .log
          .log(Diagnostic::new(Level::Severe, DiagnosticKind::Protocol, reason));
      },
      Classified::Request { id, method, params } => self.handle_inbound_request(id, method, params),
      Classified::Response { id, result, error } => self.handle_inbound_response(id, result, error),
      Classified::Notification { method, params } => self.handle_inbound_notification(method, params),
    }
  }

  fn handle_inbound_request(&self, id: RequestId, method: String, params: Value) {
    match self.0.json_handler.parse_request(&method, &params) {
      Some(typed) => {
        self.0.received.insert(id.clone(), method.clone());
        self.route_request(id, method, typed);
      },
      None => self.0.log.log(Diagnostic::new(
        Level::Warning,
        DiagnosticKind::UnknownMethod,
        format!("unknown request method: {}", method),
      )),
    }
  }

  fn handle_inbound_response(&self, id: RequestId, result: Option<Value>, error: Option<ResponseError>) {
    let payload = bare_response_value(&result, &error);
    match self.0.outstanding.take(&id) {
      Some(entry) => match self.0.json_handler.parse_response(&entry.method, &payload) {
        Some(typed) => self.route_matched_response(entry.method, entry.completion, typed),
        None => self.0.log.log(Diagnostic::new(
          Level::Severe,
          DiagnosticKind::UnknownMethod,
          format!("failed to decode response for method {}", entry.method),
        )),
      },
      None => match self.0.json_handler.resolve_response(&payload) {
        Some((method, typed)) => self.route_orphan_response(method, typed),
        None => self.0.log.log(Diagnostic::plain(
          Level::Info,
          format!("orphan response for id {} could not be resolved", id),
        )),
      },
    }
  }

  fn handle_inbound_notification(&self, method: String, params: Value) {
    if method == CANCEL_METHOD {
      match serde_json::from_value::<CancelParams>(params) {
        Ok(cancel) => {
          self.0.received.cancel(&cancel.id);
        },
        Err(_) => self.0.log.log(Diagnostic::new(
          Level::Warning,
          DiagnosticKind::Protocol,
          "malformed $/cancelRequest params",
        )),
      }
      return;
    }

    match self.0.json_handler.parse_notification(&method, &params) {
      Some(typed) => self.route_notification(method, typed),
      None => self.0.log.log(Diagnostic::new(
        Level::Severe,
        DiagnosticKind::UnknownMethod,
        format!("unknown notification method: {}", method),
      )),
    }
  }

  /// The dispatch commitment point: whichever of `commit` (here) and
  /// `cancel` (from an incoming `$/cancelRequest`) removes the
  /// `ReceivedRequests` entry first wins the race. If `cancel` already won,
  /// `commit` returns `false` and dispatch is suppressed.
  fn route_request(&self, id: RequestId, method: String, typed: TypedMessage) {
    if !self.is_running() {
      return;
    }
    if !self.0.received.commit(&id) {
      return;
    }
    let request = IncomingRequest { id, method, message: typed };
    let ctx = self.clone();
    let local = Arc::clone(&self.0.local_endpoint);
    let outcome =
      panic::catch_unwind(panic::AssertUnwindSafe(|| local.on_request(&ctx, request)));
    self.log_handler_panic(outcome, "on_request");
  }

  fn route_matched_response(&self, method: String, completion: Completion, typed: TypedMessage) {
    if !self.is_running() {
      return;
    }
    let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| completion(typed)));
    match outcome {
      Ok(Some(typed)) => self.route_orphan_response(method, typed),
      Ok(None) => {},
      Err(panic) => self.0.log.log(Diagnostic::new(
        Level::Severe,
        DiagnosticKind::HandlerException,
        format!("completion callback panicked: {}", panic_message(&panic)),
      )),
    }
  }

  fn route_orphan_response(&self, method: String, typed: TypedMessage) {
    if !self.is_running() {
      return;
    }
    let response = IncomingResponse { message: typed };
    let local = Arc::clone(&self.0.local_endpoint);
    let outcome =
      panic::catch_unwind(panic::AssertUnwindSafe(|| local.on_response(&method, response)));
    self.log_handler_panic(outcome, "on_response");
  }

  fn route_notification(&self, method: String, typed: TypedMessage) {
    if !self.is_running() {
      return;
    }
    let notification = IncomingNotification { method, message: typed };
    let local = Arc::clone(&self.0.local_endpoint);
    let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| local.notify(notification)));
    self.log_handler_panic(outcome, "notify");
  }

  fn log_handler_panic(&self, outcome: std::thread::Result<()>, site: &str) {
    if let Err(panic) = outcome {
      self.0.log.log(Diagnostic::new(
        Level::Severe,
        DiagnosticKind::HandlerException,
        format!("{} panicked: {}", site, panic_message(&panic)),
      ));
    }
  }
}

/// The bare `result` or `error` value a response carries, handed to
/// `MessageJsonHandler` as-is rather than wrapped in a synthetic envelope —
/// a handler decoding `{"jsonrpc":"2.0","id":1,"result":42}` should see
/// `42`, not `{"result":42}`.
fn bare_response_value(result: &Option<Value>, error: &Option<ResponseError>) -> Value {
  if let Some(result) = result {
    result.clone()
  } else if let Some(error) = error {
    serde_json::to_value(error).expect("ResponseError always serializes")
  } else {
    Value::Null
  }
}

fn truncate(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
