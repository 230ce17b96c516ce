//! A JSON-RPC 2.0 / LSP-style remote endpoint dispatcher.
//!
//! Frames and parses Content-Length delimited messages off a byte stream,
//! classifies them, dispatches to a local handler on a worker pool, and
//! tracks outstanding outbound requests and inbound received requests. The
//! concrete transport, the JSON-to-typed-message decoding, and the local
//! application handler are all injected through the traits in [`handler`]
//! and [`transport`] — this crate owns only the dispatch kernel.

pub mod classify;
pub mod condition;
pub mod config;
pub mod error;
pub mod frame;
pub mod handler;
pub mod id_alloc;
pub mod message;
pub mod outstanding;
pub mod received;
pub mod transport;
pub mod worker_pool;

mod endpoint;

pub use config::EndpointConfig;
pub use endpoint::{EndpointHandle, RemoteEndpoint};
pub use error::{Diagnostic, DiagnosticKind, EndpointError, Level};
pub use handler::{
  as_json_value, IncomingNotification, IncomingRequest, IncomingResponse, JsonValueHandler,
  LocalEndpoint, MessageJsonHandler, TypedMessage,
};
pub use message::{CancelParams, Message, RequestId, ResponseError, CANCEL_METHOD};
pub use outstanding::Completion;
pub use transport::{InputStream, Log, OutputStream, TracingLog};
