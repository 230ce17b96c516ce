use crate::endpoint::EndpointHandle;
use crate::message::RequestId;
use serde_json::Value;
use std::any::Any;

/// A message decoded by [`MessageJsonHandler`] into whatever representation
/// the embedder's LSP type hierarchy uses. The dispatcher never inspects
/// this beyond passing it along, so it is kept as an erased `Any`;
/// embedders downcast back to their concrete request/response/notification
/// structs.
pub type TypedMessage = Box<dyn Any + Send>;

/// Downcasts a [`TypedMessage`] produced by [`JsonValueHandler`] back to the
/// raw `serde_json::Value` it was built from.
pub fn as_json_value(typed: &TypedMessage) -> Option<&Value> {
  typed.downcast_ref::<Value>()
}

/// The JSON-to-typed-message reflection layer. Out of scope for the
/// dispatcher's own logic: it only needs *a* way to turn raw params/result
/// JSON plus a method name into something it can hand to [`LocalEndpoint`].
pub trait MessageJsonHandler: Send + Sync {
  fn parse_request(&self, method: &str, params: &Value) -> Option<TypedMessage>;
  fn parse_notification(&self, method: &str, params: &Value) -> Option<TypedMessage>;
  fn parse_response(&self, method: &str, payload: &Value) -> Option<TypedMessage>;
  /// Best-effort decode of a response whose id matched no outstanding
  /// request, inferring the method from the payload shape alone.
  fn resolve_response(&self, payload: &Value) -> Option<(String, TypedMessage)>;
}

/// A `MessageJsonHandler` that performs no real reflection: every message
/// is boxed as its raw `Value`. Sufficient for embedders happy to work with
/// JSON directly, and for exercising the dispatcher in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonValueHandler;

impl MessageJsonHandler for JsonValueHandler {
  fn parse_request(&self, _method: &str, params: &Value) -> Option<TypedMessage> {
    Some(Box::new(params.clone()))
  }

  fn parse_notification(&self, _method: &str, params: &Value) -> Option<TypedMessage> {
    Some(Box::new(params.clone()))
  }

  fn parse_response(&self, _method: &str, payload: &Value) -> Option<TypedMessage> {
    Some(Box::new(payload.clone()))
  }

  /// `JsonValueHandler` has no reflection capability, so it has no way to
  /// infer a method name for a response whose id matched nothing — a real
  /// embedder's handler, which knows its own method/response shapes, is
  /// the one able to make this call.
  fn resolve_response(&self, _payload: &Value) -> Option<(String, TypedMessage)> {
    None
  }
}

/// A request the peer sent us, decoded and ready for the application.
pub struct IncomingRequest {
  pub id: RequestId,
  pub method: String,
  pub message: TypedMessage,
}

/// A response to a request this endpoint sent, either matched against
/// `OutstandingRequests` or orphaned.
pub struct IncomingResponse {
  pub message: TypedMessage,
}

pub struct IncomingNotification {
  pub method: String,
  pub message: TypedMessage,
}

/// The local application. Responsible for eventually replying to requests
/// via the [`EndpointHandle`] it's handed (mirrors the teacher's
/// `Handler::handle_request(&mut self, ctx: &RpcCtx, ...)` taking a context
/// back to the peer).
pub trait LocalEndpoint: Send + Sync {
  fn on_request(&self, ctx: &EndpointHandle, request: IncomingRequest);
  fn on_response(&self, method: &str, response: IncomingResponse);
  fn notify(&self, notification: IncomingNotification);
}
