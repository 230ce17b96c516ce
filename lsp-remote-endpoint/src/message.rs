use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Either half of a JSON-RPC id: a signed integer or a string, per the wire
/// format in the external interfaces section. Derives `Hash`/`Eq` so it can
/// key the outstanding/received request tables directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
  Number(i64),
  String(String),
}

impl fmt::Display for RequestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RequestId::Number(n) => write!(f, "{}", n),
      RequestId::String(s) => write!(f, "{}", s),
    }
  }
}

impl From<i64> for RequestId {
  fn from(n: i64) -> Self {
    RequestId::Number(n)
  }
}

/// A JSON-RPC error object, `{code, message, data?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
  pub code: i64,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

impl ResponseError {
  pub const PARSE_ERROR: i64 = -32700;
  pub const INVALID_REQUEST: i64 = -32600;
  pub const METHOD_NOT_FOUND: i64 = -32601;
  pub const INVALID_PARAMS: i64 = -32602;
  pub const INTERNAL_ERROR: i64 = -32603;
  pub const REQUEST_CANCELLED: i64 = -32800;

  pub fn new(code: i64, message: impl Into<String>) -> Self {
    ResponseError {
      code,
      message: message.into(),
      data: None,
    }
  }

  pub fn method_not_found(method: &str) -> Self {
    ResponseError::new(
      Self::METHOD_NOT_FOUND,
      format!("unknown method: {}", method),
    )
  }

  pub fn cancelled() -> Self {
    ResponseError::new(Self::REQUEST_CANCELLED, "request cancelled")
  }
}

/// The method name used for the dispatcher-level cancellation protocol.
pub const CANCEL_METHOD: &str = "$/cancelRequest";

#[derive(Debug, Clone, Deserialize)]
pub struct CancelParams {
  pub id: RequestId,
}

/// A decoded wire message in one of the three JSON-RPC kinds. `params` on a
/// request/notification and `result`/`error` on a response are left as raw
/// `Value`; typed decoding happens one layer up through `MessageJsonHandler`.
#[derive(Debug, Clone)]
pub enum Message {
  Request {
    id: RequestId,
    method: String,
    params: Value,
  },
  Response {
    id: RequestId,
    result: Option<Value>,
    error: Option<ResponseError>,
  },
  Notification {
    method: String,
    params: Value,
  },
}

impl Message {
  pub fn request(id: RequestId, method: impl Into<String>, params: Value) -> Self {
    Message::Request {
      id,
      method: method.into(),
      params,
    }
  }

  pub fn notification(method: impl Into<String>, params: Value) -> Self {
    Message::Notification {
      method: method.into(),
      params,
    }
  }

  pub fn success(id: RequestId, result: Value) -> Self {
    Message::Response {
      id,
      result: Some(result),
      error: None,
    }
  }

  pub fn failure(id: RequestId, error: ResponseError) -> Self {
    Message::Response {
      id,
      result: None,
      error: Some(error),
    }
  }

  /// Serializes this message to its wire JSON body, including the
  /// `"jsonrpc":"2.0"` marker. Does not add framing.
  pub fn to_wire(&self) -> Value {
    match self {
      Message::Request { id, method, params } => serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
      }),
      Message::Response { id, result, error } => {
        let mut v = serde_json::json!({
          "jsonrpc": "2.0",
          "id": id,
        });
        if let Some(result) = result {
          v["result"] = result.clone();
        }
        if let Some(error) = error {
          v["error"] = serde_json::to_value(error).expect("ResponseError always serializes");
        }
        v
      },
      Message::Notification { method, params } => serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
      }),
    }
  }
}
