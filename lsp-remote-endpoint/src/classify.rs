use crate::message::{RequestId, ResponseError};
use serde_json::Value;

/// What a parsed JSON payload turned out to be, before typed decoding.
#[derive(Debug, Clone)]
pub enum Classified {
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
  Malformed(String),
}

/// Peeks at a parsed JSON value and decides its kind without consuming
/// anything beyond `jsonrpc`, `id`, `method`, `result`, `error`. Pure: no
/// side effects, no allocation beyond what the returned value needs.
pub fn classify(value: &Value) -> Classified {
  let obj = match value.as_object() {
    Some(obj) => obj,
    None => return Classified::Malformed("payload is not a JSON object".to_string()),
  };

  match obj.get("jsonrpc") {
    Some(Value::String(v)) if v == "2.0" => {},
    Some(other) => {
      return Classified::Malformed(format!("unexpected jsonrpc version: {}", other))
    },
    None => return Classified::Malformed("missing jsonrpc member".to_string()),
  }

  let id = obj.get("id").and_then(parse_request_id);
  let method = obj.get("method").and_then(Value::as_str);
  let has_result = obj.contains_key("result");
  let has_error = obj.contains_key("error");

  match (method, &id) {
    (Some(method), Some(id)) => Classified::Request {
      id: id.clone(),
      method: method.to_string(),
      params: obj.get("params").cloned().unwrap_or(Value::Null),
    },
    (Some(method), None) => Classified::Notification {
      method: method.to_string(),
      params: obj.get("params").cloned().unwrap_or(Value::Null),
    },
    (None, Some(id)) if has_result != has_error => Classified::Response {
      id: id.clone(),
      result: obj.get("result").cloned(),
      error: obj
        .get("error")
        .and_then(|e| serde_json::from_value(e.clone()).ok()),
    },
    (None, Some(_)) => {
      Classified::Malformed("response must have exactly one of result/error".to_string())
    },
    (None, None) => Classified::Malformed("message has neither method nor id".to_string()),
  }
}

fn parse_request_id(value: &Value) -> Option<RequestId> {
  if let Some(n) = value.as_i64() {
    Some(RequestId::Number(n))
  } else {
    value.as_str().map(|s| RequestId::String(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn classifies_request() {
    let v = json!({"jsonrpc":"2.0","id":7,"method":"x/foo","params":{}});
    match classify(&v) {
      Classified::Request { id, method, .. } => {
        assert_eq!(id, RequestId::Number(7));
        assert_eq!(method, "x/foo");
      },
      other => panic!("expected request, got {:?}", other),
    }
  }

  #[test]
  fn classifies_notification() {
    let v = json!({"jsonrpc":"2.0","method":"$/cancelRequest","params":{"id":5}});
    assert!(matches!(classify(&v), Classified::Notification { .. }));
  }

  #[test]
  fn classifies_success_response() {
    let v = json!({"jsonrpc":"2.0","id":1,"result":42});
    match classify(&v) {
      Classified::Response { id, result, error } => {
        assert_eq!(id, RequestId::Number(1));
        assert_eq!(result, Some(json!(42)));
        assert!(error.is_none());
      },
      other => panic!("expected response, got {:?}", other),
    }
  }

  #[test]
  fn response_with_both_result_and_error_is_malformed() {
    let v = json!({"jsonrpc":"2.0","id":1,"result":1,"error":{"code":-1,"message":"x"}});
    assert!(matches!(classify(&v), Classified::Malformed(_)));
  }

  #[test]
  fn missing_jsonrpc_is_malformed() {
    let v = json!({"id":1,"result":1});
    assert!(matches!(classify(&v), Classified::Malformed(_)));
  }

  #[test]
  fn wrong_jsonrpc_version_is_malformed() {
    let v = json!({"jsonrpc":"1.0","id":1,"method":"x"});
    assert!(matches!(classify(&v), Classified::Malformed(_)));
  }

  #[test]
  fn string_id_round_trips() {
    let v = json!({"jsonrpc":"2.0","id":"abc","method":"x","params":null});
    match classify(&v) {
      Classified::Request { id, .. } => assert_eq!(id, RequestId::String("abc".to_string())),
      other => panic!("expected request, got {:?}", other),
    }
  }
}
