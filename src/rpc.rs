//! JSON-RPC 2.0 adapter.
//!
//! `POST /echo/rpc` accepts a single method, `"echo"`, and reflects the
//! snapshot back as the JSON-RPC `result` with the echoed request object
//! as `op_result`. Protocol failures ride an HTTP 200 carrying the
//! standard error object; the transport status stays successful because
//! JSON-RPC errors are protocol-level, not transport-level.

use {
    crate::error::{EchoError, EchoResult},
    crate::rest::plain_error_reply,
    crate::snapshot::{request_parts, EnvelopeResult, RequestParts, RequestSnapshot},
    serde_json::{json, Map, Value},
    tracing::debug,
    uuid::Uuid,
    warp::{reply, Filter, Rejection, Reply},
};

/// The only method this reflector serves.
const ECHO_METHOD: &str = "echo";

/// Route for the JSON-RPC surface.
pub fn routes() -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    warp::path!("echo" / "rpc")
        .and(warp::post())
        .and(request_parts())
        .and_then(handle_rpc)
}

async fn handle_rpc(parts: RequestParts) -> Result<warp::reply::Response, Rejection> {
    let request_id = Uuid::new_v4();

    // Non-UTF-8 payloads never reach JSON parsing; that is a transport-level
    // 400, not a JSON-RPC error.
    if let Err(e) = std::str::from_utf8(&parts.body) {
        return Ok(plain_error_reply(
            &EchoError::MalformedBody(e.to_string()),
            &request_id,
        ));
    }

    let message: Value = match serde_json::from_slice(&parts.body) {
        Ok(message) => message,
        Err(e) => {
            debug!(%request_id, error = %e, "JSON-RPC body is not valid JSON");
            return Ok(rpc_error_reply(&EchoError::ParseError, None));
        }
    };

    // The id is echoed on validation errors whenever the body parsed as JSON.
    let recovered_id = message.get("id").cloned();

    if let Err(e) = validate_request(&message) {
        debug!(%request_id, error = %e, "JSON-RPC request rejected");
        return Ok(rpc_error_reply(&e, recovered_id));
    }

    let snapshot = match RequestSnapshot::from_parts(&parts) {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(plain_error_reply(&e, &request_id)),
    };

    debug!(%request_id, id = ?recovered_id, "JSON-RPC echo");
    let op_result = echoed_request(&message);
    let result = EnvelopeResult::new(snapshot, op_result);
    let response = json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": recovered_id.unwrap_or(Value::Null),
    });
    Ok(reply::json(&response).into_response())
}

/// Validate the JSON-RPC 2.0 envelope structure and method.
pub fn validate_request(message: &Value) -> EchoResult<()> {
    let envelope = message
        .as_object()
        .ok_or_else(|| EchoError::InvalidRequest("request must be a JSON object".to_string()))?;

    match envelope.get("jsonrpc").and_then(Value::as_str) {
        Some("2.0") => {}
        _ => {
            return Err(EchoError::InvalidRequest(
                "jsonrpc must be the string \"2.0\"".to_string(),
            ))
        }
    }

    let method = envelope
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| EchoError::InvalidRequest("missing method".to_string()))?;

    if method != ECHO_METHOD {
        return Err(EchoError::MethodNotFound(method.to_string()));
    }

    Ok(())
}

/// The echoed request object used as `op_result`: jsonrpc, method, and
/// params/id exactly as received, omitted when absent.
pub fn echoed_request(message: &Value) -> Value {
    let mut echoed = Map::new();
    echoed.insert("jsonrpc".to_string(), message["jsonrpc"].clone());
    echoed.insert("method".to_string(), message["method"].clone());
    if let Some(params) = message.get("params") {
        echoed.insert("params".to_string(), params.clone());
    }
    if let Some(id) = message.get("id") {
        echoed.insert("id".to_string(), id.clone());
    }
    Value::Object(echoed)
}

/// Protocol-level failure on a transport-success response (HTTP 200).
fn rpc_error_reply(err: &EchoError, id: Option<Value>) -> warp::reply::Response {
    reply::json(&err.to_json_rpc_error(id)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::StatusCode;

    async fn post_rpc(body: &str) -> (StatusCode, Value) {
        let resp = warp::test::request()
            .method("POST")
            .path("/echo/rpc")
            .remote_addr("127.0.0.1:41003".parse().unwrap())
            .body(body.as_bytes())
            .reply(&routes())
            .await;
        let status = resp.status();
        let json = serde_json::from_slice(resp.body()).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_echo_reflects_request_as_op_result() {
        let (status, body) = post_rpc(
            r#"{"jsonrpc":"2.0","method":"echo","params":["arg1","arg2"],"id":123}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 123);
        let op_result = &body["result"]["op_result"];
        assert_eq!(op_result["jsonrpc"], "2.0");
        assert_eq!(op_result["method"], "echo");
        assert_eq!(op_result["params"], json!(["arg1", "arg2"]));
        assert_eq!(op_result["id"], 123);
    }

    #[tokio::test]
    async fn test_echo_without_params_omits_them() {
        let (status, body) = post_rpc(r#"{"jsonrpc":"2.0","method":"echo","id":"abc"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "abc");
        assert!(body["result"]["op_result"].get("params").is_none());
    }

    #[tokio::test]
    async fn test_notification_style_call_still_answers() {
        let (status, body) = post_rpc(r#"{"jsonrpc":"2.0","method":"echo"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].is_null());
        assert!(body.get("result").is_some());
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let (status, body) = post_rpc("{bad json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn test_wrong_version_is_invalid_request() {
        let (status, body) =
            post_rpc(r#"{"jsonrpc":"1.0","method":"echo","params":[],"id":7}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn test_missing_method_is_invalid_request() {
        let (_, body) = post_rpc(r#"{"jsonrpc":"2.0","id":1}"#).await;
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let (status, body) =
            post_rpc(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":9}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], 9);
    }

    #[tokio::test]
    async fn test_snapshot_body_is_raw_json_text() {
        let raw = r#"{"jsonrpc":"2.0","method":"echo","id":5}"#;
        let (_, body) = post_rpc(raw).await;
        assert_eq!(body["result"]["request"]["body"], raw);
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate_request(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, EchoError::InvalidRequest(_)));
    }
}
