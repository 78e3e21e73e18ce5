//! Integration tests for the JSON-RPC 2.0 echo surface.

mod helpers;

use helpers::with_echo_test_server;
use serde_json::{json, Value};

async fn post_rpc(
    server: &helpers::EchoTestServer,
    body: String,
) -> Result<(u16, Value), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::new();
    let resp = client
        .post(server.url("/echo/rpc"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await?;
    let status = resp.status().as_u16();
    let json = resp.json().await?;
    Ok((status, json))
}

#[tokio::test]
async fn test_rpc_echo_round_trip() {
    with_echo_test_server(|server| async move {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "echo",
            "params": [["arg1", "arg2"], {"name": "value"}],
            "id": 123,
        });
        let (status, body) = post_rpc(&server, request.to_string()).await?;

        assert_eq!(status, 200);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 123);

        // op_result is the full echoed request object.
        assert_eq!(body["result"]["op_result"], request);
        assert_eq!(body["result"]["request"]["http"]["method"], "POST");
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rpc_string_id_is_echoed() {
    with_echo_test_server(|server| async move {
        let request = json!({"jsonrpc": "2.0", "method": "echo", "params": {}, "id": "test-id"});
        let (_, body) = post_rpc(&server, request.to_string()).await?;
        assert_eq!(body["id"], "test-id");
        assert_eq!(body["result"]["op_result"]["id"], "test-id");
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rpc_malformed_json_is_parse_error() {
    with_echo_test_server(|server| async move {
        let (status, body) = post_rpc(&server, "{bad json".to_string()).await?;

        assert_eq!(status, 200);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rpc_wrong_version_is_invalid_request() {
    with_echo_test_server(|server| async move {
        let request = json!({"jsonrpc": "1.0", "method": "echo", "params": [], "id": 1});
        let (status, body) = post_rpc(&server, request.to_string()).await?;

        assert_eq!(status, 200);
        assert_eq!(body["error"]["code"], -32600);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rpc_unknown_method_is_method_not_found() {
    with_echo_test_server(|server| async move {
        let request = json!({"jsonrpc": "2.0", "method": "nonexistent", "params": [], "id": 9});
        let (status, body) = post_rpc(&server, request.to_string()).await?;

        assert_eq!(status, 200);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], 9);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_rpc_snapshot_carries_raw_body() {
    with_echo_test_server(|server| async move {
        let raw = r#"{"jsonrpc":"2.0","method":"echo","id":5}"#.to_string();
        let (_, body) = post_rpc(&server, raw.clone()).await?;
        assert_eq!(body["result"]["request"]["body"], raw);
        assert_eq!(body["result"]["request"]["params"], "None");
        Ok(())
    })
    .await
    .unwrap();
}
