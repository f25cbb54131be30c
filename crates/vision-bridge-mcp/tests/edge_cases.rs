//! Edge case integration tests for vision-bridge-mcp.
//!
//! Drives the protocol handler end-to-end with a recording backend in
//! place of the remote vision model.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use vision_bridge::{Analysis, VisionBackend, VisionError, VisionPayload, DEFAULT_QUERY};

use vision_bridge_mcp::protocol::ProtocolHandler;
use vision_bridge_mcp::state::ServerState;
use vision_bridge_mcp::transport::framing;
use vision_bridge_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

/// What the recording backend replies with.
enum Reply {
    Ok { text: String, model: String },
    TransportError(String),
}

/// Test double for the remote vision model. Records every payload it is
/// handed so tests can assert on the exact wire shape.
struct RecordingBackend {
    payloads: Mutex<Vec<VisionPayload>>,
    reply: Reply,
}

impl RecordingBackend {
    fn echoing(text: &str, model: &str) -> Arc<Self> {
        Arc::new(Self {
            payloads: Mutex::new(Vec::new()),
            reply: Reply::Ok {
                text: text.to_string(),
                model: model.to_string(),
            },
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            payloads: Mutex::new(Vec::new()),
            reply: Reply::TransportError(message.to_string()),
        })
    }

    fn call_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    fn recorded(&self) -> Vec<VisionPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VisionBackend for RecordingBackend {
    async fn invoke(&self, payload: VisionPayload) -> vision_bridge::Result<Analysis> {
        self.payloads.lock().unwrap().push(payload);
        match &self.reply {
            Reply::Ok { text, model } => Ok(Analysis {
                text: text.clone(),
                model: model.clone(),
            }),
            Reply::TransportError(message) => Err(VisionError::Transport(message.clone())),
        }
    }
}

fn handler_with(backend: Arc<RecordingBackend>) -> ProtocolHandler {
    let state = Arc::new(ServerState::with_backend(backend, "qwen-vl-plus"));
    ProtocolHandler::new(state)
}

/// Build an MCP JSON-RPC request.
fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

/// Build an initialize request.
fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

/// Send a JSON-RPC message through the handler and return the response.
async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

/// Send and unwrap the response.
async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Parse the envelope JSON out of a tools/call result.
fn envelope_of(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("expected text content, got: {response}"));
    serde_json::from_str(text).unwrap()
}

fn write_image(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> String {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(bytes).unwrap();
    path.to_str().unwrap().to_string()
}

// ═══════════════════════════════════════════════════════
// PROTOCOL TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn handshake_reports_server_identity() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));

    let resp = send_unwrap(&handler, init_request()).await;
    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "vision-bridge-mcp");
    assert!(result["capabilities"]["tools"].is_object());

    // initialized is a notification, no response expected
    let notif = json!({ "jsonrpc": "2.0", "method": "initialized" });
    assert!(send(&handler, notif).await.is_none());

    // ping returns an empty object
    let pong = send_unwrap(&handler, mcp_request(1, "ping", json!({}))).await;
    assert_eq!(pong["result"], json!({}));
}

#[tokio::test]
async fn future_protocol_version_is_answered_with_server_version() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));

    let msg = mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2025-11-25",
            "capabilities": {},
            "clientInfo": { "name": "future-client", "version": "99.0" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let result = framing::parse_message(r#"{"broken":"#);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code(), -32700);

    assert!(framing::parse_message("").is_err());
    assert!(framing::parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"#).is_err());
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));

    let msg = json!({
        "jsonrpc": "1.0",
        "id": 7,
        "method": "ping",
        "params": {}
    });
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32600);
    assert_eq!(resp["id"], 7);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(5, "resources/list", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601);
}

#[tokio::test]
async fn tool_inventory_is_exactly_four_tools() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "tools/list", json!({}))).await;
    let tools = resp["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "analyze_image",
            "analyze_image_from_context",
            "check_image_file",
            "list_supported_image_formats",
        ]
    );
    for tool in tools {
        assert!(tool["inputSchema"]["type"] == "object");
    }
}

#[tokio::test]
async fn unknown_tool_is_tool_not_found() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        2,
        "tools/call",
        json!({ "name": "vision_capture", "arguments": {} }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32803);
}

// ═══════════════════════════════════════════════════════
// ARGUMENT VALIDATION TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn missing_image_path_is_invalid_params() {
    let backend = RecordingBackend::echoing("ok", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        1,
        "tools/call",
        json!({ "name": "analyze_image", "arguments": {} }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn contextual_tool_requires_all_three_arguments() {
    let backend = RecordingBackend::echoing("ok", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    // Missing context
    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "analyze_image_from_context",
            "arguments": { "image_path": "https://example.com/a.png", "query": "what?" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);

    // Missing query — must not be silently defaulted
    let msg = mcp_request(
        2,
        "tools/call",
        json!({
            "name": "analyze_image_from_context",
            "arguments": {
                "context": [{ "role": "user", "content": "hi" }],
                "image_path": "https://example.com/a.png"
            }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);

    // Malformed role
    let msg = mcp_request(
        3,
        "tools/call",
        json!({
            "name": "analyze_image_from_context",
            "arguments": {
                "context": [{ "role": "narrator", "content": "hi" }],
                "image_path": "https://example.com/a.png",
                "query": "what?"
            }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);

    assert_eq!(backend.call_count(), 0);
}

// ═══════════════════════════════════════════════════════
// ENVELOPE TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn analysis_round_trips_through_the_envelope() {
    let backend = RecordingBackend::echoing("a red bicycle", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "analyze_image",
            "arguments": {
                "image_path": "https://example.com/bike.png",
                "query": "what vehicle is this?"
            }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    let envelope = envelope_of(&resp);

    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["result"], "a red bicycle");
    assert_eq!(envelope["image_path"], "https://example.com/bike.png");
    assert_eq!(envelope["model"], "qwen-vl-plus");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn backend_failure_becomes_a_failure_envelope() {
    let backend = RecordingBackend::failing("connection refused");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "analyze_image",
            "arguments": { "image_path": "https://example.com/bike.png" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;

    // A domain failure is a normal tool result, not a protocol error
    assert!(resp.get("error").is_none(), "got protocol error: {resp}");
    let envelope = envelope_of(&resp);
    assert_eq!(envelope["success"], false);
    let error = envelope["error"].as_str().unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("connection refused"));
}

#[tokio::test]
async fn missing_query_defaults_before_reaching_the_backend() {
    let backend = RecordingBackend::echoing("ok", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "analyze_image",
            "arguments": { "image_path": "https://example.com/a.png" }
        }),
    );
    send_unwrap(&handler, msg).await;

    let payloads = backend.recorded();
    assert_eq!(payloads.len(), 1);
    let value = serde_json::to_value(&payloads[0]).unwrap();
    assert_eq!(
        value["input"]["messages"][0]["content"][0]["text"],
        DEFAULT_QUERY
    );
}

// ═══════════════════════════════════════════════════════
// PRE-REMOTE VALIDATION TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn invalid_local_files_never_reach_the_backend() {
    let backend = RecordingBackend::echoing("ok", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let dir = tempfile::tempdir().unwrap();
    let text_file = write_image(&dir, "notes.txt", b"not an image");
    let big = dir.path().join("big.png");
    std::fs::File::create(&big)
        .unwrap()
        .set_len(20 * 1024 * 1024 + 1)
        .unwrap();

    for (id, path) in [
        (1, "/definitely/not/here.png".to_string()),
        (2, text_file),
        (3, big.to_str().unwrap().to_string()),
    ] {
        let msg = mcp_request(
            id,
            "tools/call",
            json!({ "name": "analyze_image", "arguments": { "image_path": path } }),
        );
        let resp = send_unwrap(&handler, msg).await;
        let envelope = envelope_of(&resp);
        assert_eq!(envelope["success"], false, "path should be rejected");
        assert!(!envelope["error"].as_str().unwrap().is_empty());
    }

    assert_eq!(backend.call_count(), 0, "backend must not be invoked");
}

#[tokio::test]
async fn context_order_is_preserved_into_the_payload() {
    let backend = RecordingBackend::echoing("tall bar on the left", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "analyze_image_from_context",
            "arguments": {
                "context": [
                    { "role": "system", "content": "be terse" },
                    { "role": "user", "content": "we were discussing charts" },
                    { "role": "assistant", "content": "yes, bar charts" }
                ],
                "image_path": "https://example.com/chart.png",
                "query": "which bar is tallest?"
            }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(envelope_of(&resp)["success"], true);

    let payloads = backend.recorded();
    assert_eq!(payloads.len(), 1);
    let messages = serde_json::to_value(&payloads[0]).unwrap()["input"]["messages"].clone();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"][0]["text"], "be terse");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"][0]["text"], "we were discussing charts");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["content"][0]["text"], "yes, bar charts");
    assert_eq!(messages[3]["role"], "user");
    assert_eq!(messages[3]["content"][0]["text"], "which bar is tallest?");
    assert_eq!(
        messages[3]["content"][1]["image"],
        "https://example.com/chart.png"
    );
}

// ═══════════════════════════════════════════════════════
// OFFLINE TOOL TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn check_image_file_reports_without_invoking_the_backend() {
    let backend = RecordingBackend::echoing("ok", "qwen-vl-plus");
    let handler = handler_with(backend.clone());
    send_unwrap(&handler, init_request()).await;

    // URL references are passed through
    let msg = mcp_request(
        1,
        "tools/call",
        json!({
            "name": "check_image_file",
            "arguments": { "image_path": "https://example.com/cat.png" }
        }),
    );
    let envelope = envelope_of(&send_unwrap(&handler, msg).await);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["type"], "url");

    // Local files report size and format
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir, "photo.webp", &[0u8; 42]);
    let msg = mcp_request(
        2,
        "tools/call",
        json!({ "name": "check_image_file", "arguments": { "image_path": path } }),
    );
    let envelope = envelope_of(&send_unwrap(&handler, msg).await);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["size"], 42);
    assert_eq!(envelope["format"], "webp");

    // Missing files fail inside the envelope
    let msg = mcp_request(
        3,
        "tools/call",
        json!({
            "name": "check_image_file",
            "arguments": { "image_path": "/no/such/file.png" }
        }),
    );
    let envelope = envelope_of(&send_unwrap(&handler, msg).await);
    assert_eq!(envelope["success"], false);

    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn format_policy_is_invariant_across_calls() {
    let handler = handler_with(RecordingBackend::echoing("ok", "qwen-vl-plus"));
    send_unwrap(&handler, init_request()).await;

    let mut seen = Vec::new();
    for id in 1..=2 {
        let msg = mcp_request(
            id,
            "tools/call",
            json!({ "name": "list_supported_image_formats", "arguments": {} }),
        );
        seen.push(envelope_of(&send_unwrap(&handler, msg).await));
    }

    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0]["success"], true);
    assert_eq!(
        seen[0]["formats"],
        json!(["jpeg", "jpg", "png", "webp", "gif"])
    );
    assert_eq!(seen[0]["max_size_mb"], 20);
}
