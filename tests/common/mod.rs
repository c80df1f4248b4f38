//! In-process JSON-RPC node serving the backend metadata side channel

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const METADATA_METHOD: &str = "fhevm_relayer_metadata";

struct NodeState {
    result: Value,
    calls: AtomicUsize,
}

/// Stub node; `result` is returned verbatim for the metadata method
pub struct StubNode {
    pub url: String,
    state: Arc<NodeState>,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl StubNode {
    pub async fn start(result: Value) -> Self {
        let state = Arc::new(NodeState {
            result,
            calls: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/", post(handle_rpc))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
            _shutdown: tx,
        }
    }

    /// Node reporting the standard 0xA / 0xB / 0xC addresses
    pub async fn with_metadata() -> Self {
        Self::start(json!({
            "ACLAddress": "0x000000000000000000000000000000000000000a",
            "InputVerifierAddress": "0x000000000000000000000000000000000000000b",
            "KMSVerifierAddress": "0x000000000000000000000000000000000000000c"
        }))
        .await
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

async fn handle_rpc(State(state): State<Arc<NodeState>>, Json(req): Json<Value>) -> Json<Value> {
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    if req.get("method").and_then(Value::as_str) != Some(METADATA_METHOD) {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": "method not found" }
        }));
    }
    state.calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": state.result }))
}
