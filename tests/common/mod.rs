//! Mock chain node and IPFS endpoints for integration tests.
//!
//! Both servers bind 127.0.0.1:0 and run until the test runtime stops.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::{json, Value};
use sha3::{Digest, Sha3_256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

/// What the mock node hands out from `encode_submission`.
pub const SIGNING_MESSAGE: &[u8] = b"curavault mock signing message";

#[derive(Default)]
pub struct NodeState {
    /// Keyed by `"<address>|<resource type>"`.
    pub resources: HashMap<String, Value>,
    pub view_result: Vec<Value>,
    pub sequence_number: u64,
    /// Polls answered with `pending_transaction` before a hash commits.
    pub pending_polls: u32,
    /// Commit every transaction as failed.
    pub abort: bool,
    /// Answer this many ledger-info requests with 503 first.
    pub ledger_failures: u32,
    /// Signed transactions accepted so far.
    pub submitted: Vec<Value>,
    pub polls: HashMap<String, u32>,
}

pub type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(state: &Shared<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn api_error(status: StatusCode, error_code: &str, message: &str) -> Response {
    (status, Json(json!({ "message": message, "error_code": error_code }))).into_response()
}

pub struct MockNode {
    /// Base URL without `/v1`.
    pub url: String,
    pub state: Shared<NodeState>,
}

impl MockNode {
    pub fn state(&self) -> MutexGuard<'_, NodeState> {
        lock(&self.state)
    }

    pub fn put_resource(&self, address: &str, resource_type: &str, data: Value) {
        self.state()
            .resources
            .insert(format!("{}|{}", address, resource_type), data);
    }
}

async fn ledger(State(state): State<Shared<NodeState>>) -> Response {
    let mut s = lock(&state);
    if s.ledger_failures > 0 {
        s.ledger_failures -= 1;
        return api_error(StatusCode::SERVICE_UNAVAILABLE, "internal_error", "node busy");
    }
    Json(json!({
        "chain_id": 2,
        "epoch": "1",
        "ledger_version": "1000",
        "ledger_timestamp": "1700000000000000",
    }))
    .into_response()
}

async fn account(State(state): State<Shared<NodeState>>, Path(address): Path<String>) -> Response {
    let s = lock(&state);
    Json(json!({
        "sequence_number": s.sequence_number.to_string(),
        "authentication_key": address,
    }))
    .into_response()
}

async fn resource(
    State(state): State<Shared<NodeState>>,
    Path((address, resource_type)): Path<(String, String)>,
) -> Response {
    let s = lock(&state);
    match s.resources.get(&format!("{}|{}", address, resource_type)) {
        Some(data) => Json(json!({ "type": resource_type, "data": data })).into_response(),
        None => api_error(
            StatusCode::NOT_FOUND,
            "resource_not_found",
            &format!("Resource not found by Address({}), Struct tag({})", address, resource_type),
        ),
    }
}

async fn view(State(state): State<Shared<NodeState>>, Json(body): Json<Value>) -> Response {
    if body.get("function").and_then(Value::as_str).is_none() {
        return api_error(StatusCode::BAD_REQUEST, "invalid_input", "missing function");
    }
    Json(Value::Array(lock(&state).view_result.clone())).into_response()
}

async fn encode_submission(Json(body): Json<Value>) -> Response {
    if body.get("sender").is_none() || body.get("payload").is_none() {
        return api_error(StatusCode::BAD_REQUEST, "invalid_input", "incomplete transaction");
    }
    Json(json!(format!("0x{}", hex::encode(SIGNING_MESSAGE)))).into_response()
}

fn verify_signature(body: &Value) -> bool {
    let decode = |field: &str| {
        body["signature"][field]
            .as_str()
            .and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
    };
    let (Some(public_key), Some(signature)) = (decode("public_key"), decode("signature")) else {
        return false;
    };
    let Ok(public_key) = <[u8; 32]>::try_from(public_key.as_slice()) else {
        return false;
    };
    let Ok(signature) = <[u8; 64]>::try_from(signature.as_slice()) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&public_key) else {
        return false;
    };
    key.verify(SIGNING_MESSAGE, &Signature::from_bytes(&signature)).is_ok()
}

/// Apply the effects the `health_record` module would have.
fn execute(s: &mut NodeState, body: &Value) {
    let function = body["payload"]["function"].as_str().unwrap_or_default();
    let arguments = body["payload"]["arguments"].as_array().cloned().unwrap_or_default();

    if function.ends_with("::add_record") {
        let patient = arguments[0].as_str().unwrap_or_default();
        let cid = arguments[1].clone();
        let resource_type = function.replace("::add_record", "::HealthRecord");
        let entry = s
            .resources
            .entry(format!("{}|{}", patient, resource_type))
            .or_insert_with(|| json!({ "cid": [] }));
        if let Some(cids) = entry["cid"].as_array_mut() {
            cids.push(cid);
        }
    } else if function.ends_with("::grant_access") {
        s.view_result = vec![json!(true)];
    } else if function.ends_with("::revoke_access") {
        s.view_result = vec![json!(false)];
    }
}

async fn submit(State(state): State<Shared<NodeState>>, Json(body): Json<Value>) -> Response {
    if !verify_signature(&body) {
        return api_error(StatusCode::BAD_REQUEST, "invalid_signature", "signature verification failed");
    }

    let mut s = lock(&state);
    let hash = format!("0x{}", hex::encode(Sha3_256::digest(body.to_string().as_bytes())));
    if !s.abort {
        execute(&mut s, &body);
    }
    s.sequence_number += 1;
    s.submitted.push(body);
    s.polls.insert(hash.clone(), 0);

    (StatusCode::ACCEPTED, Json(json!({ "hash": hash }))).into_response()
}

async fn by_hash(State(state): State<Shared<NodeState>>, Path(hash): Path<String>) -> Response {
    let mut s = lock(&state);
    let pending_polls = s.pending_polls;
    let abort = s.abort;
    let Some(polls) = s.polls.get_mut(&hash) else {
        return api_error(StatusCode::NOT_FOUND, "transaction_not_found", "Transaction not found");
    };

    *polls += 1;
    if *polls <= pending_polls {
        return Json(json!({ "type": "pending_transaction", "hash": hash })).into_response();
    }
    Json(json!({
        "type": "user_transaction",
        "hash": hash,
        "version": "1001",
        "success": !abort,
        "vm_status": if abort { "Move abort in health_record: 0x1" } else { "Executed successfully" },
    }))
    .into_response()
}

pub async fn spawn_node(initial: NodeState) -> MockNode {
    let state = Arc::new(Mutex::new(initial));
    let app = Router::new()
        .route("/v1", get(ledger))
        .route("/v1/", get(ledger))
        .route("/v1/accounts/{address}", get(account))
        .route("/v1/accounts/{address}/resource/{resource_type}", get(resource))
        .route("/v1/view", post(view))
        .route("/v1/transactions", post(submit))
        .route("/v1/transactions/encode_submission", post(encode_submission))
        .route("/v1/transactions/by_hash/{hash}", get(by_hash))
        .with_state(state.clone());

    MockNode {
        url: serve(app).await,
        state,
    }
}

#[derive(Default)]
pub struct IpfsState {
    pub blobs: HashMap<String, Vec<u8>>,
    /// `Authorization` header of the last add request.
    pub last_authorization: Option<String>,
}

pub struct MockIpfs {
    pub url: String,
    pub state: Shared<IpfsState>,
}

impl MockIpfs {
    pub fn gateway(&self) -> String {
        format!("{}/ipfs", self.url)
    }
}

async fn add(State(state): State<Shared<IpfsState>>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("file").to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some((name, bytes.to_vec())),
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        }
    }
    let Some((name, bytes)) = upload else {
        return (StatusCode::BAD_REQUEST, "file argument 'path' is required").into_response();
    };

    let cid = format!("bafy{}", hex::encode(&Sha3_256::digest(&bytes)[..16]));
    let size = bytes.len();
    let mut s = lock(&state);
    s.last_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    s.blobs.insert(cid.clone(), bytes);

    Json(json!({ "Name": name, "Hash": cid, "Size": size.to_string() })).into_response()
}

async fn gateway(State(state): State<Shared<IpfsState>>, Path(cid): Path<String>) -> Response {
    match lock(&state).blobs.get(&cid) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn spawn_ipfs() -> MockIpfs {
    let state = Arc::new(Mutex::new(IpfsState::default()));
    let app = Router::new()
        .route("/api/v0/add", post(add))
        .route("/ipfs/{cid}", get(gateway))
        .with_state(state.clone());

    MockIpfs {
        url: serve(app).await,
        state,
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Answers every connection with `200 OK` headers and a truncated body,
/// then holds the socket open without sending the rest.
pub async fn spawn_stalling_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1024\r\n\r\n{\"partial\":";
                if socket.write_all(head.as_bytes()).await.is_ok() {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                }
            });
        }
    });
    format!("http://{}", addr)
}
