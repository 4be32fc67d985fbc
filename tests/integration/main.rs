//! Performer integration test harness.
//!
//! Tests here drive a full `TaskDispatcher` built the way a worker builds
//! it. Remote tests talk to a mock JSON-RPC server bound on 127.0.0.1:0.
//!
//!   cargo test --test integration
//!
//! The mock server runs its own tokio runtime on a background thread. The
//! dispatcher is blocking and is always called from the plain test thread.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use performer_core::config::{PerformerConfig, StrategyKind};
use performer_services::TaskDispatcher;

mod dispatch;
mod remote;

// ── Mock JSON-RPC server ──────────────────────────────────────────────────────

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    body: &'static str,
    delay: Duration,
}

/// Handle to a running mock server. Dropping it stops the server.
pub struct MockRpc {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockRpc {
    /// Start a server that answers every POST with `status` and `body`.
    pub fn start(status: StatusCode, body: &'static str) -> Result<Self> {
        Self::start_with_delay(status, body, Duration::ZERO)
    }

    /// Like `start`, but each response is held back for `delay`.
    pub fn start_with_delay(status: StatusCode, body: &'static str, delay: Duration) -> Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            status,
            body,
            delay,
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let addr = spawn_server(move |listener| async move {
            let app = Router::new().route("/", post(handle_rpc)).with_state(state);
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        })?;

        Ok(Self {
            url: format!("http://{addr}/"),
            requests,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockRpc {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle_rpc(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { content_type, body });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, [(header::CONTENT_TYPE, "application/json")], state.body)
}

/// Server whose responses promise a longer body than they carry. Headers
/// arrive intact, then the connection closes mid-body.
pub struct TruncatedRpc {
    pub url: String,
}

const TRUNCATED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
content-type: application/json\r\n\
content-length: 64\r\n\
connection: close\r\n\
\r\n\
{\"jsonrpc\":\"2.0\"";

impl TruncatedRpc {
    pub fn start() -> Result<Self> {
        let addr = spawn_server(|listener| async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                // Drain the request first so closing does not reset the
                // connection before the headers are read.
                if read_request(&mut stream).await.is_err() {
                    continue;
                }
                let _ = stream.write_all(TRUNCATED_RESPONSE).await;
                let _ = stream.shutdown().await;
            }
        })?;
        Ok(Self {
            url: format!("http://{addr}/"),
        })
    }
}

/// Read one HTTP/1.1 request: headers, then `content-length` body bytes.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return Ok(());
        }
    }
}

/// Bind 127.0.0.1:0 on a fresh runtime thread and hand the listener to
/// `serve`. Returns once the address is known.
fn spawn_server<F, Fut>(serve: F) -> Result<SocketAddr>
where
    F: FnOnce(TcpListener) -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let (addr_tx, addr_rx) = std::sync::mpsc::channel::<Result<SocketAddr, String>>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = addr_tx.send(Err(e.to_string()));
                return;
            }
        };
        rt.block_on(async move {
            let listener = match TcpListener::bind("127.0.0.1:0").await {
                Ok(l) => l,
                Err(e) => {
                    let _ = addr_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let _ = addr_tx.send(listener.local_addr().map_err(|e| e.to_string()));
            serve(listener).await;
        });
    });

    addr_rx
        .recv_timeout(Duration::from_secs(5))
        .context("mock server did not report its address")?
        .map_err(anyhow::Error::msg)
        .context("mock server failed to start")
}

// ── Dispatcher helpers ────────────────────────────────────────────────────────

/// Dispatcher for `signature` using the local strategy.
pub fn local_dispatcher(signature: &str) -> Result<TaskDispatcher> {
    let mut config = PerformerConfig::default();
    config.interface.signature = signature.to_string();
    config.execution.strategy = StrategyKind::Local;
    TaskDispatcher::from_config(&config)
}

/// Dispatcher for the default interface forwarding to `endpoint`.
pub fn remote_dispatcher(endpoint: &str, timeout_secs: u64) -> Result<TaskDispatcher> {
    let mut config = PerformerConfig::default();
    config.execution.strategy = StrategyKind::Remote;
    config.execution.remote.endpoint = endpoint.to_string();
    config.execution.remote.timeout_secs = timeout_secs;
    TaskDispatcher::from_config(&config)
}

/// Lowercase hex SHA-256, computed independently of the crate under test.
pub fn expected_digest(payload: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(payload))
}
