//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use quill_gateway::backend::{BackendError, TextBackend};
use quill_gateway::{GatewayConfig, HttpServer, Shutdown};

/// What a scripted model answers.
#[allow(dead_code)]
pub enum Reply {
    Fail,
    Text(Vec<String>),
    Hang,
}

/// In-memory backend answering per model and recording every call.
pub struct ScriptedBackend {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new(replies: Vec<(&str, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.into_iter().map(|(m, r)| (m.to_string(), r)).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A single model `m1` that always answers `text`.
    pub fn always(text: &str) -> Arc<Self> {
        Self::new(vec![("m1", Reply::Text(vec![text.to_string()]))])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn generate(&self, model: &str, _prompt: &str) -> Result<Vec<String>, BackendError> {
        self.calls.lock().unwrap().push(model.to_string());
        match self.replies.get(model) {
            Some(Reply::Text(parts)) => Ok(parts.clone()),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Fail) | None => Err(BackendError::Other(format!("{} unavailable", model))),
        }
    }
}

/// Defaults with the given models, storage off and a short candidate timeout.
pub fn test_config(models: &[&str]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backend.models = models.iter().map(|m| m.to_string()).collect();
    config.backend.candidate_timeout_secs = 5;
    config.storage.enabled = false;
    config
}

#[allow(dead_code)]
pub fn app(config: GatewayConfig, backend: Arc<ScriptedBackend>) -> (Router, Shutdown) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, backend, shutdown.clone());
    (server.router(), shutdown)
}

/// `POST /api/generate` as if sent from `peer`.
#[allow(dead_code)]
pub fn generate_request(body: &str, peer: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
    request
}

#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Start a mock upstream on an ephemeral port that answers every request
/// with `status` and `body`. Returns its address and the raw requests seen.
#[allow(dead_code)]
pub async fn start_mock_upstream(status: u16, body: String) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = log.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request);

                let reason = axum::http::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

/// Read one HTTP/1.1 request: the head, then `Content-Length` bytes of body.
#[allow(dead_code)]
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
