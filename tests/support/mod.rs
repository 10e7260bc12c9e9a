//! In-process fake tournament API used by the integration tests.
//!
//! Responses are scripted: each enqueued reply answers exactly one request,
//! in arrival order. Requests are recorded with their pair-code header so
//! tests can assert what actually went over the wire, and the whole server
//! can be held to keep requests in flight while concurrency is observed.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc, watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Route client diagnostics to the test output; `RUST_LOG` filters as usual.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// One request the fake server saw.
#[derive(Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Value of the `X-tichu-pair-code` header, when present.
    pub pair_code: Option<String>,
    /// JSON request body, when there was one.
    pub body: Option<serde_json::Value>,
}

struct ScriptedResponse {
    status: StatusCode,
    body: Option<(&'static str, String)>,
}

impl IntoResponse for ScriptedResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some((content_type, body)) => {
                (self.status, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
            None => self.status.into_response(),
        }
    }
}

#[derive(Clone)]
struct ServerState {
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: mpsc::UnboundedSender<RecordedRequest>,
    release: watch::Receiver<bool>,
    hits: Arc<AtomicUsize>,
}

/// Fake tournament API bound to an OS-assigned port.
pub struct FakeApi {
    /// Base URL clients should be pointed at.
    pub base_url: String,
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: mpsc::UnboundedReceiver<RecordedRequest>,
    release: watch::Sender<bool>,
    hits: Arc<AtomicUsize>,
}

impl FakeApi {
    /// Start a fake API on a fresh port.
    pub async fn spawn() -> Result<Self> {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("binding fake API listener")?;
        let addr = listener.local_addr().context("fake API local addr")?;
        let script = Arc::new(Mutex::new(VecDeque::new()));
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (release_tx, release_rx) = watch::channel(true);
        let hits = Arc::new(AtomicUsize::new(0));
        let state = ServerState {
            script: Arc::clone(&script),
            requests: request_tx,
            release: release_rx,
            hits: Arc::clone(&hits),
        };
        let app = Router::new().fallback(handle_any).with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            base_url: format!("http://{addr}"),
            script,
            requests: request_rx,
            release: release_tx,
            hits,
        })
    }

    /// Queue a JSON reply.
    pub async fn enqueue_json(&self, status: StatusCode, body: serde_json::Value) {
        self.script.lock().await.push_back(ScriptedResponse {
            status,
            body: Some(("application/json", body.to_string())),
        });
    }

    /// Queue a plain-text reply.
    pub async fn enqueue_text(&self, status: StatusCode, body: &str) {
        self.script.lock().await.push_back(ScriptedResponse {
            status,
            body: Some(("text/plain", body.to_owned())),
        });
    }

    /// Queue a bodyless reply, e.g. a 204.
    pub async fn enqueue_empty(&self, status: StatusCode) {
        self.script
            .lock()
            .await
            .push_back(ScriptedResponse { status, body: None });
    }

    /// Keep every handler waiting until [`release`](Self::release) is called.
    ///
    /// Requests are still recorded on arrival, so tests can wait for a
    /// request to be in flight before issuing the next one.
    pub fn hold(&self) {
        let _ = self.release.send(false);
    }

    /// Let held handlers answer.
    pub fn release(&self) {
        let _ = self.release.send(true);
    }

    /// Next recorded request, in arrival order.
    pub async fn next_request(&mut self) -> RecordedRequest {
        self.requests.recv().await.expect("fake API went away")
    }

    /// Requests seen so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn handle_any(State(state): State<ServerState>, request: Request) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let pair_code = request
        .headers()
        .get("X-tichu-pair-code")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let body = serde_json::from_slice(&bytes).ok();

    state.hits.fetch_add(1, Ordering::SeqCst);
    let _ = state.requests.send(RecordedRequest {
        method,
        path,
        pair_code,
        body,
    });

    let mut release = state.release.clone();
    let _ = release.wait_for(|released| *released).await;

    match state.script.lock().await.pop_front() {
        Some(scripted) => scripted.into_response(),
        None => (StatusCode::NOT_FOUND, "no scripted response").into_response(),
    }
}
