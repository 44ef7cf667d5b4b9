//! Shared fixtures: a local worker speaking the inference protocol and a
//! mocked provisioning API pointing at it.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vizion::VizionClient;

pub const API_KEY: &str = "vz_test_key";
pub const SESSION_ID: &str = "sess_e2e";

/// What the worker saw on its socket.
#[derive(Debug, Default)]
pub struct WorkerRecord {
    pub binary: Vec<Vec<u8>>,
    pub text: Vec<String>,
}

/// A running local worker.
pub struct Worker {
    pub ws_url: String,
    pub record: Arc<Mutex<WorkerRecord>>,
    done_rx: oneshot::Receiver<()>,
}

impl Worker {
    /// Waits until the worker connection has ended.
    pub async fn finished(self) -> Arc<Mutex<WorkerRecord>> {
        let _ = tokio::time::timeout(Duration::from_secs(5), self.done_rx).await;
        self.record
    }
}

/// Starts a single-connection worker answering binary requests with
/// `reply(request)`; `None` leaves the request unanswered.
pub async fn spawn_worker<F>(reply: F) -> Worker
where
    F: Fn(&[u8]) -> Option<Value> + Send + 'static,
{
    spawn_slow_worker(Duration::ZERO, reply).await
}

/// Like [`spawn_worker`], but every reply is sent `delay` late.
pub async fn spawn_slow_worker<F>(delay: Duration, reply: F) -> Worker
where
    F: Fn(&[u8]) -> Option<Value> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let record = Arc::new(Mutex::new(WorkerRecord::default()));
    let (done_tx, done_rx) = oneshot::channel();

    let task_record = Arc::clone(&record);
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(stream).await.expect("handshake");

        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Binary(bytes) => {
                    let body = reply(&bytes);
                    task_record.lock().binary.push(bytes.to_vec());
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    if let Some(body) = body
                        && ws.send(Message::text(body.to_string())).await.is_err()
                    {
                        break;
                    }
                }
                Message::Text(text) => {
                    let text = text.to_string();
                    let shutdown = text == "shutdown";
                    task_record.lock().text.push(text);
                    if shutdown {
                        let _ = ws.close(None).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        let _ = done_tx.send(());
    });

    Worker {
        ws_url: format!("ws://127.0.0.1:{port}/ws"),
        record,
        done_rx,
    }
}

/// Mounts a provisioning API that grants a session on `ws_url`.
pub async fn provisioning_api(ws_url: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/connect"))
        .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": SESSION_ID,
            "ws_url": ws_url,
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

/// Builds a client against `api`.
pub fn client(api: &MockServer, model: &str) -> VizionClient {
    VizionClient::builder()
        .api_key(API_KEY)
        .api_url(api.uri())
        .model(model)
        .build()
        .expect("client")
}

/// Canned segmentation reply with one instance per prompt.
pub fn segmentation_reply(prompts: &[String]) -> Value {
    let results: Vec<Value> = prompts
        .iter()
        .enumerate()
        .map(|(i, prompt)| {
            let offset = i as f64 * 10.0;
            json!({
                "prompt": prompt,
                "instances": [{
                    "x1": 10.0 + offset,
                    "y1": 20.0 + offset,
                    "x2": 110.0 + offset,
                    "y2": 220.0 + offset,
                    "confidence": 0.9,
                    "mask_rle": [3, 3, 3],
                    "mask_height": 3,
                    "mask_width": 3
                }]
            })
        })
        .collect();

    json!({
        "results": results,
        "decode_ms": 1.5,
        "vision_encode_ms": 9.0,
        "text_encode_ms": 2.0,
        "decode_segment_ms": 4.5
    })
}

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
