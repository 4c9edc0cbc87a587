//! Worker fixtures for tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shellcache_core::{CacheDb, CacheStorage, Error, Network, Request, Response, Worker, WorkerConfig};

/// Start of a JFIF file; not valid UTF-8.
pub const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];

/// Serves `<body of PATH>` for every URL, or [`JPEG_BYTES`] for `.jpg`
/// paths, until switched off.
#[derive(Default)]
pub struct EchoNetwork {
    offline: AtomicBool,
}

impl EchoNetwork {
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Network for EchoNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        if request.url.path().ends_with(".jpg") {
            return Ok(Response::new(200, JPEG_BYTES).with_header("content-type", "image/jpeg"));
        }
        Ok(Response::new(200, format!("body of {}", request.url.path())).with_header("content-type", "text/html"))
    }
}

pub type TestWorker = Worker<Arc<EchoNetwork>>;

pub async fn worker(tag: &str) -> (TestWorker, Arc<EchoNetwork>) {
    let storage = CacheStorage::new(CacheDb::open_in_memory().await.unwrap());
    worker_on(tag, storage)
}

/// A worker for `tag` sharing an existing store.
pub fn worker_on(tag: &str, storage: CacheStorage) -> (TestWorker, Arc<EchoNetwork>) {
    let network = Arc::new(EchoNetwork::default());
    let config = WorkerConfig::new(tag, &["/", "/index.html"]);
    (Worker::new(config, storage, network.clone()).unwrap(), network)
}

/// Parse the JSON text content of a tool result.
pub fn output(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
