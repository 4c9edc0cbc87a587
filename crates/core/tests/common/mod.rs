//! Scripted network shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use shellcache_core::{CacheDb, CacheStorage, Error, Network, Request, Response, Worker, WorkerConfig};

/// A network answering from a fixed route table.
///
/// Unknown URLs answer 404. While offline every fetch fails.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, body: &str) -> Self {
        self.set(url, Response::new(200, body.to_string()));
        self
    }

    pub fn set(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(request.url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let response = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub const ORIGIN: &str = "http://localhost:8080";

pub fn url(path: &str) -> url::Url {
    url::Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// The site used across tests: three first-party files and three
/// third-party assets.
pub fn site() -> ScriptedNetwork {
    ScriptedNetwork::new()
        .route("http://localhost:8080/", "<html>root</html>")
        .route("http://localhost:8080/index.html", "<html>shell</html>")
        .route("http://localhost:8080/img/img1.jpg", "jpeg-bytes")
        .route("https://fonts.googleapis.com/css2?family=Inter", "@font-face{}")
        .route("https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css", ".fa{}")
        .route("https://cdn.socket.io/4.7.2/socket.io.min.js", "io()")
}

pub fn config(tag: &str) -> WorkerConfig {
    WorkerConfig { origin: ORIGIN.into(), ..WorkerConfig::new(tag, &["/", "/index.html", "/img/img1.jpg"]) }
}

pub async fn storage() -> CacheStorage {
    CacheStorage::new(CacheDb::open_in_memory().await.unwrap())
}

pub fn worker(tag: &str, storage: &CacheStorage, network: std::sync::Arc<ScriptedNetwork>) -> Worker<std::sync::Arc<ScriptedNetwork>> {
    Worker::new(config(tag), storage.clone(), network).unwrap()
}
