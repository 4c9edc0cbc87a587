//! Core of shellcache, an offline request interceptor for static sites.
//!
//! This crate provides:
//! - SQLite-backed cache generations mirroring the browser cache-storage API
//! - The pure caching policy (`decide`) and the worker adapter around it
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod policy;
pub mod resolve;
pub mod worker;

pub use cache::{Cache, CacheDb, CacheStorage, StoredEntry};
pub use config::{ConfigError, WorkerConfig};
pub use error::Error;
pub use http::{Request, RequestMode, Response};
pub use network::Network;
pub use policy::{Action, CacheState, Classification, Classifier};
pub use worker::{ActivationReport, InstallReport, Intercepted, Outcome, ResponseSource, Worker, WorkerState};
