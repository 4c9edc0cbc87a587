//! SQLite-backed cache generations.
//!
//! Mirrors the browser cache-storage API: a [`CacheStorage`] holds named
//! generations, each generation is a [`Cache`] mapping request identities to
//! response snapshots. It provides:
//!
//! - Idempotent open-or-create of a generation by name
//! - Content-addressed entry keys using SHA-256
//! - All-or-nothing manifest population in one transaction
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod generation;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use generation::{Cache, StoredEntry};
pub use storage::CacheStorage;
