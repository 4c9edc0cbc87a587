//! Network client for shellcache.
//!
//! This crate provides the reqwest-backed implementation of the worker's
//! `Network` seam, used by the server binary.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
