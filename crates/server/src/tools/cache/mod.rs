//! Cache-related MCP tools.
//!
//! This module provides read-only tools for inspecting cache generations.

pub mod keys;
pub mod lookup;

pub use keys::{CacheKeysParams, keys_impl};
pub use lookup::{CacheMatchParams, match_impl};
