//! The network seam.
//!
//! The worker never talks to the network directly; it goes through a
//! [`Network`] so the policy can be exercised against scripted fakes and
//! the real client lives in `shellcache-client`.

use std::sync::Arc;

use crate::Error;
use crate::http::{Request, Response};

/// Fetch-by-request.
///
/// Implementations resolve with whatever response the server produced,
/// including non-2xx statuses, and fail only when no response arrived.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
