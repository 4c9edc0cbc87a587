//! The request-interception policy.
//!
//! Everything here is pure: given a request and what is known about the
//! current generation, [`decide`] names the next [`Action`]. When that action
//! involved the network and the network failed, [`after_network_failure`]
//! names the fallback. The `Interceptor` performs the I/O.
//!
//! | Class                | Strategy      | Network failure fallback                    |
//! |----------------------|---------------|---------------------------------------------|
//! | `ExternalAsset`      | cache-first   | empty `200 OK` for the font host, else none |
//! | `ApplicationContent` | network-first | own entry, then shell for navigations       |

use crate::http::Request;

/// Which strategy a request falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Third-party asset host; rarely changes, served cache-first.
    ExternalAsset,
    /// Everything else; served network-first.
    ApplicationContent,
}

/// Host-substring rules deciding [`Classification`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    external_hosts: Vec<String>,
    font_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(external_hosts: Vec<String>, font_hosts: Vec<String>) -> Self {
        Self { external_hosts, font_hosts }
    }

    /// A URL is an external asset if it contains any configured host pattern.
    pub fn classify(&self, request: &Request) -> Classification {
        let url = request.url.as_str();
        if self.external_hosts.iter().any(|p| url.contains(p.as_str())) {
            Classification::ExternalAsset
        } else {
            Classification::ApplicationContent
        }
    }

    /// Whether the URL points at the web-font stylesheet host.
    pub fn is_font_stylesheet(&self, request: &Request) -> bool {
        let url = request.url.as_str();
        self.font_hosts.iter().any(|p| url.contains(p.as_str()))
    }
}

/// What the current generation holds that matters for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheState {
    /// The request's own identity has an entry.
    pub entry_cached: bool,
    /// The offline shell document has an entry.
    pub shell_cached: bool,
}

/// The next step for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Not ours to decide; the host handles the request.
    PassThrough,
    /// Answer with the request's own cached entry.
    ServeFromCache,
    /// Fetch; on success answer and persist a clone.
    FetchThenStore,
    /// Fetch; on success answer and persist a clone, on failure consult the cache.
    FetchWithCacheFallback,
    /// Answer with the cached shell document.
    ServeShellFallback,
    /// Answer with an empty `200 OK`.
    SynthesizeEmpty,
    /// Nothing deliverable; the host's own error handling applies.
    NoFallback,
}

/// First decision for a request.
///
/// Only `GET` is intercepted. External assets are served from cache when an
/// entry exists and fetched otherwise; application content always goes to
/// the network first.
pub fn decide(request: &Request, class: Classification, state: &CacheState) -> Action {
    if !request.is_get() {
        return Action::PassThrough;
    }

    match class {
        Classification::ExternalAsset if state.entry_cached => Action::ServeFromCache,
        Classification::ExternalAsset => Action::FetchThenStore,
        Classification::ApplicationContent => Action::FetchWithCacheFallback,
    }
}

/// Decision after the network failed for a request.
///
/// `state` must describe the generation as observed after the failure.
pub fn after_network_failure(
    request: &Request, class: Classification, state: &CacheState, classifier: &Classifier,
) -> Action {
    if !request.is_get() {
        return Action::PassThrough;
    }

    match class {
        Classification::ExternalAsset if classifier.is_font_stylesheet(request) => Action::SynthesizeEmpty,
        Classification::ExternalAsset => Action::NoFallback,
        Classification::ApplicationContent if state.entry_cached => Action::ServeFromCache,
        Classification::ApplicationContent if request.is_navigation() && state.shell_cached => {
            Action::ServeShellFallback
        }
        Classification::ApplicationContent => Action::NoFallback,
    }
}
