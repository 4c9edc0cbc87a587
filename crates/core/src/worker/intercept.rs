//! Fetch handler: the adapter that carries out policy actions.
//!
//! [`policy::decide`] and [`policy::after_network_failure`] pick the action;
//! this module performs the lookups, fetches and background writes it
//! needs. Storage errors are logged and treated as misses so every request
//! reaches a defined [`Outcome`].

use std::sync::Arc;

use serde::Serialize;

use super::persist::PersistHandle;
use crate::cache::{Cache, CacheStorage};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::policy::{self, Action, CacheState, Classification, Classifier};

/// Where a delivered response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The offline shell document stood in for the requested URL.
    Shell,
    Synthesized,
}

/// Final result of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not intercepted; the host handles the request itself.
    PassThrough,
    /// Deliver this response.
    Respond { response: Response, source: ResponseSource },
    /// Every fallback was exhausted; the host shows its own network error.
    NoFallback { reason: String },
}

impl Outcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Respond { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Outcome::Respond { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// An outcome plus the background write it started, if any.
#[derive(Debug)]
pub struct Intercepted {
    pub classification: Classification,
    /// The last action the policy chose.
    pub action: Action,
    pub outcome: Outcome,
    pub persist: Option<PersistHandle>,
}

/// Applies cache-first or network-first to each intercepted request.
pub struct Interceptor<N> {
    storage: CacheStorage,
    network: Arc<N>,
    cache_name: String,
    classifier: Classifier,
    shell: Request,
}

impl<N: Network> Interceptor<N> {
    pub fn new(
        storage: CacheStorage, network: Arc<N>, cache_name: String, classifier: Classifier, shell: Request,
    ) -> Self {
        Self { storage, network, cache_name, classifier, shell }
    }

    /// Handle one intercepted request.
    pub async fn handle(&self, request: Request) -> Intercepted {
        let class = self.classifier.classify(&request);

        if !request.is_get() {
            return self.finish(class, Action::PassThrough, Outcome::PassThrough, None);
        }

        let cache = self.storage.cache(&self.cache_name);
        let state = self.observe(&cache, &request).await;
        let action = policy::decide(&request, class, &state);
        tracing::debug!(url = %request.url, ?class, ?action, "intercepted request");

        match action {
            Action::PassThrough => self.finish(class, action, Outcome::PassThrough, None),
            Action::ServeFromCache => match self.lookup(&cache, &request).await {
                Some(response) => {
                    self.finish(class, action, Outcome::Respond { response, source: ResponseSource::Cache }, None)
                }
                // the entry vanished between probe and read
                None => self.fetch(&cache, request, class, Action::FetchThenStore).await,
            },
            Action::FetchThenStore | Action::FetchWithCacheFallback => self.fetch(&cache, request, class, action).await,
            other => self.fall_back(&cache, &request, class, other, "no network attempt".into()).await,
        }
    }

    async fn fetch(&self, cache: &Cache, request: Request, class: Classification, action: Action) -> Intercepted {
        match self.network.fetch(&request).await {
            Ok(response) => {
                let persist = PersistHandle::spawn(
                    self.storage.clone(),
                    self.cache_name.clone(),
                    request,
                    response.clone(),
                );
                self.finish(
                    class,
                    action,
                    Outcome::Respond { response, source: ResponseSource::Network },
                    Some(persist),
                )
            }
            Err(e) => {
                if e.is_network() {
                    tracing::debug!(url = %request.url, error = %e, "network fetch failed");
                } else {
                    tracing::warn!(url = %request.url, error = %e, "fetch rejected before reaching the network");
                }
                let state = match class {
                    // cache-first already missed; no second lookup
                    Classification::ExternalAsset => CacheState::default(),
                    Classification::ApplicationContent => self.observe(cache, &request).await,
                };
                let fallback = policy::after_network_failure(&request, class, &state, &self.classifier);
                self.fall_back(cache, &request, class, fallback, e.to_string()).await
            }
        }
    }

    async fn fall_back(
        &self, cache: &Cache, request: &Request, class: Classification, action: Action, reason: String,
    ) -> Intercepted {
        let outcome = match action {
            Action::PassThrough => Outcome::PassThrough,
            Action::ServeFromCache => match self.lookup(cache, request).await {
                Some(response) => Outcome::Respond { response, source: ResponseSource::Cache },
                None => Outcome::NoFallback { reason },
            },
            Action::ServeShellFallback => match self.lookup(cache, &self.shell).await {
                Some(response) => Outcome::Respond { response, source: ResponseSource::Shell },
                None => Outcome::NoFallback { reason },
            },
            Action::SynthesizeEmpty => Outcome::Respond { response: Response::empty_ok(), source: ResponseSource::Synthesized },
            Action::NoFallback | Action::FetchThenStore | Action::FetchWithCacheFallback => {
                Outcome::NoFallback { reason }
            }
        };

        if let Outcome::NoFallback { reason } = &outcome {
            tracing::info!(url = %request.url, %reason, "no fallback for request");
        }

        self.finish(class, action, outcome, None)
    }

    async fn observe(&self, cache: &Cache, request: &Request) -> CacheState {
        CacheState {
            entry_cached: self.contains(cache, request).await,
            shell_cached: request.is_navigation() && self.contains(cache, &self.shell).await,
        }
    }

    async fn contains(&self, cache: &Cache, request: &Request) -> bool {
        cache.contains(request).await.unwrap_or_else(|e| {
            tracing::warn!(url = %request.url, error = %e, "cache probe failed");
            false
        })
    }

    async fn lookup(&self, cache: &Cache, request: &Request) -> Option<Response> {
        cache.match_request(request).await.unwrap_or_else(|e| {
            tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
            None
        })
    }

    fn finish(
        &self, classification: Classification, action: Action, outcome: Outcome, persist: Option<PersistHandle>,
    ) -> Intercepted {
        Intercepted { classification, action, outcome, persist }
    }
}
