//! The offline worker: install, fetch and activate handlers bound to one
//! configuration.
//!
//! ### Lifecycle
//! - `install` opens the generation named by `cache_name` and stores the
//!   manifest, all-or-nothing.
//! - `handle_fetch` runs for every intercepted request.
//! - `activate` deletes every generation except the current one.
//!
//! The host decides when each event fires; the worker only records the
//! resulting [`WorkerState`].

pub mod activate;
pub mod install;
pub mod intercept;
pub mod persist;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

pub use activate::{ActivationReport, Activator};
pub use install::{InstallReport, Installer};
pub use intercept::{Intercepted, Interceptor, Outcome, ResponseSource};
pub use persist::PersistHandle;

use crate::Error;
use crate::cache::CacheStorage;
use crate::config::WorkerConfig;
use crate::http::Request;
use crate::network::Network;
use crate::policy::Classifier;

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// The last install failed; a new install attempt is needed.
    Redundant,
}

/// The three handlers sharing one configuration, store and network.
pub struct Worker<N> {
    config: WorkerConfig,
    storage: CacheStorage,
    installer: Installer<N>,
    interceptor: Interceptor<N>,
    activator: Activator,
    state: RwLock<WorkerState>,
}

impl<N: Network> Worker<N> {
    /// Build a worker, resolving the manifest and shell URLs against the
    /// configured origin.
    pub fn new(config: WorkerConfig, storage: CacheStorage, network: N) -> Result<Self, Error> {
        let network = Arc::new(network);

        let manifest = config
            .manifest_urls
            .iter()
            .map(|u| config.resolve(u).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;
        let shell = Request::navigate(config.resolve(&config.shell_url)?);
        let classifier = Classifier::new(config.external_host_patterns.clone(), config.font_host_patterns.clone());

        Ok(Self {
            installer: Installer::new(storage.clone(), network.clone(), config.cache_name.clone(), manifest),
            interceptor: Interceptor::new(storage.clone(), network, config.cache_name.clone(), classifier, shell),
            activator: Activator::new(storage.clone(), config.cache_name.clone()),
            state: RwLock::new(WorkerState::Parsed),
            storage,
            config,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Resolve a possibly root-relative URL against the site origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(self.config.resolve(input)?)
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        tracing::debug!(generation = %self.config.cache_name, ?state, "worker state changed");
    }

    /// Install event. Completes only after the manifest has been stored.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing).await;
        let result = self.installer.install().await;
        let next = if result.is_ok() { WorkerState::Installed } else { WorkerState::Redundant };
        self.set_state(next).await;
        result
    }

    /// Activate event. Completes only after stale generations are deleted.
    ///
    /// A freshly built worker may activate a generation installed by an
    /// earlier run, provided every manifest entry is already stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if no install has succeeded yet.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let current = self.state().await;
        let installed = match current {
            WorkerState::Installed | WorkerState::Activated => true,
            WorkerState::Parsed => self.installer.is_installed().await?,
            WorkerState::Installing | WorkerState::Activating | WorkerState::Redundant => false,
        };
        if !installed {
            return Err(Error::InvalidInput(format!("cannot activate a worker in state {current:?}")));
        }

        self.set_state(WorkerState::Activating).await;
        let result = self.activator.activate().await;
        let next = if result.is_ok() { WorkerState::Activated } else { WorkerState::Installed };
        self.set_state(next).await;
        result
    }

    /// Fetch event.
    pub async fn handle_fetch(&self, request: Request) -> Intercepted {
        self.interceptor.handle(request).await
    }
}
