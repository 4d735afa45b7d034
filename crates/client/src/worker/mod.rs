//! The offline cache controller.
//!
//! The host drives the controller with lifecycle events:
//!
//! - `install`: precache the shell manifest into the generation's precache
//!   partition, all or nothing.
//! - `activate`: delete every partition that is not current, mark the
//!   generation active, claim open pages.
//! - `fetch`: classify the request and apply its policy.
//! - `push` / `notificationclick`: show an alert, focus or open its target.
//!
//! All durable state lives in [`CacheDb`]; the controller holds nothing that
//! must survive a restart. Background work spawned while handling a fetch is
//! tracked and joined by [`CacheController::settle`].

mod activate;
mod fetch;
mod install;
mod push;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use safetrack_core::{
    CacheDb, CacheNames, Error, GenerationState, NotificationConfig, PartitionInfo, Scope, WorkerConfig, origin,
};

use crate::network::Network;

pub use activate::ActivateReport;
pub use fetch::{Intercept, Served, Source};
pub use install::InstallReport;
pub use push::ClickOutcome;

/// Everything the controller needs to know about its generation.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub names: CacheNames,
    pub scope: Scope,
    /// Paths fetched at install time.
    pub precache: Vec<String>,
    /// Offline fallback for navigations.
    pub app_shell: String,
    pub notification: NotificationConfig,
}

impl ControllerConfig {
    pub fn from_worker_config(config: &WorkerConfig) -> Result<Self, Error> {
        let scope = config.scope().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            names: config.cache_names(),
            scope,
            precache: config.precache.clone(),
            app_shell: config.app_shell.clone(),
            notification: config.notification.clone(),
        })
    }
}

/// Snapshot of the controller's durable state.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ControllerStatus {
    pub names: CacheNames,
    /// State of this controller's generation, if it was ever installed.
    pub state: Option<GenerationState>,
    /// Generation currently serving, which may be an older one.
    pub active_generation: Option<String>,
    pub partitions: Vec<PartitionInfo>,
    /// Schema version of the partition store.
    pub schema_version: i64,
}

/// Route-classified cache controller.
pub struct CacheController<N> {
    config: ControllerConfig,
    db: CacheDb,
    network: Arc<N>,
    pending: Mutex<JoinSet<()>>,
}

impl<N: Network + 'static> CacheController<N> {
    pub fn new(config: ControllerConfig, db: CacheDb, network: Arc<N>) -> Self {
        Self { config, db, network, pending: Mutex::new(JoinSet::new()) }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Resolve a configured path or a page-supplied URL against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(origin::resolve(&self.config.scope.origin, input)?)
    }

    /// Wait for every background task spawned so far.
    ///
    /// Hosts call this before tearing the controller down. Returns the
    /// number of tasks joined.
    pub async fn settle(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.pending.lock().await);
        let mut settled = 0;
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "background task did not complete");
            }
            settled += 1;
        }
        settled
    }

    pub async fn status(&self) -> Result<ControllerStatus, Error> {
        Ok(ControllerStatus {
            names: self.config.names.clone(),
            state: self.db.generation_state(&self.config.names.version).await?,
            active_generation: self.db.active_generation().await?,
            partitions: self.db.partitions().await?,
            schema_version: self.db.schema_version().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{StubNetwork, controller};
    use super::*;

    #[test]
    fn test_config_from_worker_config() {
        let config = ControllerConfig::from_worker_config(&WorkerConfig::default()).unwrap();
        assert_eq!(config.names.precache, "safetrack-v1.1");
        assert_eq!(config.app_shell, "/");
        assert_eq!(config.precache.len(), 4);
    }

    #[test]
    fn test_config_rejects_bad_origin() {
        let worker = WorkerConfig { origin: "not a url".into(), ..Default::default() };
        assert!(ControllerConfig::from_worker_config(&worker).is_err());
    }

    #[tokio::test]
    async fn test_status_before_install() {
        let (controller, _network) = controller(StubNetwork::new()).await;
        let status = controller.status().await.unwrap();

        assert_eq!(status.names.version, "v1.1");
        assert!(status.state.is_none());
        assert!(status.active_generation.is_none());
        assert!(status.partitions.is_empty());
        assert_eq!(status.schema_version, 2);
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending() {
        let (controller, _network) = controller(StubNetwork::new()).await;
        assert_eq!(controller.settle().await, 0);
    }

    #[test]
    fn test_resolve_against_origin() {
        let config = ControllerConfig::from_worker_config(&WorkerConfig::default()).unwrap();
        let url = origin::resolve(&config.scope.origin, "/earthquakes#top").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5173/earthquakes");
    }
}
