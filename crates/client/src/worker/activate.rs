//! Activate: purge stale generations and take control of open pages.

use serde::{Deserialize, Serialize};

use safetrack_core::{Error, GenerationState};

use super::CacheController;
use crate::host::Clients;
use crate::network::Network;

/// Result of an activate event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub version: String,
    /// Stale partitions removed by this activation.
    pub deleted: Vec<String>,
    /// Enumeration or deletion errors that were logged and skipped.
    pub failures: usize,
    /// Open pages now controlled.
    pub claimed: usize,
}

impl<N: Network + 'static> CacheController<N> {
    /// Make this generation the serving one.
    ///
    /// Purge failures are logged and counted but never block activation.
    /// Activating an already active generation is a no-op apart from
    /// re-running the purge.
    pub async fn activate(&self, clients: &dyn Clients) -> Result<ActivateReport, Error> {
        let names = &self.config.names;
        let state = self.db.generation_state(&names.version).await?;
        match state {
            Some(state) if state.can_activate() => {}
            other => {
                return Err(Error::InvalidState {
                    version: names.version.clone(),
                    expected: GenerationState::Installed.to_string(),
                    actual: other.map_or_else(|| "uninstalled".to_string(), |s| s.to_string()),
                });
            }
        }

        if state != Some(GenerationState::Active) {
            self.db.set_generation_state(&names.version, GenerationState::Activating).await?;
        }

        let mut deleted = Vec::new();
        let mut failures = 0;
        match self.db.partition_names().await {
            Ok(partitions) => {
                for name in partitions.into_iter().filter(|n| !names.is_current(n)) {
                    match self.db.delete_partition(&name).await {
                        Ok(true) => {
                            tracing::info!(partition = %name, "deleted stale partition");
                            deleted.push(name);
                        }
                        Ok(false) => {}
                        Err(err) => {
                            tracing::warn!(partition = %name, error = %err, "failed to delete stale partition");
                            failures += 1;
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to enumerate partitions");
                failures += 1;
            }
        }

        self.db.mark_active(&names.version).await?;

        let claimed = match clients.claim().await {
            Ok(claimed) => claimed,
            Err(err) => {
                tracing::warn!(error = %err, "failed to claim clients");
                0
            }
        };

        tracing::info!(version = %names.version, deleted = deleted.len(), claimed, "activated");

        Ok(ActivateReport { version: names.version.clone(), deleted, failures, claimed })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{StubNetwork, controller, exec, file_controller, generation, url};
    use super::*;
    use crate::host::MemoryShell;
    use safetrack_core::{Request, Response};

    #[tokio::test]
    async fn test_activate_requires_install() {
        let (controller, _network) = controller(StubNetwork::new()).await;
        let shell = MemoryShell::new();

        let result = controller.activate(&shell).await;
        assert!(matches!(result, Err(Error::InvalidState { ref actual, .. }) if actual == "uninstalled"));
    }

    #[tokio::test]
    async fn test_activate_deletes_previous_generation() {
        let network = StubNetwork::new();
        network.shell();
        let (base, network) = controller(network).await;
        let shell = MemoryShell::new();

        // Spin up v1.0 by hand so it owns both partitions.
        let v10 = generation("v1.0", base.db(), &network);
        v10.install().await.unwrap();
        v10.activate(&shell).await.unwrap();
        let stale = Response::new(url("/app.js").as_str(), 200, "old js");
        v10.db()
            .put("safetrack-runtime-v1.0", &Request::get(url("/app.js")), &stale)
            .await
            .unwrap();
        base.db().open_partition("unrelated-cache").await.unwrap();

        let v11 = generation("v1.1", base.db(), &network);
        v11.install().await.unwrap();
        let report = v11.activate(&shell).await.unwrap();

        assert_eq!(report.failures, 0);
        assert_eq!(report.deleted, vec!["safetrack-v1.0", "safetrack-runtime-v1.0", "unrelated-cache"]);

        let names = v11.db().partition_names().await.unwrap();
        assert!(names.iter().all(|n| !n.ends_with("v1.0")));
        assert_eq!(names, vec!["safetrack-v1.1"]);
        assert_eq!(v11.db().active_generation().await.unwrap().as_deref(), Some("v1.1"));
        assert_eq!(
            v11.db().generation_state("v1.0").await.unwrap(),
            Some(GenerationState::Redundant)
        );
    }

    #[tokio::test]
    async fn test_activate_keeps_current_runtime_partition() {
        let network = StubNetwork::new();
        network.shell();
        let (controller, _network) = controller(network).await;
        let shell = MemoryShell::new();

        controller.install().await.unwrap();
        controller.db().open_partition("safetrack-runtime-v1.1").await.unwrap();

        let report = controller.activate(&shell).await.unwrap();
        assert!(report.deleted.is_empty());
        assert!(controller.db().has_partition("safetrack-runtime-v1.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_twice_is_noop() {
        let network = StubNetwork::new();
        network.shell();
        let (controller, _network) = controller(network).await;
        let shell = MemoryShell::new();

        controller.install().await.unwrap();
        controller.db().open_partition("safetrack-v0.9").await.unwrap();

        let first = controller.activate(&shell).await.unwrap();
        assert_eq!(first.deleted, vec!["safetrack-v0.9"]);

        let before = controller.db().partitions().await.unwrap();
        let second = controller.activate(&shell).await.unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(second.failures, 0);
        assert_eq!(controller.db().partitions().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_activate_claims_open_pages() {
        let network = StubNetwork::new();
        network.shell();
        let (controller, _network) = controller(network).await;
        let shell = MemoryShell::new();
        shell.open("https://safetrack.app/").await;
        shell.open("https://safetrack.app/flights").await;

        controller.install().await.unwrap();
        let report = controller.activate(&shell).await.unwrap();

        assert_eq!(report.claimed, 2);
        assert_eq!(shell.controlled().await, 2);
    }

    #[tokio::test]
    async fn test_activate_counts_failed_deletion_and_proceeds() {
        let network = StubNetwork::new();
        network.shell();
        let (controller, _network, side, _dir) = file_controller(network).await;
        let shell = MemoryShell::new();

        controller.db().open_partition("safetrack-v1.0").await.unwrap();
        controller.db().open_partition("safetrack-v0.9").await.unwrap();
        controller.install().await.unwrap();
        exec(
            &side,
            "CREATE TRIGGER keep_v10 BEFORE DELETE ON partitions WHEN OLD.name = 'safetrack-v1.0'
             BEGIN SELECT RAISE(ABORT, 'partition locked'); END;",
        )
        .await;

        let report = controller.activate(&shell).await.unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.deleted, vec!["safetrack-v0.9"]);
        assert!(controller.db().has_partition("safetrack-v1.0").await.unwrap());
        assert_eq!(controller.db().active_generation().await.unwrap().as_deref(), Some("v1.1"));
    }

    #[tokio::test]
    async fn test_activate_survives_failed_enumeration() {
        let network = StubNetwork::new();
        network.shell();
        let (controller, _network, side, _dir) = file_controller(network).await;
        let shell = MemoryShell::new();
        shell.open("https://safetrack.app/").await;

        controller.install().await.unwrap();
        exec(&side, "DROP TABLE entries; DROP TABLE partitions;").await;

        let report = controller.activate(&shell).await.unwrap();
        assert_eq!(report.failures, 1);
        assert!(report.deleted.is_empty());
        assert_eq!(report.claimed, 1);
        assert_eq!(controller.db().active_generation().await.unwrap().as_deref(), Some("v1.1"));
    }
}
