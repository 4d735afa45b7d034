//! Install: populate the precache partition from the shell manifest.

use serde::{Deserialize, Serialize};

use safetrack_core::{Error, GenerationState, Request};

use super::CacheController;
use crate::network::Network;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub version: String,
    pub partition: String,
    pub precached: usize,
    /// The host may activate right away instead of waiting for old pages to close.
    pub skip_waiting: bool,
}

impl<N: Network + 'static> CacheController<N> {
    /// Fetch every manifest URL and store them in one transaction.
    ///
    /// Any transport failure or non-2xx status fails the whole install and
    /// nothing is written. A failed install never touches the active
    /// generation.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let names = &self.config.names;
        let previous = self.db.generation_state(&names.version).await?;
        let reinstall = previous == Some(GenerationState::Active);

        // Reinstalling the serving generation refreshes its shell in place.
        if !reinstall {
            self.db.set_generation_state(&names.version, GenerationState::Installing).await?;
        }
        tracing::info!(version = %names.version, partition = %names.precache, "installing");

        match self.precache().await {
            Ok(precached) => {
                if !reinstall {
                    self.db.set_generation_state(&names.version, GenerationState::Installed).await?;
                }
                tracing::info!(version = %names.version, precached, "installed");
                Ok(InstallReport {
                    version: names.version.clone(),
                    partition: names.precache.clone(),
                    precached,
                    skip_waiting: true,
                })
            }
            Err(err) => {
                tracing::warn!(version = %names.version, error = %err, "install failed");
                if !reinstall
                    && let Err(mark_err) =
                        self.db.set_generation_state(&names.version, GenerationState::Redundant).await
                {
                    tracing::warn!(version = %names.version, error = %mark_err, "could not mark generation redundant");
                }
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let mut batch = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let request = Request::get(self.resolve(path)?);
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed { url: path.clone(), reason: e.to_string() })?;
            if !response.is_ok() {
                return Err(Error::InstallFailed { url: path.clone(), reason: format!("status {}", response.status) });
            }
            batch.push((request, response));
        }
        self.db.put_all(&self.config.names.precache, batch).await
    }
}
