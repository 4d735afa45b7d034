//! Fetch interception and the per-policy strategies.
//!
//! | Policy | Strategy |
//! |---|---|
//! | Bypass | not intercepted |
//! | Navigation | network, write-through to runtime; else cache; else app shell |
//! | StaticAsset | cache with background revalidation; else network, write-through |
//! | Default | network; else cache; no write-back |
//!
//! A request with no live response and no cached fallback fails with
//! [`Error::NoResponse`]. No placeholder response is ever synthesized.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use safetrack_core::{CachedEntry, Error, Policy, Request, Response, classify};

use super::CacheController;
use crate::network::Network;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
    /// The cached app root, served for an offline navigation.
    AppShell,
}

/// A response chosen by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
    /// Partition the response was read from, for cache sources.
    pub partition: Option<String>,
}

impl Served {
    fn network(response: Response) -> Self {
        Self { response, source: Source::Network, partition: None }
    }

    fn cached(entry: CachedEntry, source: Source) -> Self {
        Self { response: entry.response, source, partition: Some(entry.partition) }
    }
}

/// Outcome of intercepting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Not handled; the host performs its default network fetch.
    Passthrough,
    Respond(Served),
}

impl<N: Network + 'static> CacheController<N> {
    /// Classify the request and apply its policy.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Intercept, Error> {
        let policy = classify(request, &self.config.scope);
        tracing::debug!(url = %request.url, mode = %request.mode, ?policy, "fetch");

        let served = match policy {
            Policy::Bypass => return Ok(Intercept::Passthrough),
            Policy::Navigation => self.network_first_with_shell(request).await?,
            Policy::StaticAsset => self.cache_first(request).await?,
            Policy::Default => self.network_first(request).await?,
        };

        Ok(Intercept::Respond(served))
    }

    async fn network_first_with_shell(&self, request: &Request) -> Result<Served, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => {
                self.write_through(request, &response).await;
                return Ok(Served::network(response));
            }
            Err(err) => err,
        };

        tracing::debug!(url = %request.url, error = %err, "navigation offline");
        if let Some(entry) = self.lookup(request).await {
            return Ok(Served::cached(entry, Source::Cache));
        }

        let shell = Request::get(self.resolve(&self.config.app_shell)?);
        if let Some(entry) = self.lookup(&shell).await {
            return Ok(Served::cached(entry, Source::AppShell));
        }

        Err(Error::NoResponse(format!("{}: {}", request.url, err)))
    }

    async fn cache_first(&self, request: &Request) -> Result<Served, Error> {
        if let Some(entry) = self.lookup(request).await {
            tracing::debug!(url = %request.url, partition = %entry.partition, "cache hit");
            self.revalidate(request.clone()).await;
            return Ok(Served::cached(entry, Source::Cache));
        }

        tracing::debug!(url = %request.url, "cache miss");
        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| Error::NoResponse(format!("{}: {}", request.url, e)))?;
        self.write_through(request, &response).await;
        Ok(Served::network(response))
    }

    async fn network_first(&self, request: &Request) -> Result<Served, Error> {
        match self.network.fetch(request).await {
            Ok(response) => Ok(Served::network(response)),
            Err(err) => match self.lookup(request).await {
                Some(entry) => Ok(Served::cached(entry, Source::Cache)),
                None => Err(Error::NoResponse(format!("{}: {}", request.url, err))),
            },
        }
    }

    /// Cache lookup: this generation's runtime partition first, then every
    /// partition in creation order. Storage errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<CachedEntry> {
        let found = match self.db.match_in(&self.config.names.runtime, request).await {
            Ok(Some(entry)) => Ok(Some(entry)),
            Ok(None) => self.db.match_any(request).await,
            Err(err) => Err(err),
        };
        match found {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "cache lookup failed");
                None
            }
        }
    }

    /// Store a copy in the runtime partition before the response is returned.
    async fn write_through(&self, request: &Request, response: &Response) {
        if !response.is_cacheable() {
            return;
        }
        if let Err(err) = self.db.put(&self.config.names.runtime, request, response).await {
            tracing::warn!(url = %request.url, error = %err, "runtime cache write failed");
        }
    }

    /// Refresh the runtime entry in the background. Failures are swallowed.
    async fn revalidate(&self, request: Request) {
        let network = Arc::clone(&self.network);
        let db = self.db.clone();
        let partition = self.config.names.runtime.clone();

        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            match network.fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    if let Err(err) = db.put(&partition, &request, &response).await {
                        tracing::debug!(url = %request.url, error = %err, "revalidation write failed");
                    }
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "revalidation not cacheable");
                }
                Err(err) => {
                    tracing::debug!(url = %request.url, error = %err, "revalidation failed");
                }
            }
        });
    }
}
