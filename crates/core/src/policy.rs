//! Request classification.
//!
//! Classification is a pure function of the request shape and the app scope;
//! executing the chosen policy is the controller's job.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::request::{Request, RequestMode};

/// Caching policy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Not intercepted; the host performs its default fetch.
    Bypass,
    /// Network first, then cache, then the app shell.
    Navigation,
    /// Cache first with background revalidation.
    StaticAsset,
    /// Network first, cache fallback, no write-back.
    Default,
}

/// The app origin and the path markers that are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub origin: Url,
    pub bypass_markers: Vec<String>,
}

impl Scope {
    pub fn new(origin: Url, bypass_markers: Vec<String>) -> Self {
        Self { origin, bypass_markers }
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn is_bypassed_path(&self, url: &Url) -> bool {
        let path = url.path();
        self.bypass_markers.iter().any(|marker| path.contains(marker.as_str()))
    }
}

/// Classify a request into exactly one policy.
pub fn classify(request: &Request, scope: &Scope) -> Policy {
    if !scope.is_same_origin(&request.url) {
        return Policy::Bypass;
    }
    if scope.is_bypassed_path(&request.url) {
        return Policy::Bypass;
    }
    // Only GET responses can be stored, so nothing else is worth intercepting.
    if !request.is_get() {
        return Policy::Bypass;
    }
    if request.mode == RequestMode::Navigate {
        return Policy::Navigation;
    }
    if request.destination.is_static_asset() {
        return Policy::StaticAsset;
    }
    Policy::Default
}
