//! Cache generations: versioned partition names and lifecycle state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two partition names owned by one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheNames {
    pub version: String,
    /// Install-time shell assets, `{app}-{version}`.
    pub precache: String,
    /// Opportunistic captures, `{app}-runtime-{version}`.
    pub runtime: String,
}

impl CacheNames {
    pub fn new(app: &str, version: &str) -> Self {
        Self {
            version: version.to_string(),
            precache: format!("{app}-{version}"),
            runtime: format!("{app}-runtime-{version}"),
        }
    }

    /// True for this generation's precache or runtime partition only.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.precache || name == self.runtime
    }
}

/// Lifecycle of a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Installing,
    Installed,
    Activating,
    Active,
    /// Failed install or superseded by a newer generation.
    Redundant,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Installing => "installing",
            GenerationState::Installed => "installed",
            GenerationState::Activating => "activating",
            GenerationState::Active => "active",
            GenerationState::Redundant => "redundant",
        }
    }

    /// Whether an activate event may proceed from this state.
    pub fn can_activate(&self) -> bool {
        matches!(self, GenerationState::Installed | GenerationState::Activating | GenerationState::Active)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationState {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(GenerationState::Installing),
            "installed" => Ok(GenerationState::Installed),
            "activating" => Ok(GenerationState::Activating),
            "active" => Ok(GenerationState::Active),
            "redundant" => Ok(GenerationState::Redundant),
            other => Err(crate::Error::InvalidInput(format!("unknown generation state: {other}"))),
        }
    }
}
