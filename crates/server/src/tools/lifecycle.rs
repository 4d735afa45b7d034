//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use safetrack_client::{ActivateReport, CacheController, Clients, InstallReport, Network};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    pub install: InstallReport,
    /// Present when the install asked to skip waiting and activation ran.
    pub activation: Option<ActivateReport>,
}

/// Install the configured generation; activate it right away when the
/// install signals skip-waiting.
pub async fn install_impl<N: Network + 'static>(
    controller: &CacheController<N>, clients: &dyn Clients,
) -> Result<CallToolResult, McpError> {
    let install = controller.install().await?;
    let activation = if install.skip_waiting { Some(controller.activate(clients).await?) } else { None };

    json_result(&InstallOutput { install, activation })
}

pub async fn activate_impl<N: Network + 'static>(
    controller: &CacheController<N>, clients: &dyn Clients,
) -> Result<CallToolResult, McpError> {
    let report = controller.activate(clients).await?;
    json_result(&report)
}
