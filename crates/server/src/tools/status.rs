//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use safetrack_client::{CacheController, Network};

use super::json_result;

pub async fn status_impl<N: Network + 'static>(controller: &CacheController<N>) -> Result<CallToolResult, McpError> {
    let status = controller.status().await?;
    json_result(&status)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{controller, output};
    use super::*;
    use safetrack_client::{ControllerStatus, MemoryShell};
    use safetrack_core::GenerationState;

    #[tokio::test]
    async fn test_status_after_install() {
        let controller = controller().await;
        controller.install().await.unwrap();
        controller.activate(&MemoryShell::new()).await.unwrap();

        let result = status_impl(&controller).await.unwrap();
        let status: ControllerStatus = output(&result);

        assert_eq!(status.state, Some(GenerationState::Active));
        assert_eq!(status.active_generation.as_deref(), Some("v1.1"));
        assert_eq!(status.partitions.len(), 1);
        assert_eq!(status.partitions[0].entries, 4);
        assert_eq!(status.schema_version, 2);
    }
}
