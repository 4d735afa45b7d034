//! sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use safetrack_client::{CacheController, MemoryShell, Network, ShownNotification};
use safetrack_core::Error;

use super::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push data, normally JSON `{"title", "message", "url"}`.
    /// Omit to simulate a push without payload.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Output from the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    /// The displayed notification, absent when the push was ignored.
    pub notification: Option<ShownNotification>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id returned by sw_push.
    pub id: u64,
}

pub async fn push_impl<N: Network + 'static>(
    controller: &CacheController<N>, shell: &MemoryShell, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    let notification = controller.handle_push(params.payload.as_deref().map(str::as_bytes), shell).await?;
    json_result(&SwPushOutput { notification })
}

pub async fn click_impl<N: Network + 'static>(
    controller: &CacheController<N>, shell: &MemoryShell, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let shown = shell
        .notification(params.id)
        .await
        .ok_or_else(|| Error::NotFound(format!("notification {}", params.id)))?;

    let outcome = controller.handle_notification_click(&shown, shell, shell).await?;
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{controller, output};
    use super::*;
    use safetrack_client::ClickOutcome;

    #[tokio::test]
    async fn test_push_then_click_opens_target() {
        let controller = controller().await;
        let shell = MemoryShell::new();

        let params = SwPushParams {
            payload: Some(r#"{"title": "Quake Alert", "message": "M6.1 detected", "url": "/earthquakes"}"#.into()),
        };
        let pushed: SwPushOutput = output(&push_impl(&controller, &shell, params).await.unwrap());
        let shown = pushed.notification.expect("notification shown");
        assert_eq!(shown.notification.title, "Quake Alert");

        let result = click_impl(&controller, &shell, SwNotificationClickParams { id: shown.id }).await.unwrap();
        let outcome: ClickOutcome = output(&result);
        match outcome {
            ClickOutcome::Opened(window) => assert_eq!(window.url, "http://localhost:5173/earthquakes"),
            other => panic!("expected open, got {other:?}"),
        }
        assert!(shell.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_push_without_payload() {
        let controller = controller().await;
        let shell = MemoryShell::new();

        let pushed: SwPushOutput =
            output(&push_impl(&controller, &shell, SwPushParams { payload: None }).await.unwrap());
        assert!(pushed.notification.is_none());
    }

    #[tokio::test]
    async fn test_click_unknown_notification() {
        let controller = controller().await;
        let shell = MemoryShell::new();

        let err = click_impl(&controller, &shell, SwNotificationClickParams { id: 7 }).await.unwrap_err();
        assert_eq!(err.code.0, -32007);
    }
}
