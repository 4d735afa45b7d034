//! Push messages and notification clicks.

use serde::{Deserialize, Serialize};

use safetrack_core::Error;

use super::CacheController;
use crate::host::{Clients, Notification, NotificationData, Notifier, ShownNotification, WindowClient};
use crate::network::Network;

/// Inbound push payload. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    message: Option<String>,
    url: Option<String>,
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "action", content = "window", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// An open window already showed the target and was focused.
    Focused(WindowClient),
    /// No window showed the target; a new one was opened.
    Opened(WindowClient),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl<N: Network + 'static> CacheController<N> {
    /// Display a notification for a push message.
    ///
    /// An absent or blank payload is ignored and nothing is shown.
    pub async fn handle_push(
        &self, payload: Option<&[u8]>, notifier: &dyn Notifier,
    ) -> Result<Option<ShownNotification>, Error> {
        let Some(bytes) = payload.filter(|b| !b.iter().all(u8::is_ascii_whitespace)) else {
            tracing::debug!("push without payload ignored");
            return Ok(None);
        };

        let payload: PushPayload =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidPayload(format!("push payload: {e}")))?;

        let defaults = &self.config.notification;
        let notification = Notification {
            title: non_empty(payload.title).unwrap_or_else(|| defaults.default_title.clone()),
            body: non_empty(payload.message).unwrap_or_else(|| defaults.default_body.clone()),
            icon: defaults.icon.clone(),
            data: NotificationData { url: non_empty(payload.url).unwrap_or_else(|| defaults.default_url.clone()) },
        };

        let shown = notifier.show(notification).await?;
        tracing::info!(id = shown.id, url = %shown.notification.data.url, "notification shown");
        Ok(Some(shown))
    }

    /// Close the notification, then focus a window already on its target or
    /// open a new one there.
    pub async fn handle_notification_click(
        &self, shown: &ShownNotification, notifier: &dyn Notifier, clients: &dyn Clients,
    ) -> Result<ClickOutcome, Error> {
        if let Err(err) = notifier.close(shown.id).await {
            tracing::warn!(id = shown.id, error = %err, "failed to close notification");
        }

        let target = self.resolve(&shown.notification.data.url)?;
        let windows = clients.windows().await?;
        let existing = windows.iter().find(|w| self.resolve(&w.url).is_ok_and(|u| u == target));

        let outcome = match existing {
            Some(window) => ClickOutcome::Focused(clients.focus(window.id).await?),
            None => ClickOutcome::Opened(clients.open_window(target.as_str()).await?),
        };

        tracing::info!(id = shown.id, target = %target, ?outcome, "notification clicked");
        Ok(outcome)
    }
}
