//! Host seams: the system notification tray and the app's open windows.
//!
//! The controller never owns windows or notifications; it asks the host
//! through [`Notifier`] and [`Clients`]. [`MemoryShell`] is an in-process
//! host that keeps both in memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use safetrack_core::Error;

/// Data stashed on a notification for the click handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Target opened or focused on click.
    pub url: String,
}

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: NotificationData,
}

/// A notification the host has displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ShownNotification {
    pub id: u64,
    pub shown_at: String,
    pub notification: Notification,
}

/// An open window (tab) of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: u64,
    pub url: String,
    pub focused: bool,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: Notification) -> Result<ShownNotification, Error>;

    async fn close(&self, id: u64) -> Result<(), Error>;
}

#[async_trait]
pub trait Clients: Send + Sync {
    /// Take control of already-open pages. Returns how many were claimed.
    async fn claim(&self) -> Result<usize, Error>;

    async fn windows(&self) -> Result<Vec<WindowClient>, Error>;

    async fn focus(&self, id: u64) -> Result<WindowClient, Error>;

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error>;
}

#[derive(Debug, Default)]
struct ShellState {
    next_id: u64,
    notifications: BTreeMap<u64, ShownNotification>,
    windows: BTreeMap<u64, WindowClient>,
    controlled: usize,
}

impl ShellState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn open(&mut self, url: &str) -> WindowClient {
        let id = self.next_id();
        for window in self.windows.values_mut() {
            window.focused = false;
        }
        let window = WindowClient { id, url: url.to_string(), focused: true };
        self.windows.insert(id, window.clone());
        window
    }
}

/// In-memory host shell.
#[derive(Debug, Default)]
pub struct MemoryShell {
    state: Mutex<ShellState>,
}

impl MemoryShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window as the user would, outside the controller.
    pub async fn open(&self, url: &str) -> WindowClient {
        self.state.lock().await.open(url)
    }

    /// Notifications currently displayed, oldest first.
    pub async fn notifications(&self) -> Vec<ShownNotification> {
        self.state.lock().await.notifications.values().cloned().collect()
    }

    pub async fn notification(&self, id: u64) -> Option<ShownNotification> {
        self.state.lock().await.notifications.get(&id).cloned()
    }

    /// Open windows, oldest first.
    pub async fn open_windows(&self) -> Vec<WindowClient> {
        self.state.lock().await.windows.values().cloned().collect()
    }

    /// Windows under controller control after the last claim.
    pub async fn controlled(&self) -> usize {
        self.state.lock().await.controlled
    }
}

#[async_trait]
impl Notifier for MemoryShell {
    async fn show(&self, notification: Notification) -> Result<ShownNotification, Error> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let shown = ShownNotification { id, shown_at: chrono::Utc::now().to_rfc3339(), notification };
        state.notifications.insert(id, shown.clone());
        Ok(shown)
    }

    async fn close(&self, id: u64) -> Result<(), Error> {
        self.state.lock().await.notifications.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl Clients for MemoryShell {
    async fn claim(&self) -> Result<usize, Error> {
        let mut state = self.state.lock().await;
        state.controlled = state.windows.len();
        Ok(state.controlled)
    }

    async fn windows(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.open_windows().await)
    }

    async fn focus(&self, id: u64) -> Result<WindowClient, Error> {
        let mut state = self.state.lock().await;
        let target = state
            .windows
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("window {id}")))?;
        for window in state.windows.values_mut() {
            window.focused = window.id == id;
        }
        Ok(WindowClient { focused: true, ..target })
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error> {
        Ok(self.state.lock().await.open(url))
    }
}
