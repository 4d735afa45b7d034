//! Client code for the SafeTrack cache controller.
//!
//! This crate provides the network seam, the host seams for notifications
//! and windows, and the [`CacheController`] that handles lifecycle, fetch
//! and push events. Shared by the server and CLI.

pub mod host;
pub mod network;
pub mod worker;

pub use host::{Clients, MemoryShell, Notification, NotificationData, Notifier, ShownNotification, WindowClient};
pub use network::{HttpNetwork, Network, NetworkConfig};
pub use worker::{
    ActivateReport, CacheController, ClickOutcome, ControllerConfig, ControllerStatus, InstallReport, Intercept,
    Served, Source,
};
