//! Core types and shared functionality for the SafeTrack cache controller.
//!
//! This crate provides:
//! - Request classification into caching policies
//! - Generation naming and lifecycle state
//! - Partition storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod origin;
pub mod policy;
pub mod request;

pub use cache::{CacheDb, CachedEntry, EntrySummary, PartitionInfo};
pub use config::{ConfigError, NotificationConfig, WorkerConfig};
pub use error::Error;
pub use generation::{CacheNames, GenerationState};
pub use policy::{Policy, Scope, classify};
pub use request::{Destination, Request, RequestMode, Response};
