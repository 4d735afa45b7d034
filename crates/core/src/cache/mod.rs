//! SQLite-backed cache partitions.
//!
//! This module provides the durable state of the controller: named
//! partitions of captured responses plus the lifecycle state of each
//! generation. It supports:
//!
//! - Exact-match entries keyed by SHA-256 of method and URL
//! - Atomic batch writes for precaching
//! - Whole-partition deletion (entries cascade)
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedEntry, EntrySummary};
pub use partitions::PartitionInfo;
