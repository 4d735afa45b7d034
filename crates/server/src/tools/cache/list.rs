//! cache_list tool implementation.
//!
//! Lists partitions, or the entries of one partition.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use safetrack_core::{CacheDb, EntrySummary, Error, PartitionInfo};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Partition whose entries to list. Omit to list partitions.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Partitions { partitions: Vec<PartitionInfo> },
    Entries { partition: String, entries: Vec<EntrySummary> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.partition {
        None => CacheListOutput::Partitions { partitions: cache.partitions().await? },
        Some(partition) => {
            if !cache.has_partition(&partition).await? {
                return Err(Error::NotFound(format!("partition {partition}")).into());
            }
            let entries = cache.entries(&partition).await?;
            CacheListOutput::Entries { partition, entries }
        }
    };

    json_result(&output)
}
