//! MCP tool implementations.
//!
//! Each tool is a thin adapter: parse parameters, drive the controller or
//! the cache, and return the result as pretty JSON text.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod push;
pub mod status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use safetrack_core::Error;

/// Serialize a tool output as a single text content block.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
