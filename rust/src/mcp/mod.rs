//! Tool-call protocol server (JSON-RPC 2.0 over line-delimited stdio).
//!
//! Tools:
//! - `generate_uuid` - Generate v1, v4 or v5 UUIDs
//! - `validate_uuid` - Validate one UUID
//! - `analyze_uuid` - Version, variant, format and v1 timestamp of one UUID
//! - `convert_uuid` - Change case and dash formatting
//! - `batch_validate` - Validate a list of UUIDs
//! - `batch_analyze` - Analyze a list of UUIDs
//! - `check_collisions` - Find repeated values in a list
//! - `uuid_statistics` - Version/format/variant histograms for a list

mod error;
mod protocol;
mod server;
mod tools;

pub use error::McpError;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDefinition};
pub use server::McpServer;
