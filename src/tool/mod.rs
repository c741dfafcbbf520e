pub mod base;
pub mod web_search;

pub use base::{Tool, ToolContext, ToolError, ToolResult};
pub use web_search::WebSearchTool;
