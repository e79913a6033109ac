//! # mend_tools
//!
//! Tools that agents call, and the adapter that makes their results safe.
//!
//! # Features
//!
//! - **Sanitizing adapter**: every successful call result is converted to
//!   plain JSON; failures are returned exactly as the tool reported them
//! - **Timeout and retry**: per-call timeout, exponential backoff for
//!   transient failures
//! - **Toolbox client**: loads toolsets from an MCP Toolbox server over HTTP
//! - **Built-in tools**: current date, code-context retrieval
//! - **Mock tool**: scripted responses for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mend_tools::{CurrentDateTool, SafeTool, ToolBinder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool = ToolBinder::default().bind(Arc::new(CurrentDateTool::new()));
//!     let today = tool.call("get_current_date", serde_json::json!({})).await?;
//!     println!("{}", today["current_date"]);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod builtin;
pub mod error;
pub mod filter;
pub mod mock;
pub mod retry;
pub mod tool;
pub mod toolbox;

pub use adapter::{SanitizingTool, ToolBinder};
pub use builtin::{
    CodeContext, CodeContextTool, CodeDocument, CodeRetriever, CurrentDateTool, CODE_CONTEXT_TOOL,
    CURRENT_DATE_TOOL,
};
pub use error::{AdapterError, AdapterResult, InvokeResult, ToolError};
pub use filter::{FilteredTool, GITHUB_PULL_REQUEST_OPERATIONS, GITHUB_READ_ONLY_OPERATIONS};
pub use mock::{CapturedCall, MockResponse, MockTool};
pub use retry::RetryPolicy;
pub use tool::{Operation, Parameter, SafeTool, Tool, ToolResult};
pub use toolbox::{ToolManifest, ToolboxClient, ToolboxToolset, ToolsetManifest};
