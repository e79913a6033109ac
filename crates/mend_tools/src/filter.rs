//! Allow-list wrapper restricting which operations of a tool are exposed.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mend_core::RawValue;

use crate::error::{InvokeResult, ToolError};
use crate::tool::{Operation, Tool};

/// GitHub operations that only read repository or issue state.
pub const GITHUB_READ_ONLY_OPERATIONS: &[&str] = &[
    "get_file_contents",
    "get_commit",
    "search_issues",
    "list_issues",
    "get_issue",
    "search_repositories",
    "list_pull_requests",
    "get_pull_request",
];

/// GitHub operations needed to branch, commit and open a pull request.
pub const GITHUB_PULL_REQUEST_OPERATIONS: &[&str] = &[
    "create_pull_request",
    "update_pull_request",
    "create_branch",
    "create_or_update_file",
    "delete_file",
    "list_branches",
    "push_files",
    "create_pull_request_with_copilot",
    "get_pull_request",
];

/// Exposes only the allowed operations of the wrapped tool.
pub struct FilteredTool {
    inner: Arc<dyn Tool>,
    name: Option<String>,
    allowed: BTreeSet<String>,
    read_only: bool,
}

impl FilteredTool {
    pub fn new<I, S>(inner: Arc<dyn Tool>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            name: None,
            allowed: allowed.into_iter().map(Into::into).collect(),
            read_only: false,
        }
    }

    /// Expose the filtered view under its own name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Every allowed operation only reads, so each one may be repeated.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The read-only subset of a GitHub toolset.
    pub fn github_read_only(inner: Arc<dyn Tool>) -> Self {
        Self::new(inner, GITHUB_READ_ONLY_OPERATIONS.iter().copied()).read_only()
    }

    /// The branch and pull request subset of a GitHub toolset.
    pub fn github_pull_requests(inner: Arc<dyn Tool>) -> Self {
        Self::new(inner, GITHUB_PULL_REQUEST_OPERATIONS.iter().copied())
    }

    pub fn is_allowed(&self, operation: &str) -> bool {
        self.allowed.contains(operation)
    }
}

#[async_trait]
impl Tool for FilteredTool {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.name())
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn operations(&self) -> Vec<Operation> {
        self.inner
            .operations()
            .into_iter()
            .filter(|op| self.is_allowed(&op.name))
            .collect()
    }

    fn attribute(&self, name: &str) -> Option<RawValue> {
        self.inner.attribute(name)
    }

    fn is_repeatable(&self, operation: &str) -> bool {
        self.is_allowed(operation) && (self.read_only || self.inner.is_repeatable(operation))
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue> {
        if !self.is_allowed(operation) {
            return Err(ToolError::UnknownOperation(operation.to_string()));
        }
        self.inner.call(operation, args).await
    }
}

impl std::fmt::Debug for FilteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredTool")
            .field("name", &self.name())
            .field("allowed", &self.allowed)
            .finish()
    }
}
