//! The sanitizing boundary around tools.
//!
//! [`SanitizingTool`] wraps any [`Tool`] and exposes it as a [`SafeTool`]:
//! name, description, operations and attributes are delegated unchanged, and
//! every successful call result goes through the [`Sanitizer`] before it is
//! returned. A failed call is returned as the tool reported it.
//!
//! Each call can be bounded by a timeout and repeated under a
//! [`RetryPolicy`]. A call the tool never received is always retried;
//! transport errors and timeouts only for operations the tool reports as
//! repeatable.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use mend_core::{MendConfig, RawValue, Sanitizer};

use crate::error::{AdapterError, AdapterResult};
use crate::retry::RetryPolicy;
use crate::tool::{Operation, SafeTool, Tool, ToolResult};

/// A tool whose results are sanitized before they reach the caller.
pub struct SanitizingTool<T: ?Sized> {
    inner: Arc<T>,
    sanitizer: Sanitizer,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl<T: Tool + ?Sized> SanitizingTool<T> {
    /// Wrap a tool with default sanitizer options, no timeout and no retries.
    pub fn new(inner: Arc<T>) -> Self {
        Self {
            inner,
            sanitizer: Sanitizer::default(),
            timeout: None,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The wrapped tool.
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }

    async fn call_with_retry(&self, operation: &str, args: Value) -> AdapterResult<RawValue> {
        let repeatable = self.inner.is_repeatable(operation);
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            match self.call_once(operation, args.clone()).await {
                Ok(raw) => {
                    debug!(
                        tool = %self.inner.name(),
                        operation,
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        kind = raw.kind(),
                        "Tool call succeeded"
                    );
                    return Ok(raw);
                }
                Err(err) if err.is_retryable(repeatable) && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        tool = %self.inner.name(),
                        operation,
                        attempt,
                        "Tool call failed, retrying in {:?}: {}",
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once(&self, operation: &str, args: Value) -> AdapterResult<RawValue> {
        let call = self.inner.call(operation, args);
        match self.timeout {
            Some(limit) => match timeout(limit, call).await {
                Ok(result) => result.map_err(AdapterError::from),
                Err(_) => Err(AdapterError::Timeout {
                    tool: self.inner.name().to_string(),
                    operation: operation.to_string(),
                    timeout: limit,
                }),
            },
            None => call.await.map_err(AdapterError::from),
        }
    }
}

#[async_trait]
impl<T: Tool + ?Sized> SafeTool for SanitizingTool<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn operations(&self) -> Vec<Operation> {
        self.inner.operations()
    }

    fn attribute(&self, name: &str) -> Option<RawValue> {
        self.inner.attribute(name)
    }

    async fn call(&self, operation: &str, args: Value) -> AdapterResult<ToolResult> {
        info!(tool = %self.inner.name(), operation, "Invoking tool");
        let raw = self.call_with_retry(operation, args).await?;
        let (safe, report) = self.sanitizer.sanitize_with_report(&raw)?;
        if !report.is_clean() {
            debug!(
                tool = %self.inner.name(),
                operation,
                fallbacks = report.len(),
                "Result contained values without a JSON form"
            );
        }
        Ok(safe)
    }
}

impl<T: ?Sized> std::fmt::Debug for SanitizingTool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizingTool")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Wraps raw tools with one shared adapter configuration.
#[derive(Debug, Clone, Default)]
pub struct ToolBinder {
    sanitizer: Sanitizer,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl ToolBinder {
    pub fn new(sanitizer: Sanitizer, timeout: Option<Duration>, retry: RetryPolicy) -> Self {
        Self {
            sanitizer,
            timeout,
            retry,
        }
    }

    /// Adapter settings taken from the `tools` and `sanitizer` config sections.
    pub fn from_config(config: &MendConfig) -> Self {
        Self::new(
            Sanitizer::new(config.sanitizer.clone()),
            config.tools.timeout(),
            RetryPolicy::from(&config.tools),
        )
    }

    /// Settings for tools that run a whole sub-agent: the agent run timeout
    /// and no retries.
    pub fn agent_runs(config: &MendConfig) -> Self {
        Self::new(
            Sanitizer::new(config.sanitizer.clone()),
            config.tools.agent_timeout(),
            RetryPolicy::none(),
        )
    }

    /// Wrap a tool behind the sanitizing boundary.
    pub fn bind(&self, tool: Arc<dyn Tool>) -> Arc<dyn SafeTool> {
        debug!("Binding tool: {}", tool.name());
        Arc::new(
            SanitizingTool::new(tool)
                .with_sanitizer(self.sanitizer.clone())
                .with_timeout(self.timeout)
                .with_retry(self.retry),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::mock::{MockResponse, MockTool};
    use serde_json::json;

    fn github_issue() -> RawValue {
        RawValue::mapping([
            ("number", RawValue::from(42)),
            ("html_url", RawValue::url("https://github.com/acme/shop/issues/42").unwrap()),
            (
                "assignees",
                RawValue::sequence([RawValue::url("https://api.github.com/users/octocat").unwrap()]),
            ),
        ])
    }

    #[tokio::test]
    async fn test_url_leaves_are_sanitized() {
        let mock = Arc::new(MockTool::new("get_issue").add_response(MockResponse::value(github_issue())));
        let tool = SanitizingTool::new(mock.clone());

        let result = tool.call("get_issue", json!({"issue_number": 42})).await.unwrap();

        assert_eq!(
            result,
            json!({
                "number": 42,
                "html_url": "https://github.com/acme/shop/issues/42",
                "assignees": ["https://api.github.com/users/octocat"],
            })
        );
        assert_eq!(mock.get_calls()[0].args, json!({"issue_number": 42}));
    }

    #[tokio::test]
    async fn test_tool_error_propagates_unchanged() {
        let original = ToolError::Failed("404 Not Found: repository acme/missing".to_string());
        let mock = Arc::new(MockTool::new("get_file_contents").add_response(MockResponse::error(original.clone())));
        let tool = SanitizingTool::new(mock);

        let err = tool.call("get_file_contents", json!({})).await.unwrap_err();
        assert_eq!(err, AdapterError::Tool(original.clone()));
        assert_eq!(err.to_string(), original.to_string());
    }

    #[tokio::test]
    async fn test_members_delegate_to_inner_tool() {
        let mock = Arc::new(
            MockTool::new("tickets")
                .with_operations(vec![
                    Operation::new("create_ticket", "Create a ticket"),
                    Operation::new("update_ticket", "Update a ticket"),
                ])
                .with_attribute("endpoint", RawValue::url("http://127.0.0.1:5000").unwrap()),
        );
        let tool = SanitizingTool::new(mock);

        assert_eq!(tool.name(), "tickets");
        let names: Vec<_> = tool.operations().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["create_ticket", "update_ticket"]);
        // Non-callable members are not sanitized.
        assert!(matches!(tool.attribute("endpoint"), Some(RawValue::Url(_))));
        assert!(tool.attribute("missing").is_none());
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock = Arc::new(MockTool::new("slow").with_delay(Duration::from_millis(200)));
        let tool = SanitizingTool::new(mock).with_timeout(Some(Duration::from_millis(20)));

        let err = tool.call("slow", Value::Null).await.unwrap_err();
        assert!(matches!(err, AdapterError::Timeout { ref operation, .. } if operation == "slow"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mock = Arc::new(
            MockTool::new("search")
                .with_repeatable(["search"])
                .with_responses(vec![
                    MockResponse::error(ToolError::Transport("502 Bad Gateway".to_string())),
                    MockResponse::error(ToolError::Unavailable("connection refused".to_string())),
                    MockResponse::value("found"),
                ]),
        );
        let tool = SanitizingTool::new(mock.clone())
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1)));

        assert_eq!(tool.call("search", Value::Null).await.unwrap(), json!("found"));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_stop_at_max_attempts() {
        let last = ToolError::Transport("503 Service Unavailable".to_string());
        let mock = Arc::new(
            MockTool::new("search")
                .with_repeatable(["search"])
                .add_response(MockResponse::error(last.clone())),
        );
        let tool = SanitizingTool::new(mock.clone())
            .with_retry(RetryPolicy::exponential(2, Duration::from_millis(1)));

        let err = tool.call("search", Value::Null).await.unwrap_err();
        assert_eq!(err, AdapterError::Tool(last));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let mock = Arc::new(MockTool::new("create_ticket").with_responses(vec![
            MockResponse::error(ToolError::invalid_arguments("create_ticket", "missing title")),
            MockResponse::value("created"),
        ]));
        let tool = SanitizingTool::new(mock.clone())
            .with_retry(RetryPolicy::exponential(5, Duration::from_millis(1)));

        assert!(tool.call("create_ticket", json!({})).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_on_non_repeatable_operation_is_not_retried() {
        let mock = Arc::new(MockTool::new("create_ticket").with_responses(vec![
            MockResponse::error(ToolError::Transport("502 Bad Gateway".to_string())),
            MockResponse::value("created"),
        ]));
        let tool = SanitizingTool::new(mock.clone())
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1)));

        let err = tool.call("create_ticket", json!({"title": "NPE"})).await.unwrap_err();
        assert!(matches!(err, AdapterError::Tool(ToolError::Transport(_))));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unreached_tool_is_retried_for_any_operation() {
        let mock = Arc::new(MockTool::new("create_ticket").with_responses(vec![
            MockResponse::error(ToolError::Unavailable("connection refused".to_string())),
            MockResponse::value("created"),
        ]));
        let tool = SanitizingTool::new(mock.clone())
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1)));

        assert_eq!(tool.call("create_ticket", json!({})).await.unwrap(), json!("created"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_retried_only_when_repeatable() {
        let slow = Arc::new(MockTool::new("create_branch").with_delay(Duration::from_millis(200)));
        let tool = SanitizingTool::new(slow.clone())
            .with_timeout(Some(Duration::from_millis(20)))
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1)));
        assert!(matches!(
            tool.call("create_branch", Value::Null).await,
            Err(AdapterError::Timeout { .. })
        ));
        assert_eq!(slow.call_count(), 1);

        let reads = Arc::new(
            MockTool::new("get_issue")
                .with_repeatable(["get_issue"])
                .with_delay(Duration::from_millis(200)),
        );
        let tool = SanitizingTool::new(reads.clone())
            .with_timeout(Some(Duration::from_millis(20)))
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1)));
        assert!(tool.call("get_issue", Value::Null).await.is_err());
        assert_eq!(reads.call_count(), 3);
    }

    #[tokio::test]
    async fn test_agent_run_binder_has_no_retry() {
        let mut config = MendConfig::default();
        config.tools.max_attempts = 3;
        config.tools.backoff_ms = 1;

        let mock = Arc::new(
            MockTool::new("code_fixer_agent")
                .with_repeatable(["code_fixer_agent"])
                .with_delay(Duration::from_millis(30))
                .add_response(MockResponse::error(ToolError::Transport("reset".to_string()))),
        );
        let bound = ToolBinder::agent_runs(&config).bind(mock.clone());

        assert!(bound.call("code_fixer_agent", Value::Null).await.is_err());
        assert_eq!(mock.call_count(), 1);

        config.tools.agent_timeout_seconds = 0;
        assert_eq!(ToolBinder::agent_runs(&config).timeout, None);
        config.tools.agent_timeout_seconds = 900;
        assert_eq!(
            ToolBinder::agent_runs(&config).timeout,
            Some(Duration::from_secs(900))
        );
    }

    #[tokio::test]
    async fn test_binder_applies_config() {
        let mut config = MendConfig::default();
        config.tools.timeout_seconds = 0;
        config.tools.max_attempts = 2;
        config.tools.backoff_ms = 1;

        let mock = Arc::new(
            MockTool::new("flaky")
                .with_repeatable(["flaky"])
                .with_responses(vec![
                    MockResponse::error(ToolError::Transport("reset".to_string())),
                    MockResponse::value(RawValue::url("https://example.com/").unwrap()),
                ]),
        );
        let bound = ToolBinder::from_config(&config).bind(mock.clone());

        assert_eq!(bound.call("flaky", Value::Null).await.unwrap(), json!("https://example.com/"));
        assert_eq!(mock.call_count(), 2);
    }
}
