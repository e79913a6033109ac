//! Mock tool for testing.
//!
//! Returns scripted responses and records every call, so adapter and agent
//! wiring can be exercised without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use mend_core::RawValue;

use crate::error::{InvokeResult, ToolError};
use crate::tool::{Operation, Tool};

/// Scripted outcome of one call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Value(RawValue),
    Error(ToolError),
}

impl MockResponse {
    pub fn value(value: impl Into<RawValue>) -> Self {
        Self::Value(value.into())
    }

    pub fn error(error: ToolError) -> Self {
        Self::Error(error)
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCall {
    pub operation: String,
    pub args: Value,
}

/// Mock tool.
///
/// Responses are returned in order and cycle once exhausted. With no
/// responses configured every call returns `null`.
#[derive(Clone)]
pub struct MockTool {
    name: String,
    description: String,
    operations: Arc<RwLock<Vec<Operation>>>,
    attributes: Arc<RwLock<HashMap<String, RawValue>>>,
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    repeatable: Arc<RwLock<HashSet<String>>>,
}

impl MockTool {
    /// Create a mock tool with a single operation of the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            operations: Arc::new(RwLock::new(vec![Operation::new(name.clone(), "Mock operation")])),
            description: format!("Mock tool {}", name),
            name,
            attributes: Arc::new(RwLock::new(HashMap::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
            repeatable: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Replace the advertised operations.
    pub fn with_operations(self, operations: Vec<Operation>) -> Self {
        *self.operations.write() = operations;
        self
    }

    /// Set a non-callable attribute.
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.attributes.write().insert(name.into(), value.into());
        self
    }

    /// Add a response for the next call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write() = Some(delay);
        self
    }

    /// Mark operations as safe to call again.
    pub fn with_repeatable<I, S>(self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repeatable
            .write()
            .extend(operations.into_iter().map(Into::into));
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific operation was called.
    pub fn was_called(&self, operation: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.operation == operation)
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::Value(RawValue::Null);
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or(MockResponse::Value(RawValue::Null))
    }
}

impl std::fmt::Debug for MockTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTool")
            .field("name", &self.name)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn operations(&self) -> Vec<Operation> {
        self.operations.read().clone()
    }

    fn attribute(&self, name: &str) -> Option<RawValue> {
        self.attributes.read().get(name).cloned()
    }

    fn is_repeatable(&self, operation: &str) -> bool {
        self.repeatable.read().contains(operation)
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue> {
        self.captured_calls.write().push(CapturedCall {
            operation: operation.to_string(),
            args,
        });

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_response() {
            MockResponse::Value(value) => Ok(value),
            MockResponse::Error(error) => Err(error),
        }
    }
}
