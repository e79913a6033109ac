//! Built-in tools: current date and code-context retrieval.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use mend_core::RawValue;

use crate::error::{InvokeResult, ToolError};
use crate::tool::{optional_u64, required_str, Operation, Tool};

pub const CURRENT_DATE_TOOL: &str = "get_current_date";
pub const CODE_CONTEXT_TOOL: &str = "retrieve_code_context";

const NO_CODE_FOUND: &str = "// No relevant code found.";
const RETRIEVAL_FAILED: &str = "// Error accessing vectorstore.";

/// Reports today's date as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct CurrentDateTool {
    fixed: Option<NaiveDate>,
}

impl CurrentDateTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always report the given date.
    pub fn fixed(date: NaiveDate) -> Self {
        Self { fixed: Some(date) }
    }

    fn today(&self) -> NaiveDate {
        self.fixed.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[async_trait]
impl Tool for CurrentDateTool {
    fn name(&self) -> &str {
        CURRENT_DATE_TOOL
    }

    fn description(&self) -> &str {
        "Get the current date in the format YYYY-MM-DD"
    }

    fn operations(&self) -> Vec<Operation> {
        vec![Operation::new(CURRENT_DATE_TOOL, self.description())]
    }

    fn is_repeatable(&self, _operation: &str) -> bool {
        true
    }

    async fn call(&self, operation: &str, _args: Value) -> InvokeResult<RawValue> {
        if operation != CURRENT_DATE_TOOL {
            return Err(ToolError::UnknownOperation(operation.to_string()));
        }
        let date = self.today().format("%Y-%m-%d").to_string();
        Ok(RawValue::mapping([("current_date", date)]))
    }
}

/// A document returned by a code index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeDocument {
    pub page_content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl CodeDocument {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// File the snippet came from, `unknown` when the index did not record it.
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }

    /// Snippet text; the `text` metadata field wins over the page content.
    pub fn code(&self) -> &str {
        self.metadata
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or(&self.page_content)
            .trim()
    }
}

/// Similarity search over an indexed codebase.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> InvokeResult<Vec<CodeDocument>>;
}

/// Retrieved snippets, concatenated for a model to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeContext {
    pub success: bool,
    pub retrieved_code: String,
    pub sources: Vec<String>,
    pub num_documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeContext {
    /// Join documents, keeping the first snippet per source.
    pub fn from_documents(documents: &[CodeDocument]) -> Self {
        if documents.is_empty() {
            return Self {
                success: true,
                retrieved_code: NO_CODE_FOUND.to_string(),
                sources: Vec::new(),
                num_documents: 0,
                error: None,
            };
        }

        let mut retrieved_code = String::new();
        let mut sources = Vec::new();
        let mut seen = HashSet::new();
        for doc in documents {
            let source = doc.source();
            if !seen.insert(source) {
                continue;
            }
            retrieved_code.push_str(&format!("// From: {}\n{}\n\n", source, doc.code()));
            sources.push(source.to_string());
        }

        Self {
            success: true,
            retrieved_code,
            sources,
            num_documents: documents.len(),
            error: None,
        }
    }

    pub fn failed(error: &ToolError) -> Self {
        Self {
            success: false,
            retrieved_code: RETRIEVAL_FAILED.to_string(),
            sources: Vec::new(),
            num_documents: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Looks up code related to an error message.
///
/// Retrieval failures are reported inside the result (`success: false`)
/// rather than as a tool error, so the calling agent can carry on with the
/// other tools it has.
pub struct CodeContextTool {
    retriever: Arc<dyn CodeRetriever>,
    default_k: usize,
}

impl CodeContextTool {
    pub fn new(retriever: Arc<dyn CodeRetriever>) -> Self {
        Self {
            retriever,
            default_k: 5,
        }
    }

    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k.max(1);
        self
    }
}

#[async_trait]
impl Tool for CodeContextTool {
    fn name(&self) -> &str {
        CODE_CONTEXT_TOOL
    }

    fn description(&self) -> &str {
        "Retrieve code snippets relevant to an error message or exception from the code index"
    }

    fn operations(&self) -> Vec<Operation> {
        vec![Operation::new(CODE_CONTEXT_TOOL, self.description())
            .param("query", "string", "Full error message or exception")
            .optional_param("max_results", "integer", "Number of snippets to retrieve")]
    }

    fn is_repeatable(&self, _operation: &str) -> bool {
        true
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue> {
        if operation != CODE_CONTEXT_TOOL {
            return Err(ToolError::UnknownOperation(operation.to_string()));
        }
        let query = required_str(&args, operation, "query")?;
        let k = optional_u64(&args, operation, "max_results")?
            .map(|k| k.max(1) as usize)
            .unwrap_or(self.default_k);

        let context = match self.retriever.retrieve(&query, k).await {
            Ok(documents) => CodeContext::from_documents(&documents),
            Err(e) => {
                warn!("Code retrieval failed for query {:?}: {}", query, e);
                CodeContext::failed(&e)
            }
        };

        let status = if context.success { "success" } else { "error" };
        Ok(RawValue::from(json!({
            "query": query,
            "relevant_code_context": context,
            "status": status,
        })))
    }
}

impl std::fmt::Debug for CodeContextTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeContextTool")
            .field("default_k", &self.default_k)
            .finish()
    }
}
