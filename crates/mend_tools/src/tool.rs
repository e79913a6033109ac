//! Tool traits and operation descriptors.
//!
//! A [`Tool`] is anything an agent can call: an HTTP toolset, a local
//! function, another agent. It returns [`RawValue`]s of whatever shape its
//! backend produces. Agents never see a `Tool` directly; they see a
//! [`SafeTool`], whose results are plain JSON (see [`crate::SanitizingTool`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use mend_core::{RawValue, SafeValue};

use crate::error::{AdapterResult, InvokeResult, ToolError};

/// The value an adapted tool hands back to an agent.
pub type ToolResult = SafeValue;

/// A named parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// JSON type name (`string`, `integer`, `object`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// A callable member of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Operation {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a required parameter.
    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional parameter.
    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: false,
        });
        self
    }

    /// Function declaration in the JSON-schema form models expect.
    pub fn to_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in &self.parameters {
            properties.insert(
                p.name.clone(),
                json!({"type": p.kind, "description": p.description}),
            );
            if p.required {
                required.push(Value::String(p.name.clone()));
            }
        }

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// An external tool or client.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Callable members.
    fn operations(&self) -> Vec<Operation>;

    /// Non-callable members, returned as-is.
    fn attribute(&self, _name: &str) -> Option<RawValue> {
        None
    }

    /// Whether calling `operation` again after a call that may have reached
    /// the tool has no further effect. Only such calls are retried after a
    /// transport error or a timeout.
    fn is_repeatable(&self, _operation: &str) -> bool {
        false
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue>;
}

/// A tool whose results are guaranteed JSON-safe.
#[async_trait]
pub trait SafeTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn operations(&self) -> Vec<Operation>;

    fn attribute(&self, name: &str) -> Option<RawValue>;

    async fn call(&self, operation: &str, args: Value) -> AdapterResult<ToolResult>;
}

/// Read a required string argument.
pub fn required_str(args: &Value, operation: &str, key: &str) -> InvokeResult<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(operation, format!("missing string '{}'", key)))
}

/// Read an optional non-negative integer argument.
pub fn optional_u64(args: &Value, operation: &str, key: &str) -> InvokeResult<Option<u64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            ToolError::invalid_arguments(operation, format!("'{}' must be a non-negative integer", key))
        }),
    }
}
