//! HTTP client for MCP Toolbox servers.
//!
//! A toolbox serves named toolsets. The manifest of a toolset lists its
//! tools and their parameters; each tool is invoked with a JSON body and
//! answers with `{"result": ...}`.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use mend_core::RawValue;

use crate::error::{InvokeResult, ToolError};
use crate::tool::{Operation, Parameter, Tool};

/// Manifest returned by `GET /api/toolset/{name}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsetManifest {
    #[serde(default)]
    pub server_version: String,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolManifest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ToolsetManifest {
    pub fn operations(&self) -> Vec<Operation> {
        self.tools
            .iter()
            .map(|(name, tool)| Operation {
                name: name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            })
            .collect()
    }
}

/// Connection to one toolbox server.
#[derive(Debug, Clone)]
pub struct ToolboxClient {
    base_url: Url,
    http: reqwest::Client,
    bearer: Option<String>,
}

impl ToolboxClient {
    pub fn new(base_url: &str) -> InvokeResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ToolError::Failed(format!("Invalid toolbox URL '{}': {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            bearer: None,
        })
    }

    /// Bound every request to the server, manifest fetches included.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> InvokeResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.http = builder
            .build()
            .map_err(|e| ToolError::Failed(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> InvokeResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ToolError::Failed(format!("Toolbox URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Fetch a toolset manifest.
    pub async fn manifest(&self, toolset: &str) -> InvokeResult<ToolsetManifest> {
        let url = self.endpoint(&["api", "toolset", toolset])?;
        debug!("Fetching toolset manifest: {}", url);

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("Failed to parse toolset manifest: {}", e)))
    }

    /// Fetch a toolset and expose it as a [`Tool`].
    pub async fn load_toolset(&self, toolset: &str) -> InvokeResult<ToolboxToolset> {
        let manifest = self.manifest(toolset).await?;
        info!(
            "Loaded toolset '{}' with {} tools (server {})",
            toolset,
            manifest.tools.len(),
            manifest.server_version
        );

        Ok(ToolboxToolset {
            name: toolset.to_string(),
            description: format!("Tools from the '{}' toolbox toolset", toolset),
            server_version: manifest.server_version.clone(),
            operations: manifest.operations(),
            repeatable: BTreeSet::new(),
            client: self.clone(),
        })
    }

    /// Invoke one tool by name.
    pub async fn invoke(&self, tool: &str, args: &Value) -> InvokeResult<RawValue> {
        let url = self.endpoint(&["api", "tool", tool, "invoke"])?;
        let body = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args.clone()
        };

        let response = self
            .authorize(self.http.post(url))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("Failed to parse result of {}: {}", tool, e)))?;
        Ok(decode_result(payload))
    }
}

/// Unwrap `{"result": ...}`, decoding results that are JSON text.
fn decode_result(payload: Value) -> RawValue {
    let result = match payload {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    };

    match result {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(decoded @ (Value::Object(_) | Value::Array(_))) => RawValue::from(decoded),
            _ => RawValue::String(text),
        },
        other => RawValue::from(other),
    }
}

fn request_error(e: reqwest::Error) -> ToolError {
    if e.is_connect() {
        ToolError::Unavailable(format!("Toolbox unreachable: {}", e))
    } else if e.is_timeout() {
        ToolError::Transport(format!("Toolbox request timed out: {}", e))
    } else {
        ToolError::Transport(format!("Network error: {}", e))
    }
}

async fn check_status(response: reqwest::Response) -> InvokeResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("Toolbox error {}: {}", status, body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(ToolError::Transport(message))
    } else {
        Err(ToolError::Failed(message))
    }
}

/// A toolset loaded from a toolbox server.
#[derive(Debug, Clone)]
pub struct ToolboxToolset {
    name: String,
    description: String,
    server_version: String,
    operations: Vec<Operation>,
    repeatable: BTreeSet<String>,
    client: ToolboxClient,
}

impl ToolboxToolset {
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Tools that only read, and so may be retried after a server error.
    pub fn with_repeatable<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repeatable.extend(tools.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl Tool for ToolboxToolset {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn operations(&self) -> Vec<Operation> {
        self.operations.clone()
    }

    fn attribute(&self, name: &str) -> Option<RawValue> {
        match name {
            "server_version" => Some(RawValue::String(self.server_version.clone())),
            "endpoint" => Some(RawValue::Url(self.client.base_url().clone())),
            _ => None,
        }
    }

    fn is_repeatable(&self, operation: &str) -> bool {
        self.repeatable.contains(operation)
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue> {
        if !self.operations.iter().any(|op| op.name == operation) {
            return Err(ToolError::UnknownOperation(operation.to_string()));
        }
        self.client.invoke(operation, &args).await
    }
}
