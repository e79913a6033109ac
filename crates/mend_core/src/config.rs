//! Layered configuration.
//!
//! Values are resolved in order: built-in defaults, then an optional settings
//! file (`.mend/settings.yaml`, `.mend/settings.yml` or `.mend/settings.json`
//! under the workspace root), then environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::sanitizer::SanitizerOptions;

/// Settings files probed under `<workspace>/.mend/`, first match wins.
pub const SETTINGS_FILES: &[&str] = &["settings.yaml", "settings.yml", "settings.json"];

const REDACTED: &str = "***";

/// Tool adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Per-call timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Attempts per call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub backoff_ms: u64,
    /// Bound on one full sub-agent run in seconds (0 = no bound)
    pub agent_timeout_seconds: u64,
    /// Toolbox tools that only read and may be retried after a server error
    pub repeatable_operations: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_attempts: 1,
            backoff_ms: 500,
            agent_timeout_seconds: 0,
            repeatable_operations: Vec::new(),
        }
    }
}

impl AdapterConfig {
    /// Timeout as a duration, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    /// Sub-agent run timeout, `None` when disabled.
    pub fn agent_timeout(&self) -> Option<Duration> {
        (self.agent_timeout_seconds > 0).then(|| Duration::from_secs(self.agent_timeout_seconds))
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Code-context retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    pub api_key: Option<String>,
    pub index_name: String,
    pub namespace: String,
    /// Documents requested when a call does not say
    pub top_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "developer1-quickstart-py".to_string(),
            namespace: "springboot-java".to_string(),
            top_k: 5,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MendConfig {
    /// Model every agent runs on
    pub model: String,
    pub google_cloud_project: Option<String>,
    pub google_cloud_location: String,
    /// MCP Toolbox server base URL
    pub toolbox_url: String,
    /// Toolset holding the ticket operations
    pub tickets_toolset: String,
    pub github_mcp_url: String,
    pub github_token: Option<String>,
    pub retriever: RetrieverConfig,
    pub tools: AdapterConfig,
    pub sanitizer: SanitizerOptions,
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            google_cloud_project: None,
            google_cloud_location: "us-central1".to_string(),
            toolbox_url: "http://127.0.0.1:5000".to_string(),
            tickets_toolset: "tickets_toolset".to_string(),
            github_mcp_url: "https://api.githubcopilot.com/mcp/".to_string(),
            github_token: None,
            retriever: RetrieverConfig::default(),
            tools: AdapterConfig::default(),
            sanitizer: SanitizerOptions::default(),
        }
    }
}

impl MendConfig {
    /// Load defaults, the workspace settings file, then the process environment.
    pub fn load(workspace_root: &Path) -> ConfigResult<Self> {
        let mut config = match Self::find_settings_file(workspace_root) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the first settings file under `<workspace>/.mend/`.
    pub fn find_settings_file(workspace_root: &Path) -> Option<PathBuf> {
        let dir = workspace_root.join(".mend");
        SETTINGS_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Read a settings file. JSON is chosen by extension, YAML otherwise.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        debug!("Loading settings from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else if content.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Override values from environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MEND_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("GOOGLE_CLOUD_PROJECT") {
            self.google_cloud_project = Some(v);
        }
        if let Some(v) = get("GOOGLE_CLOUD_LOCATION") {
            self.google_cloud_location = v;
        }
        if let Some(v) = get("MCP_TOOLBOX_URL") {
            self.toolbox_url = v;
        }
        if let Some(v) = get("MEND_TICKETS_TOOLSET") {
            self.tickets_toolset = v;
        }
        if let Some(v) = get("GITHUB_MCP_URL") {
            self.github_mcp_url = v;
        }
        if let Some(v) = get("GITHUB_PERSONAL_ACCESS_TOKEN") {
            self.github_token = Some(v);
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.retriever.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.retriever.index_name = v;
        }
        if let Some(v) = get("PINECONE_NAMESPACE") {
            self.retriever.namespace = v;
        }
        if let Some(v) = get("MEND_TOOL_TIMEOUT_SECS") {
            self.tools.timeout_seconds = parse_number("MEND_TOOL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("MEND_TOOL_MAX_ATTEMPTS") {
            self.tools.max_attempts = parse_number("MEND_TOOL_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("MEND_TOOL_BACKOFF_MS") {
            self.tools.backoff_ms = parse_number("MEND_TOOL_BACKOFF_MS", &v)?;
        }
        if let Some(v) = get("MEND_AGENT_TIMEOUT_SECS") {
            self.tools.agent_timeout_seconds = parse_number("MEND_AGENT_TIMEOUT_SECS", &v)?;
        }

        Ok(())
    }

    /// Check values that would only fail later, at call time.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "must not be empty"));
        }
        for (field, value) in [
            ("toolbox_url", &self.toolbox_url),
            ("github_mcp_url", &self.github_mcp_url),
        ] {
            Url::parse(value).map_err(|e| ConfigError::invalid(field, format!("{}: {}", value, e)))?;
        }
        if self.tools.max_attempts == 0 {
            return Err(ConfigError::invalid("tools.max_attempts", "must be at least 1"));
        }
        if self.retriever.top_k == 0 {
            return Err(ConfigError::invalid("retriever.top_k", "must be at least 1"));
        }
        Ok(())
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.github_token.is_some() {
            copy.github_token = Some(REDACTED.to_string());
        }
        if copy.retriever.api_key.is_some() {
            copy.retriever.api_key = Some(REDACTED.to_string());
        }
        copy
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, format!("{:?}: {}", value, e)))
}
