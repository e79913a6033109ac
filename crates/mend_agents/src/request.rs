//! The input handed to the orchestrator.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AgentError, AgentResult};

const REPO_NAME_PATTERN: &str = r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$";

/// Input format shown to the orchestrator.
pub const INPUT_FORMAT: &str = r#"{
    "error_logs": "detailed error logs or issue description",
    "repo_name": "owner/repository-name",
    "additional_context": "any additional context or requirements"
}"#;

/// A reported bug, as the orchestrator receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReportRequest {
    pub error_logs: String,
    pub repo_name: String,
    #[serde(default)]
    pub additional_context: String,
}

impl BugReportRequest {
    pub fn new(error_logs: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            error_logs: error_logs.into(),
            repo_name: repo_name.into(),
            additional_context: String::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = context.into();
        self
    }

    /// Parse and validate a JSON request.
    pub fn from_json(text: &str) -> AgentResult<Self> {
        let request: Self = serde_json::from_str(text)
            .map_err(|e| AgentError::invalid_request(format!("malformed request: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    /// A filled-in request for documentation and dry runs.
    pub fn example() -> Self {
        Self::new(
            "java.lang.NullPointerException: Cannot invoke \"Order.getId()\" because \"order\" is null\n\
             \tat com.example.shop.OrderService.cancel(OrderService.java:57)",
            "acme/shop-service",
        )
        .with_context("Started after the 2.3.0 release; only affects cancelled orders")
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.error_logs.trim().is_empty() {
            return Err(AgentError::invalid_request("error_logs must not be empty"));
        }
        let valid_repo = Regex::new(REPO_NAME_PATTERN)
            .map(|re| re.is_match(&self.repo_name))
            .unwrap_or(false);
        if !valid_repo {
            return Err(AgentError::invalid_request(format!(
                "repo_name must look like owner/repository, got '{}'",
                self.repo_name
            )));
        }
        Ok(())
    }

    pub fn owner(&self) -> Option<&str> {
        self.repo_name.split_once('/').map(|(owner, _)| owner)
    }

    pub fn repository(&self) -> Option<&str> {
        self.repo_name.split_once('/').map(|(_, repo)| repo)
    }

    /// Arguments for calling the orchestrator as a tool.
    pub fn to_args(&self) -> AgentResult<Value> {
        Ok(json!({ "request": serde_json::to_string(self)? }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let request = BugReportRequest::from_json(
            r#"{"error_logs": "IndexError: list index out of range", "repo_name": "acme/api"}"#,
        )
        .unwrap();
        assert_eq!(request.owner(), Some("acme"));
        assert_eq!(request.repository(), Some("api"));
        assert_eq!(request.additional_context, "");
    }

    #[test]
    fn test_rejects_bad_repo_name() {
        for repo in ["acme", "acme/", "/api", "acme/api/extra", "acme api/x"] {
            let err = BugReportRequest::new("boom", repo).validate().unwrap_err();
            assert!(matches!(err, AgentError::InvalidRequest(_)), "{repo}");
        }
    }

    #[test]
    fn test_rejects_empty_logs() {
        assert!(BugReportRequest::new("  \n", "acme/api").validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = BugReportRequest::from_json(r#"{"repo_name": "acme/api"}"#).unwrap_err();
        assert!(err.to_string().contains("malformed request"));
    }

    #[test]
    fn test_example_is_valid() {
        let example = BugReportRequest::example();
        assert!(example.validate().is_ok());

        let args = example.to_args().unwrap();
        let decoded = BugReportRequest::from_json(args["request"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, example);
    }

    #[test]
    fn test_input_format_is_json() {
        let value: Value = serde_json::from_str(INPUT_FORMAT).unwrap();
        assert!(value.get("repo_name").is_some());
    }
}
