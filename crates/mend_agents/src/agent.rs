//! Agent specifications and agents exposed as tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use mend_core::RawValue;
use mend_tools::{
    InvokeResult, Operation, SafeTool, Tool, ToolBinder, ToolError, ToolResult,
};

use crate::error::{AgentError, AgentResult};
use crate::prompts;
use crate::roles::AgentRole;

pub const RUN_OPERATION: &str = "run";

/// An agent: role prompt, model and the tools it may call.
///
/// Tools are accepted raw and bound through the agent's [`ToolBinder`], so
/// an agent only ever holds sanitizing tools.
pub struct AgentSpec {
    pub name: String,
    pub role: AgentRole,
    pub model: String,
    pub description: String,
    pub instruction: String,
    binder: ToolBinder,
    tools: Vec<Arc<dyn SafeTool>>,
}

impl AgentSpec {
    /// Agent with the role's default name, description and instruction.
    pub fn new(role: AgentRole, model: impl Into<String>) -> Self {
        Self {
            name: role.agent_name().to_string(),
            role,
            model: model.into(),
            description: role.description().to_string(),
            instruction: prompts::instruction(role),
            binder: ToolBinder::default(),
            tools: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Binder applied to tools added after this call.
    pub fn with_binder(mut self, binder: ToolBinder) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        debug!("Binding tool {} to agent {}", tool.name(), self.name);
        self.tools.push(self.binder.bind(tool));
        self
    }

    /// Add a tool that is already behind a sanitizing boundary.
    pub fn with_bound_tool(mut self, tool: Arc<dyn SafeTool>) -> Self {
        debug!("Adding bound tool {} to agent {}", tool.name(), self.name);
        self.tools.push(tool);
        self
    }

    pub fn with_tools(self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        tools.into_iter().fold(self, |spec, tool| spec.with_tool(tool))
    }

    pub fn tools(&self) -> &[Arc<dyn SafeTool>] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<Arc<dyn SafeTool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Call one of the agent's tools.
    pub async fn invoke_tool(
        &self,
        tool: &str,
        operation: &str,
        args: Value,
    ) -> AgentResult<ToolResult> {
        let tool = self
            .tool(tool)
            .ok_or_else(|| AgentError::tool_not_found(&self.name, tool))?;
        Ok(tool.call(operation, args).await?)
    }

    /// Serializable summary.
    pub fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            name: self.name.clone(),
            role: self.role,
            model: self.model.clone(),
            description: self.description.clone(),
            tools: self
                .tools
                .iter()
                .map(|t| ToolDescriptor {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    operations: t.operations().into_iter().map(|op| op.name).collect(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.model)
            .field("tools", &self.tool_names())
            .finish()
    }
}

/// What an agent is and which tools it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub role: AgentRole,
    pub model: String,
    pub description: String,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub operations: Vec<String>,
}

/// Runs an agent against a language model.
///
/// The model loop lives outside this crate. Implementations send
/// `agent.instruction` and the request to the configured provider, call the
/// agent's tools through [`AgentSpec::invoke_tool`] whenever the model asks
/// for one, and return the final answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn run(&self, agent: &AgentSpec, request: &str) -> InvokeResult<RawValue>;
}

/// Model client used when no provider is attached.
#[derive(Debug, Clone, Default)]
pub struct UnattachedModel;

#[async_trait]
impl ModelClient for UnattachedModel {
    async fn run(&self, agent: &AgentSpec, _request: &str) -> InvokeResult<RawValue> {
        Err(ToolError::Unavailable(format!(
            "no model client attached for agent {} ({})",
            agent.name, agent.model
        )))
    }
}

/// An agent callable as a tool by another agent.
pub struct AgentTool {
    agent: Arc<AgentSpec>,
    model: Arc<dyn ModelClient>,
}

impl AgentTool {
    pub fn new(agent: Arc<AgentSpec>, model: Arc<dyn ModelClient>) -> Self {
        Self { agent, model }
    }

    pub fn agent(&self) -> &Arc<AgentSpec> {
        &self.agent
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.agent.name
    }

    fn description(&self) -> &str {
        &self.agent.description
    }

    fn operations(&self) -> Vec<Operation> {
        vec![Operation::new(RUN_OPERATION, self.agent.description.clone()).param(
            "request",
            "string",
            "Task for the agent, including everything it needs from earlier steps",
        )]
    }

    fn attribute(&self, name: &str) -> Option<RawValue> {
        match name {
            "model" => Some(RawValue::from(self.agent.model.as_str())),
            "role" => Some(RawValue::from(self.agent.role.as_str())),
            _ => None,
        }
    }

    async fn call(&self, operation: &str, args: Value) -> InvokeResult<RawValue> {
        if operation != RUN_OPERATION {
            return Err(ToolError::UnknownOperation(operation.to_string()));
        }
        let request = mend_tools::tool::required_str(&args, operation, "request")?;
        self.model.run(&self.agent, &request).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("agent", &self.agent.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_tools::{AdapterError, MockResponse, MockTool};
    use serde_json::json;

    fn analysis_agent() -> AgentSpec {
        AgentSpec::new(AgentRole::CodeAnalysis, "gemini-2.5-flash").with_tool(Arc::new(
            MockTool::new("get_issue").add_response(MockResponse::value(RawValue::mapping([
                ("number", RawValue::from(7)),
                ("url", RawValue::url("https://github.com/acme/api/issues/7").unwrap()),
            ]))),
        ))
    }

    #[test]
    fn test_spec_defaults_from_role() {
        let spec = AgentSpec::new(AgentRole::CodeFixer, "gemini-2.5-flash");
        assert_eq!(spec.name, "code_fixer_agent");
        assert_eq!(spec.instruction, prompts::CODE_FIXER_INSTRUCTION);
        assert!(spec.tools().is_empty());
    }

    #[tokio::test]
    async fn test_bound_tools_are_sanitized() {
        let spec = analysis_agent();
        let result = spec
            .invoke_tool("get_issue", "get_issue", json!({"issue_number": 7}))
            .await
            .unwrap();
        assert_eq!(result, json!({"number": 7, "url": "https://github.com/acme/api/issues/7"}));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let err = analysis_agent()
            .invoke_tool("create_pull_request", "create_pull_request", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound { .. }));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = analysis_agent().descriptor();
        assert_eq!(descriptor.role, AgentRole::CodeAnalysis);
        assert_eq!(descriptor.tools[0].name, "get_issue");
        assert_eq!(descriptor.tools[0].operations, vec!["get_issue"]);

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["role"], "code_analysis");
    }

    #[tokio::test]
    async fn test_agent_tool_output_is_sanitized() {
        let mut model = MockModelClient::new();
        model
            .expect_run()
            .withf(|agent, request| {
                agent.name == "code_analysis_agent"
                    && agent.instruction.contains("root cause")
                    && request == "analyze NPE"
            })
            .times(1)
            .returning(|_, _| {
                Ok(RawValue::mapping([(
                    "report",
                    RawValue::url("https://github.com/acme/api/blob/main/Order.java").unwrap(),
                )]))
            });

        let agent_tool = AgentTool::new(Arc::new(analysis_agent()), Arc::new(model));
        let orchestrator = AgentSpec::new(AgentRole::Orchestrator, "gemini-2.5-flash")
            .with_tool(Arc::new(agent_tool));

        let result = orchestrator
            .invoke_tool("code_analysis_agent", RUN_OPERATION, json!({"request": "analyze NPE"}))
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({"report": "https://github.com/acme/api/blob/main/Order.java"})
        );
    }

    /// Calls one of the agent's own tools and answers with its result.
    struct IssueReadingModel;

    #[async_trait]
    impl ModelClient for IssueReadingModel {
        async fn run(&self, agent: &AgentSpec, request: &str) -> InvokeResult<RawValue> {
            let issue = agent
                .invoke_tool("get_issue", "get_issue", json!({"issue_number": 7}))
                .await
                .map_err(|e| ToolError::Failed(e.to_string()))?;
            Ok(RawValue::mapping([
                ("request", RawValue::from(request)),
                ("issue", RawValue::from(issue)),
            ]))
        }
    }

    #[tokio::test]
    async fn test_model_reaches_agent_tools_through_the_boundary() {
        let agent_tool = AgentTool::new(Arc::new(analysis_agent()), Arc::new(IssueReadingModel));
        let result = agent_tool
            .call(RUN_OPERATION, json!({"request": "triage #7"}))
            .await
            .unwrap();

        // The issue URL was already a plain string when the model saw it.
        let RawValue::Mapping(entries) = &result else {
            panic!("unexpected result: {result:?}");
        };
        let RawValue::Mapping(issue) = &entries["issue"] else {
            panic!("unexpected issue: {:?}", entries["issue"]);
        };
        assert!(matches!(&issue["url"], RawValue::String(url) if url == "https://github.com/acme/api/issues/7"));
        assert_eq!(
            mend_core::sanitize(&result).unwrap(),
            json!({
                "request": "triage #7",
                "issue": {"number": 7, "url": "https://github.com/acme/api/issues/7"},
            })
        );
    }

    #[tokio::test]
    async fn test_unattached_model_reports_unavailable() {
        let agent_tool = AgentTool::new(Arc::new(analysis_agent()), Arc::new(UnattachedModel));
        let err = agent_tool
            .call(RUN_OPERATION, json!({"request": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));

        let orchestrator = AgentSpec::new(AgentRole::Orchestrator, "m").with_tool(Arc::new(agent_tool));
        let err = orchestrator
            .invoke_tool("code_analysis_agent", RUN_OPERATION, json!({"request": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Adapter(AdapterError::Tool(ToolError::Unavailable(_)))));
    }
}
