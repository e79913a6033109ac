//! Assembles the standard set of agents.

use std::sync::Arc;

use tracing::{info, warn};

use mend_core::MendConfig;
use mend_tools::{CodeContextTool, CodeRetriever, CurrentDateTool, FilteredTool, Tool, ToolBinder};

use crate::agent::{AgentSpec, AgentTool, ModelClient};
use crate::error::{AgentError, AgentResult};
use crate::registry::AgentRegistry;
use crate::roles::AgentRole;
use crate::workflow::Workflow;

const GITHUB_ANALYSIS_TOOL: &str = "github_analysis";
const GITHUB_PULL_REQUEST_TOOL: &str = "github_pull_requests";

/// External tools the agents are wired to.
///
/// Each one is optional. A missing tool is skipped and the agents that would
/// have used it are assembled without it.
#[derive(Default, Clone)]
pub struct ExternalTools {
    /// Web search, given to the search agent
    pub web_search: Option<Arc<dyn Tool>>,
    /// StackOverflow search
    pub stackoverflow: Option<Arc<dyn Tool>>,
    /// Ticket toolsets, e.g. loaded from an MCP Toolbox
    pub tickets: Vec<Arc<dyn Tool>>,
    /// The GitHub MCP toolset, unfiltered
    pub github: Option<Arc<dyn Tool>>,
    /// Index of the repository's code
    pub code_retriever: Option<Arc<dyn CodeRetriever>>,
}

impl ExternalTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_web_search(mut self, tool: Arc<dyn Tool>) -> Self {
        self.web_search = Some(tool);
        self
    }

    pub fn with_stackoverflow(mut self, tool: Arc<dyn Tool>) -> Self {
        self.stackoverflow = Some(tool);
        self
    }

    pub fn with_tickets(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tickets.push(tool);
        self
    }

    pub fn with_github(mut self, tool: Arc<dyn Tool>) -> Self {
        self.github = Some(tool);
        self
    }

    pub fn with_code_retriever(mut self, retriever: Arc<dyn CodeRetriever>) -> Self {
        self.code_retriever = Some(retriever);
        self
    }
}

impl std::fmt::Debug for ExternalTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalTools")
            .field("web_search", &self.web_search.as_ref().map(|t| t.name().to_string()))
            .field("stackoverflow", &self.stackoverflow.as_ref().map(|t| t.name().to_string()))
            .field("tickets", &self.tickets.iter().map(|t| t.name().to_string()).collect::<Vec<_>>())
            .field("github", &self.github.as_ref().map(|t| t.name().to_string()))
            .field("code_retriever", &self.code_retriever.is_some())
            .finish()
    }
}

/// Build the orchestrator and its specialist agents.
///
/// External tools get the configured per-call timeout and retry policy. A
/// sub-agent called as a tool runs a whole multi-step task, so it gets the
/// agent run timeout and is never retried.
pub fn assemble(
    config: &MendConfig,
    external: ExternalTools,
    model: Arc<dyn ModelClient>,
) -> AgentResult<AgentRegistry> {
    config.validate()?;

    let binder = ToolBinder::from_config(config);
    let agent_runs = ToolBinder::agent_runs(config);
    let agent_tool =
        |agent: Arc<AgentSpec>| agent_runs.bind(Arc::new(AgentTool::new(agent, model.clone())));
    let new_agent = |role: AgentRole| AgentSpec::new(role, config.model.clone()).with_binder(binder.clone());
    let date: Arc<dyn Tool> = Arc::new(CurrentDateTool::new());
    let mut registry = AgentRegistry::new();

    let github_read: Option<Arc<dyn Tool>> = external.github.clone().map(|github| {
        Arc::new(FilteredTool::github_read_only(github).named(GITHUB_ANALYSIS_TOOL)) as Arc<dyn Tool>
    });
    let github_write: Option<Arc<dyn Tool>> = external.github.clone().map(|github| {
        Arc::new(FilteredTool::github_pull_requests(github).named(GITHUB_PULL_REQUEST_TOOL))
            as Arc<dyn Tool>
    });
    if external.github.is_none() {
        warn!("GitHub toolset not available; analysis and fixer agents run without it");
    }

    // Search
    let search = match external.web_search {
        Some(web_search) => {
            let agent = Arc::new(new_agent(AgentRole::Search).with_tool(web_search));
            registry.register(agent.clone());
            Some(agent)
        }
        None => {
            warn!("Web search tool not available; skipping {}", AgentRole::Search.agent_name());
            None
        }
    };

    // Code analysis
    let mut analysis = new_agent(AgentRole::CodeAnalysis);
    if let Some(search) = search {
        analysis = analysis.with_bound_tool(agent_tool(search));
    }
    analysis = analysis.with_tool(date.clone());
    match external.stackoverflow {
        Some(tool) => analysis = analysis.with_tool(tool),
        None => warn!("StackOverflow tool not available"),
    }
    if let Some(github) = &github_read {
        analysis = analysis.with_tool(github.clone());
    }
    match external.code_retriever {
        Some(retriever) => {
            let tool = CodeContextTool::new(retriever).with_default_k(config.retriever.top_k);
            analysis = analysis.with_tool(Arc::new(tool));
        }
        None => warn!("Code index not available; code context retrieval disabled"),
    }
    let analysis = Arc::new(analysis);
    registry.register(analysis.clone());

    // Ticket management
    if external.tickets.is_empty() {
        warn!("No ticket tools available; ticket agent can only report the date");
    }
    let tickets = Arc::new(
        new_agent(AgentRole::TicketManagement)
            .with_tools(external.tickets)
            .with_tool(date.clone()),
    );
    registry.register(tickets.clone());

    // Code fixer
    let mut fixer = new_agent(AgentRole::CodeFixer).with_tool(date.clone());
    if let Some(github) = github_write {
        fixer = fixer.with_tool(github);
    }
    if let Some(github) = github_read {
        fixer = fixer.with_tool(github);
    }
    let fixer = Arc::new(fixer);
    registry.register(fixer.clone());

    // Orchestrator
    let workflow = Workflow::self_healing().with_retry_attempts(config.tools.max_attempts);
    workflow.validate()?;
    let mut orchestrator = new_agent(AgentRole::Orchestrator).with_instruction(workflow.render_instruction());
    for role in workflow.roles() {
        let agent = registry.by_role(role).ok_or_else(|| {
            AgentError::InvalidWorkflow(format!("no agent registered for role {}", role))
        })?;
        orchestrator = orchestrator.with_bound_tool(agent_tool(agent));
    }
    orchestrator = orchestrator.with_tool(date);
    registry.register(Arc::new(orchestrator));

    info!("Assembled {} agents: {}", registry.len(), registry.names().join(", "));
    Ok(registry)
}
