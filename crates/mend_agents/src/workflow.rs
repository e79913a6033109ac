//! Declarative description of the orchestrated workflow.
//!
//! The orchestrator does not execute steps itself: the model reads the
//! rendered instruction and decides which agent to call next. A [`Workflow`]
//! only fixes the order, the data handed between steps and the rules the
//! model is told to follow.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};
use crate::request::INPUT_FORMAT;
use crate::roles::AgentRole;

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Agent that performs the step; `None` for steps the orchestrator does itself
    pub role: Option<AgentRole>,
    pub action: String,
}

impl WorkflowStep {
    pub fn new(role: AgentRole, action: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            action: action.into(),
        }
    }

    /// A step handled by the orchestrator without delegating.
    pub fn direct(action: impl Into<String>) -> Self {
        Self {
            role: None,
            action: action.into(),
        }
    }

    fn render(&self) -> String {
        match self.role {
            Some(role) => format!("Use {} to {}", role.agent_name(), self.action),
            None => self.action.clone(),
        }
    }
}

/// Ordered steps plus the rules the orchestrator follows between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub preamble: String,
    pub steps: Vec<WorkflowStep>,
    pub rules: Vec<String>,
    pub error_handling: Vec<String>,
    /// Attempts the tool adapter makes per call, shown to the model
    pub retry_attempts: u32,
}

impl Workflow {
    /// analyze → create ticket → fix and open a pull request → update ticket.
    pub fn self_healing() -> Self {
        WorkflowBuilder::new("self_healing")
            .preamble(
                "You are the main orchestrator for the bug fixing workflow. You coordinate\n\
                 the specialized agents below to take a reported bug from analysis to a\n\
                 reviewed fix.",
            )
            .direct_step("Receive the error logs and repository name as input")
            .step(AgentRole::CodeAnalysis, "analyze the issue and create a bug report")
            .step(AgentRole::TicketManagement, "create a ticket from the bug report")
            .step(AgentRole::CodeFixer, "implement the fix and open a pull request")
            .step(
                AgentRole::TicketManagement,
                "update the ticket with the pull request details",
            )
            .rule("Finish each step successfully before starting the next one")
            .rule("Pass the output of each step on to the agents that need it")
            .rule("Report progress and results clearly")
            .rule("Keep every response JSON-serializable")
            .error_handling("Provide clear status updates throughout the process")
            .error_handling("If a tool is unavailable, continue with the tools that remain")
            .build()
    }

    /// Agents the workflow delegates to, in first-use order.
    pub fn roles(&self) -> Vec<AgentRole> {
        let mut roles = Vec::new();
        for role in self.steps.iter().filter_map(|s| s.role) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Reject workflows the orchestrator cannot follow.
    pub fn validate(&self) -> AgentResult<()> {
        if self.steps.iter().all(|s| s.role.is_none()) {
            return Err(AgentError::InvalidWorkflow(format!(
                "workflow '{}' delegates to no agent",
                self.name
            )));
        }
        if self.roles().contains(&AgentRole::Orchestrator) {
            return Err(AgentError::InvalidWorkflow(format!(
                "workflow '{}' delegates to the orchestrator itself",
                self.name
            )));
        }
        Ok(())
    }

    fn retry_guidance(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.retry_attempts > 1 {
            lines.push(format!(
                "Calls that could not reach their service, and read-only calls that fail with a network or server error, are retried automatically, up to {} attempts. Agent runs and calls that change state are never repeated for you",
                self.retry_attempts
            ));
        } else {
            lines.push("Tool calls are not retried automatically".to_string());
        }
        lines.push(
            "If a step still fails, report which step failed and why, and stop the workflow"
                .to_string(),
        );
        lines
    }

    /// The orchestrator's instruction text.
    pub fn render_instruction(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.preamble.trim_end());
        let _ = writeln!(out);

        let _ = writeln!(out, "Workflow:");
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step.render());
        }

        if !self.rules.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Coordinate the workflow ensuring:");
            for rule in &self.rules {
                let _ = writeln!(out, "- {}", rule);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Input format expected:");
        let _ = writeln!(out, "{}", INPUT_FORMAT);

        let _ = writeln!(out);
        let _ = writeln!(out, "Error handling:");
        for line in self.retry_guidance().iter().chain(&self.error_handling) {
            let _ = writeln!(out, "- {}", line);
        }

        out
    }
}

/// Builder for workflows.
pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            workflow: Workflow {
                name: name.into(),
                preamble: String::new(),
                steps: Vec::new(),
                rules: Vec::new(),
                error_handling: Vec::new(),
                retry_attempts: 1,
            },
        }
    }

    pub fn preamble(mut self, text: impl Into<String>) -> Self {
        self.workflow.preamble = text.into();
        self
    }

    pub fn step(mut self, role: AgentRole, action: impl Into<String>) -> Self {
        self.workflow.steps.push(WorkflowStep::new(role, action));
        self
    }

    pub fn direct_step(mut self, action: impl Into<String>) -> Self {
        self.workflow.steps.push(WorkflowStep::direct(action));
        self
    }

    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.workflow.rules.push(rule.into());
        self
    }

    pub fn error_handling(mut self, line: impl Into<String>) -> Self {
        self.workflow.error_handling.push(line.into());
        self
    }

    pub fn build(self) -> Workflow {
        self.workflow
    }
}
