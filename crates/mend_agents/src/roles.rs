//! Agent role definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Roles in the bug-triage workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Orchestrator,
    CodeAnalysis,
    TicketManagement,
    CodeFixer,
    Search,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator",
            AgentRole::CodeAnalysis => "code_analysis",
            AgentRole::TicketManagement => "ticket_management",
            AgentRole::CodeFixer => "code_fixer",
            AgentRole::Search => "search",
        }
    }

    /// Name the agent for this role is registered under.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "self_healing_agent",
            AgentRole::CodeAnalysis => "code_analysis_agent",
            AgentRole::TicketManagement => "jira_management_agent",
            AgentRole::CodeFixer => "code_fixer_agent",
            AgentRole::Search => "search_agent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "Coordinates analysis, ticketing and fixing of a reported bug",
            AgentRole::CodeAnalysis => "Finds the root cause of a bug and writes a bug report",
            AgentRole::TicketManagement => "Creates and updates tickets in the issue tracker",
            AgentRole::CodeFixer => "Implements fixes on a branch and opens pull requests",
            AgentRole::Search => "Searches the web for documentation and known issues",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            AgentRole::Orchestrator,
            AgentRole::CodeAnalysis,
            AgentRole::TicketManagement,
            AgentRole::CodeFixer,
            AgentRole::Search,
        ]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let role = match normalized.as_str() {
            "orchestrator" | "self_healing" | "self_healing_agent" => AgentRole::Orchestrator,
            "code_analysis" | "analysis" | "analyst" | "code_analysis_agent" => {
                AgentRole::CodeAnalysis
            }
            "ticket_management" | "tickets" | "jira" | "jira_management_agent" => {
                AgentRole::TicketManagement
            }
            "code_fixer" | "fixer" | "code_fixer_agent" => AgentRole::CodeFixer,
            "search" | "search_agent" => AgentRole::Search,
            _ => return Err(AgentError::NotFound(s.to_string())),
        };
        Ok(role)
    }
}
