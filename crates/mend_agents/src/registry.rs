//! Registry of assembled agents.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::agent::{AgentDescriptor, AgentSpec};
use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;

/// Agents keyed by name.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentSpec>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Register an agent under its name, replacing any agent of that name.
    pub fn register(&mut self, agent: Arc<AgentSpec>) {
        debug!("Registering agent: {} ({})", agent.name, agent.role);
        self.agents.insert(agent.name.clone(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<AgentSpec>> {
        self.agents.get(name).cloned()
    }

    pub fn get_required(&self, name: &str) -> AgentResult<Arc<AgentSpec>> {
        self.get(name)
            .ok_or_else(|| AgentError::NotFound(name.to_string()))
    }

    /// First agent registered for a role.
    pub fn by_role(&self, role: AgentRole) -> Option<Arc<AgentSpec>> {
        self.sorted().into_iter().find(|a| a.role == role)
    }

    /// Look an agent up by name, role name or alias.
    pub fn resolve(&self, key: &str) -> AgentResult<Arc<AgentSpec>> {
        if let Some(agent) = self.get(key) {
            return Ok(agent);
        }
        let role: AgentRole = key.parse()?;
        self.by_role(role)
            .ok_or_else(|| AgentError::NotFound(key.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Names ordered by role, then name.
    pub fn names(&self) -> Vec<&str> {
        let mut agents: Vec<_> = self.agents.values().collect();
        agents.sort_by(|a, b| (a.role, &a.name).cmp(&(b.role, &b.name)));
        agents.into_iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<AgentSpec>> {
        debug!("Unregistering agent: {}", name);
        self.agents.remove(name)
    }

    /// Summaries of every agent, ordered like [`AgentRegistry::names`].
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.sorted().iter().map(|a| a.descriptor()).collect()
    }

    fn sorted(&self) -> Vec<Arc<AgentSpec>> {
        let mut agents: Vec<_> = self.agents.values().cloned().collect();
        agents.sort_by(|a, b| (a.role, &a.name).cmp(&(b.role, &b.name)));
        agents
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}
