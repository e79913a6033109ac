//! # mend_agents
//!
//! Agents of the bug-triage workflow and the orchestrator that coordinates
//! them.
//!
//! Agents are configuration: a role, a model name, an instruction and a list
//! of tools. Every tool is bound through the sanitizing adapter, including
//! other agents exposed as tools, so whatever an agent receives is plain
//! JSON.
//!
//! The model loop itself runs behind the [`ModelClient`] trait, which
//! receives the [`AgentSpec`] so it can call the agent's own tools.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mend_agents::{assemble, ExternalTools, UnattachedModel};
//! use mend_core::MendConfig;
//!
//! let registry = assemble(
//!     &MendConfig::default(),
//!     ExternalTools::new(),
//!     Arc::new(UnattachedModel),
//! )
//! .unwrap();
//!
//! let orchestrator = registry.get_required("self_healing_agent").unwrap();
//! assert!(orchestrator.instruction.contains("code_fixer_agent"));
//! ```

pub mod agent;
pub mod assembly;
pub mod error;
pub mod prompts;
pub mod registry;
pub mod request;
pub mod roles;
pub mod workflow;

pub use agent::{
    AgentDescriptor, AgentSpec, AgentTool, ModelClient, ToolDescriptor, UnattachedModel,
    RUN_OPERATION,
};
pub use assembly::{assemble, ExternalTools};
pub use error::{AgentError, AgentResult};
pub use registry::AgentRegistry;
pub use request::{BugReportRequest, INPUT_FORMAT};
pub use roles::AgentRole;
pub use workflow::{Workflow, WorkflowBuilder, WorkflowStep};
