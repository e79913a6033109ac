//! CLI command definitions.
//!
//! This module defines the command structure for the mend CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use mend_core::MendConfig;

pub mod agents;
pub mod config;
pub mod date;
pub mod instruction;
pub mod sanitize;
pub mod toolset;
pub mod validate_request;

/// mend - self-healing bug triage agents
#[derive(Parser)]
#[command(name = "mend")]
#[command(version, about = "mend - self-healing bug triage agents")]
#[command(long_about = r#"
mend wires an orchestrator and its specialist agents (code analysis, ticket
management, code fixing, web search) around a sanitizing tool boundary: every
tool result an agent sees is plain JSON.

COMMANDS:
  agents            → List the assembled agents and their tools
  instruction       → Print the instruction of one agent
  sanitize          → Convert a JSON or YAML document the way tool results are converted
  date              → Call the current date tool
  toolset           → Inspect or call a toolset on an MCP Toolbox server
  config            → Show the effective configuration
  validate-request  → Check a bug report request before handing it to the orchestrator

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Tool failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Settings file (defaults to .mend/settings.yaml in the workspace)
    #[arg(short, long, global = true, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace root
    #[arg(short, long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn global(&self) -> GlobalArgs {
        GlobalArgs {
            config: self.config.clone(),
            workspace: self.workspace.clone(),
            quiet: self.quiet,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the assembled agents and their tools
    Agents(agents::AgentsArgs),

    /// Print an agent's instruction
    Instruction(instruction::InstructionArgs),

    /// Sanitize a JSON or YAML document
    Sanitize(sanitize::SanitizeArgs),

    /// Print the current date as the date tool reports it
    Date(date::DateArgs),

    /// Inspect or call a toolset on an MCP Toolbox server
    Toolset(toolset::ToolsetArgs),

    /// Show the effective configuration (secrets redacted)
    Config(config::ConfigArgs),

    /// Validate a bug report request
    #[command(name = "validate-request")]
    ValidateRequest(validate_request::ValidateRequestArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub workspace: PathBuf,
    pub quiet: bool,
}

impl GlobalArgs {
    /// Defaults, then the settings file, then the environment.
    pub fn load_config(&self) -> Result<MendConfig> {
        let config = match &self.config {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                let mut config = MendConfig::from_file(path)?;
                config.apply_env(|key| std::env::var(key).ok())?;
                config.validate()?;
                config
            }
            None => MendConfig::load(&self.workspace)?,
        };
        Ok(config)
    }

    /// Where settings were read from, for display.
    pub fn settings_source(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| MendConfig::find_settings_file(&self.workspace))
    }
}

/// Read a file argument, `-` meaning stdin.
pub fn read_input(path: &std::path::Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
