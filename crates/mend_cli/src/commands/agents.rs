//! Agents command - List the assembled agents.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use mend_agents::{assemble, AgentRegistry, ExternalTools, UnattachedModel};
use mend_core::MendConfig;
use mend_tools::{Tool, ToolboxClient};

use super::GlobalArgs;

#[derive(Args)]
pub struct AgentsArgs {
    /// Print agent descriptors as JSON
    #[arg(long)]
    json: bool,

    /// Load the ticket toolset from the configured toolbox server
    #[arg(long)]
    connect: bool,
}

pub async fn execute(args: AgentsArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?;

    let mut external = ExternalTools::new();
    if args.connect {
        if let Some(tickets) = connect_tickets(&config).await {
            external = external.with_tickets(tickets);
        }
    }

    let registry = assemble(&config, external, Arc::new(UnattachedModel))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&registry.descriptors())?);
        return Ok(());
    }

    print_registry(&registry, &config);
    Ok(())
}

/// Load the ticket toolset, skipping it when the server cannot be reached.
async fn connect_tickets(config: &MendConfig) -> Option<Arc<dyn Tool>> {
    info!("Connecting to toolbox at {}", config.toolbox_url);
    let client = match ToolboxClient::new(&config.toolbox_url)
        .and_then(|client| client.with_timeout(config.tools.timeout()))
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not initialize toolbox client: {}", e);
            return None;
        }
    };
    match client.load_toolset(&config.tickets_toolset).await {
        Ok(toolset) => Some(Arc::new(
            toolset.with_repeatable(config.tools.repeatable_operations.iter().cloned()),
        )),
        Err(e) => {
            warn!("Could not load toolset {}: {}", config.tickets_toolset, e);
            None
        }
    }
}

fn print_registry(registry: &AgentRegistry, config: &MendConfig) {
    println!("🤖 Agents (model: {})", config.model);
    println!();
    for descriptor in registry.descriptors() {
        println!("  {} [{}]", descriptor.name, descriptor.role);
        println!("     {}", descriptor.description);
        if descriptor.tools.is_empty() {
            println!("     (no tools)");
        }
        for tool in &descriptor.tools {
            println!("     🔧 {} ({} operations)", tool.name, tool.operations.len());
        }
        println!();
    }
}
