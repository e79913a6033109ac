//! Instruction command - Print the instruction an agent runs with.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use mend_agents::{assemble, ExternalTools, UnattachedModel};

use super::GlobalArgs;

#[derive(Args)]
pub struct InstructionArgs {
    /// Agent name, role or alias (e.g. self_healing_agent, fixer, jira)
    #[arg(default_value = "self_healing_agent")]
    agent: String,
}

pub async fn execute(args: InstructionArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?;
    let registry = assemble(&config, ExternalTools::new(), Arc::new(UnattachedModel))?;
    let agent = registry.resolve(&args.agent)?;

    if !global.quiet {
        println!("# {} ({})", agent.name, agent.model);
        println!();
    }
    println!("{}", agent.instruction.trim_end());
    Ok(())
}
