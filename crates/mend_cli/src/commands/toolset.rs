//! Toolset command - Inspect or call a toolset on an MCP Toolbox server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::info;

use mend_tools::{SafeTool, Tool, ToolBinder, ToolboxClient};

use super::GlobalArgs;

#[derive(Args)]
pub struct ToolsetArgs {
    /// Toolset name (defaults to the configured ticket toolset)
    name: Option<String>,

    /// Toolbox server URL (defaults to MCP_TOOLBOX_URL / settings)
    #[arg(long)]
    url: Option<String>,

    /// Invoke this tool of the toolset instead of listing it
    #[arg(long)]
    invoke: Option<String>,

    /// JSON arguments for --invoke
    #[arg(long, default_value = "{}", requires = "invoke")]
    args: String,

    /// Print the toolset listing as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ToolsetArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?;
    let url = args.url.unwrap_or_else(|| config.toolbox_url.clone());
    let name = args.name.unwrap_or_else(|| config.tickets_toolset.clone());

    info!("Loading toolset {} from {}", name, url);
    let client = ToolboxClient::new(&url)?.with_timeout(config.tools.timeout())?;
    let toolset = client
        .load_toolset(&name)
        .await
        .with_context(|| format!("Failed to load toolset {} from {}", name, url))?
        .with_repeatable(config.tools.repeatable_operations.iter().cloned());

    if let Some(operation) = args.invoke {
        let call_args: Value = serde_json::from_str(&args.args)
            .with_context(|| format!("--args is not valid JSON: {}", args.args))?;
        let tool = ToolBinder::from_config(&config).bind(Arc::new(toolset));
        let result = tool.call(&operation, call_args).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let operations = toolset.operations();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&operations)?);
        return Ok(());
    }

    println!(
        "🧰 {} ({} tools, server {})",
        toolset.name(),
        operations.len(),
        toolset.server_version()
    );
    for op in &operations {
        println!();
        println!("  {}", op.name);
        if !op.description.is_empty() {
            println!("     {}", op.description);
        }
        for p in &op.parameters {
            let marker = if p.required { "" } else { " (optional)" };
            println!("     - {}: {}{} {}", p.name, p.kind, marker, p.description);
        }
    }
    Ok(())
}
