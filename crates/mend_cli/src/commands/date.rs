//! Date command - Call the current date tool through the adapter.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use mend_tools::{CurrentDateTool, SafeTool, ToolBinder, CURRENT_DATE_TOOL};

use super::GlobalArgs;

#[derive(Args)]
pub struct DateArgs {
    /// Print only the date
    #[arg(long)]
    plain: bool,
}

pub async fn execute(args: DateArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?;
    let tool = ToolBinder::from_config(&config).bind(Arc::new(CurrentDateTool::new()));
    let result = tool.call(CURRENT_DATE_TOOL, json!({})).await?;

    if args.plain {
        println!("{}", result["current_date"].as_str().unwrap_or_default());
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
