//! Validate-request command - Check a bug report request.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use mend_agents::BugReportRequest;

use super::{read_input, GlobalArgs};

#[derive(Args)]
pub struct ValidateRequestArgs {
    /// Request file (JSON), `-` for stdin
    #[arg(required_unless_present = "example")]
    file: Option<PathBuf>,

    /// Print an example request instead
    #[arg(long)]
    example: bool,
}

pub async fn execute(args: ValidateRequestArgs, global: &GlobalArgs) -> Result<()> {
    if args.example {
        println!("{}", serde_json::to_string_pretty(&BugReportRequest::example())?);
        return Ok(());
    }

    let Some(path) = args.file else {
        anyhow::bail!("Missing argument: request file");
    };
    let request = BugReportRequest::from_json(&read_input(&path)?)?;

    if !global.quiet {
        println!("✅ Request is valid");
        println!("   Repository: {}", request.repo_name);
        println!("   Error logs: {} lines", request.error_logs.lines().count());
        if !request.additional_context.is_empty() {
            println!("   Context:    {}", request.additional_context);
        }
    }
    Ok(())
}
