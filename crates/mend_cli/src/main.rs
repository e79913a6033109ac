//! mend CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Tool failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};
use mend_agents::AgentError;
use mend_core::ConfigError;
use mend_tools::{AdapterError, ToolError};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TOOL_FAILURE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mend=debug,info"
    } else if cli.quiet {
        "warn"
    } else {
        "mend=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let global = cli.global();
    let result = match cli.command {
        Commands::Agents(args) => commands::agents::execute(args, &global).await,
        Commands::Instruction(args) => commands::instruction::execute(args, &global).await,
        Commands::Sanitize(args) => commands::sanitize::execute(args, &global).await,
        Commands::Date(args) => commands::date::execute(args, &global).await,
        Commands::Toolset(args) => commands::toolset::execute(args, &global).await,
        Commands::Config(args) => commands::config::execute(args, &global).await,
        Commands::ValidateRequest(args) => commands::validate_request::execute(args, &global).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<AgentError>() {
            return match err {
                AgentError::NotFound(_) | AgentError::ToolNotFound { .. } => ExitCodes::INVALID_ARGS,
                AgentError::InvalidRequest(_)
                | AgentError::InvalidWorkflow(_)
                | AgentError::Config(_) => ExitCodes::VALIDATION_FAILURE,
                AgentError::Adapter(_) => ExitCodes::TOOL_FAILURE,
                AgentError::Serialization(_) => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return match err {
                ConfigError::Io { .. } => ExitCodes::GENERAL_ERROR,
                ConfigError::Parse { .. } | ConfigError::Invalid { .. } => {
                    ExitCodes::VALIDATION_FAILURE
                }
            };
        }
        if cause.downcast_ref::<AdapterError>().is_some() || cause.downcast_ref::<ToolError>().is_some() {
            return ExitCodes::TOOL_FAILURE;
        }
    }
    ExitCodes::GENERAL_ERROR
}
