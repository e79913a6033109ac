//! Config command - Show the effective configuration.

use anyhow::Result;
use clap::Args;

use super::GlobalArgs;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print as JSON instead of YAML
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?.redacted();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if !global.quiet {
        match global.settings_source() {
            Some(path) => println!("# Settings file: {}", path.display()),
            None => println!("# No settings file; defaults and environment only"),
        }
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
