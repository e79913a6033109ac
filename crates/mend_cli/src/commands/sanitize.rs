//! Sanitize command - Convert a document the way tool results are converted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use mend_core::{RawValue, Sanitizer};

use super::{read_input, GlobalArgs};

#[derive(Args)]
pub struct SanitizeArgs {
    /// JSON or YAML file, `-` for stdin
    file: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// List values that were replaced by their string form
    #[arg(long)]
    report: bool,
}

pub async fn execute(args: SanitizeArgs, global: &GlobalArgs) -> Result<()> {
    let config = global.load_config()?;
    let text = read_input(&args.file)?;
    let raw = parse_document(&args.file, &text)?;

    let sanitizer = Sanitizer::new(config.sanitizer);
    let (safe, report) = sanitizer.sanitize_with_report(&raw)?;
    info!("Sanitized {} ({} fallbacks)", args.file.display(), report.len());

    let output = if args.compact {
        serde_json::to_string(&safe)?
    } else {
        serde_json::to_string_pretty(&safe)?
    };
    println!("{}", output);

    if args.report {
        if report.is_clean() {
            eprintln!("✅ No fallbacks");
        } else {
            eprintln!("⚠️  {} value(s) replaced by their string form:", report.len());
            for fallback in &report.fallbacks {
                eprintln!("   - {}: {}", fallback.path, fallback.reason);
            }
        }
    }

    Ok(())
}

/// JSON for `.json` files, YAML for everything else (YAML also reads JSON).
fn parse_document(path: &Path, text: &str) -> Result<RawValue> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let value: serde_json::Value = serde_json::from_str(text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Ok(RawValue::from(value))
    } else {
        let value: serde_yaml::Value = serde_yaml::from_str(text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        Ok(RawValue::from(value))
    }
}
