//! # Bistro Console
//!
//! Runs a scripted evening of service against `bistro-core` and prints the
//! resulting event journal.
//!
//! ## Usage
//! ```bash
//! # Narrated text (default)
//! cargo run -p bistro-console
//!
//! # JSON lines, one object per event
//! cargo run -p bistro-console -- --format json
//!
//! # Use an explicit config file
//! cargo run -p bistro-console -- --config ./bistro.toml
//!
//! # Write the effective config to the default location and exit
//! cargo run -p bistro-console -- --write-config
//!
//! # All options
//! cargo run -p bistro-console -- --help
//! ```
//!
//! ## Startup Sequence
//! ```text
//! args ──► BistroConfig::load ──► init_tracing ──► Registry::with_policy
//!                                                          │
//!             stdout ◄── Transcript::render ◄── scenario::run
//! ```

mod config;
mod error;
mod narrate;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use bistro_core::Registry;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{BistroConfig, OutputFormat};
use error::AppResult;

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "bistro")]
#[command(about = "Bistro console walkthrough")]
#[command(version)]
struct Args {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "BISTRO_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: text or json (default: from config)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Save the effective config and exit
    #[arg(long)]
    write_config: bool,
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> AppResult<()> {
    let mut config = BistroConfig::load(args.config.clone())?;
    if let Some(format) = args.format {
        config.output.format = format;
    }

    init_tracing(&config.output.log_filter);

    if args.write_config {
        return config.save(args.config);
    }

    info!(
        restaurant = %config.restaurant.name,
        format = %config.output.format,
        "Starting walkthrough"
    );

    let mut registry = Registry::with_policy(config.reward_policy())
        .with_journal_capacity(config.output.journal_capacity);
    let transcript = scenario::run(&mut registry, &config)?;

    print!("{}", transcript.render(config.output.format)?);

    info!(
        entries = transcript.entries().len(),
        rejected = transcript.rejections().count(),
        "Walkthrough finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = %err.code(), "{}", err);
            eprintln!("[{}] {}", err.code(), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let parsed =
            Args::try_parse_from(["bistro", "--format", "json", "-c", "bistro.toml"]).unwrap();
        assert_eq!(parsed.format, Some(OutputFormat::Json));
        assert_eq!(parsed.config, Some(PathBuf::from("bistro.toml")));
        assert!(!parsed.write_config);

        let parsed = Args::try_parse_from(["bistro", "--write-config"]).unwrap();
        assert!(parsed.write_config);
        assert_eq!(parsed.format, None);
    }

    #[test]
    fn test_parse_args_rejects_garbage() {
        assert!(Args::try_parse_from(["bistro", "--format"]).is_err());
        assert!(Args::try_parse_from(["bistro", "--format", "xml"]).is_err());
        assert!(Args::try_parse_from(["bistro", "--loud"]).is_err());
    }
}
