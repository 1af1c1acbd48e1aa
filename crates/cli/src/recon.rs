//! `census recon`: config-driven roster merge and census reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use census_recon::model::ReconInput;
use census_recon::{CensusConfig, SourceRole};

use crate::exit_codes::{EXIT_DIFFERENCES, EXIT_INVALID_CONFIG, EXIT_IO};
use crate::{load_roster, to_json, CliError};

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  census recon run weekly.recon.toml
  census recon run weekly.recon.toml --json
  census recon run weekly.recon.toml --output result.json

Exit codes:
  0  no differences
  1  differences found")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  census recon validate weekly.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output } => cmd_recon_run(config, json, output),
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn load_config(config_path: &Path) -> Result<CensusConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| recon_err(EXIT_IO, format!("cannot read config: {e}")))?;
    CensusConfig::from_toml(&config_str).map_err(|e| recon_err(EXIT_INVALID_CONFIG, e.to_string()))
}

fn cmd_recon_run(config_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    log::debug!("{}: {} source(s) relative to {}", config.name, config.sources.len(), base_dir.display());

    let mut input = ReconInput::default();
    for source in &config.sources {
        let rows = load_roster(&base_dir.join(&source.file))?;
        input.insert(source.name.clone(), rows);
    }

    let result = census_recon::run(&config, &input).map_err(CliError::engine)?;

    let json_str = to_json(&result)?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_IO, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} merged row(s) from {} reference row(s) ({})",
        result.meta.config_name, s.merged_rows, s.reference_rows, result.meta.merge_policy,
    );
    eprintln!(
        "census: {} row(s), {} matched, {} unmatched, {} with differences ({} field(s))",
        s.current_rows, s.matched, s.unmatched, s.records_with_differences, s.field_differences,
    );
    eprintln!(
        "drafts: {} manager(s), {} unresolved employee(s)",
        s.authorities, s.unresolved_owners,
    );

    if s.records_with_differences > 0 {
        return Err(recon_err(EXIT_DIFFERENCES, "differences found"));
    }
    Ok(())
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let count = |role: SourceRole| config.sources_with_role(role).count();
    eprintln!(
        "valid: '{}' with {} reference source(s), {} current, {} directory ({} merge)",
        config.name,
        count(SourceRole::Reference),
        count(SourceRole::Current),
        count(SourceRole::Directory),
        config.merge,
    );
    Ok(())
}
