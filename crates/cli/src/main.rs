// census - roster merge and weekly census reconciliation from the shell

mod exit_codes;
mod recon;
mod review;
mod roster;
mod util;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use census_recon::{ReconError, TabularRecord};
use exit_codes::{engine_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "census")]
#[command(about = "Merge employee rosters and reconcile the weekly census against them")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge rosters keyed by employee ID (later files win per field)
    #[command(after_help = "\
Examples:
  census merge resource.xlsx manager.xlsx -o combined.xlsx
  census merge resource.csv manager.csv --policy fill-missing --json
  census merge a.csv b.csv c.csv --min-sources 3")]
    Merge {
        /// Roster files, in merge order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Non-empty rosters required before merging (default: all files)
        #[arg(long)]
        min_sources: Option<usize>,

        /// How rosters are combined
        #[arg(long, value_enum, default_value = "overlay")]
        policy: PolicyArg,

        /// Identifier column
        #[arg(long, default_value = census_recon::record::DEFAULT_IDENTIFIER_COLUMN)]
        id_column: String,

        /// Write the merged roster (.csv, .tsv, .xlsx or .json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Field-level differences between the current census and reference rosters
    #[command(after_help = "\
Examples:
  census diff --current census.xlsx --reference resource.xlsx manager.xlsx
  census diff --current census.csv --reference combined.csv --json
  census diff --current census.csv --reference resource.csv manager.csv --policy fill-missing

Exit codes:
  0  no differences
  1  differences found")]
    Diff {
        /// Current-week census file
        #[arg(long)]
        current: PathBuf,

        /// Reference rosters, merged in order before comparing
        #[arg(long, required = true, num_args = 1..)]
        reference: Vec<PathBuf>,

        /// How reference rosters are combined
        #[arg(long, value_enum, default_value = "overlay")]
        policy: PolicyArg,

        /// Identifier column
        #[arg(long, default_value = census_recon::record::DEFAULT_IDENTIFIER_COLUMN)]
        id_column: String,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compose one draft email per manager from census differences
    #[command(after_help = "\
Examples:
  census compose --current census.xlsx --reference resource.xlsx manager.xlsx
  census compose --current census.csv --reference resource.csv --out-dir drafts/
  census compose --current census.csv --reference resource.csv manager.csv --policy fill-missing
  census compose --current census.csv --reference resource.csv --directory staff.csv --json")]
    Compose {
        /// Current-week census file
        #[arg(long)]
        current: PathBuf,

        /// Reference rosters, merged in order before comparing
        #[arg(long, required = true, num_args = 1..)]
        reference: Vec<PathBuf>,

        /// How reference rosters are combined
        #[arg(long, value_enum, default_value = "overlay")]
        policy: PolicyArg,

        /// Roster used to resolve managers (default: first reference roster)
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Link to the full report, added to every draft
        #[arg(long, env = "CENSUS_REPORT_URL")]
        report_url: Option<String>,

        /// Sign-off line
        #[arg(long, default_value = "Your Team")]
        signature: String,

        /// Write each draft body as an HTML file into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Identifier column
        #[arg(long, default_value = census_recon::record::DEFAULT_IDENTIFIER_COLUMN)]
        id_column: String,

        /// Output JSON to stdout instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Resolve which employees a manager may edit
    #[command(after_help = "\
Examples:
  census grant --directory resource.xlsx --email jenny.manager@example.com
  census grant --directory resource.csv --email kandy@example.com --json")]
    Grant {
        /// Roster with Manager, Name and email columns
        #[arg(long)]
        directory: PathBuf,

        /// Manager email (exact, case-sensitive)
        #[arg(long)]
        email: String,

        /// Identifier column
        #[arg(long, default_value = census_recon::record::DEFAULT_IDENTIFIER_COLUMN)]
        id_column: String,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Config-driven reconciliation
    #[command(subcommand)]
    Recon(recon::ReconCommands),
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Later rosters overwrite earlier ones per field
    Overlay,
    /// First roster wins; later rosters only fill columns it lacks
    FillMissing,
}

impl From<PolicyArg> for census_recon::MergePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Overlay => census_recon::MergePolicy::Overlay,
            PolicyArg::FillMissing => census_recon::MergePolicy::FillMissing,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  census-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: census <command> [options]");
            eprintln!("       census --help for more information");
            Ok(())
        }
        Some(Commands::Merge { files, min_sources, policy, id_column, output, json }) => {
            roster::cmd_merge(files, min_sources, policy.into(), id_column, output, json)
        }
        Some(Commands::Diff { current, reference, policy, id_column, json }) => {
            roster::cmd_diff(current, reference, policy.into(), id_column, json)
        }
        Some(Commands::Compose {
            current,
            reference,
            policy,
            directory,
            report_url,
            signature,
            out_dir,
            id_column,
            json,
        }) => review::cmd_compose(review::ComposeArgs {
            current,
            reference,
            policy: policy.into(),
            directory,
            report_url,
            signature,
            out_dir,
            id_column,
            json,
        }),
        Some(Commands::Grant { directory, email, id_column, json }) => {
            review::cmd_grant(directory, email, id_column, json)
        }
        Some(Commands::Recon(cmd)) => recon::cmd_recon(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the registry's exit code.
    pub fn engine(err: ReconError) -> Self {
        let code = engine_exit_code(&err);
        let hint = match &err {
            ReconError::MissingInput { required, .. } => {
                Some(format!("provide {required} non-empty roster(s) before merging"))
            }
            ReconError::UnknownAuthority { .. } => {
                Some("emails match exactly, including case".to_string())
            }
            ReconError::NoManagedEmployees { .. } => {
                Some("no directory row lists this person as Manager".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Read one roster file. Unsupported extensions are usage errors; anything
/// else that fails is an I/O error.
pub(crate) fn load_roster(path: &Path) -> Result<Vec<TabularRecord>, CliError> {
    if census_io::Format::from_path(path).is_none() {
        return Err(CliError::args(format!("unsupported file type: {}", path.display()))
            .with_hint("use .csv, .tsv, .xlsx, .xls, .ods or .json"));
    }
    census_io::read_rows(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

pub(crate) fn load_rosters(paths: &[PathBuf]) -> Result<Vec<Vec<TabularRecord>>, CliError> {
    paths.iter().map(|p| load_roster(p)).collect()
}

/// Pretty JSON for stdout / `--output`.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError { code: exit_codes::EXIT_INTERNAL, message: format!("JSON serialization error: {e}"), hint: None })
}
