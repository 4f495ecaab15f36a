// opaef CLI - grouping and reconciliation over annual collection ledgers

mod exit_codes;
mod output;
mod render;
mod tree;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use opaef_ledger::LedgerError;
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_MISMATCH, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "opaef")]
#[command(about = "Group and reconcile annual tax-collection ledgers")]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the grouping tree for a ledger
    #[command(after_help = "\
Examples:
  opaef tree ledger.csv
  opaef tree ledger.csv --config grouping.toml
  opaef tree ledger.csv --config grouping.toml --recognition --json
  opaef tree ledger.csv --write-offs --output datas.json")]
    Tree {
        /// Ledger CSV export
        ledger: PathBuf,

        /// Grouping config (TOML); defaults to year + concept
        #[arg(long, short = 'c', env = "OPAEF_GROUPING")]
        config: Option<PathBuf>,

        /// Split OPAEF-managed records into their recognition year
        #[arg(long)]
        recognition: bool,

        /// Only records carrying a write-off (datas)
        #[arg(long)]
        write_offs: bool,

        /// Output JSON to stdout instead of the text tree
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Reconcile computed sums against documented totals
    #[command(after_help = "\
Examples:
  opaef validate ledger.csv
  opaef validate ledger.csv --documented totals.toml
  opaef validate ledger.csv --documented totals.toml --json

Exit code 3 when any field differs by more than 0.01.")]
    Validate {
        /// Ledger CSV export
        ledger: PathBuf,

        /// Documented totals (TOML) overriding the ones derived from the ledger
        #[arg(long, short = 'd')]
        documented: Option<PathBuf>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Check a grouping config without running
    #[command(after_help = "\
Examples:
  opaef check-config grouping.toml")]
    CheckConfig {
        /// Grouping config (TOML)
        config: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Tree { ledger, config, recognition, write_offs, json, output } => {
            tree::cmd_tree(tree::TreeArgs { ledger, config, recognition, write_offs, json, output })
        }
        Commands::Validate { ledger, documented, json } => {
            validate::cmd_validate(ledger, documented, json)
        }
        Commands::CheckConfig { config } => validate::cmd_check_config(config),
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
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self { code: EXIT_MISMATCH, message: msg.into(), hint: None }
    }

    /// Map an engine error to its exit code. `source` names the file it came from.
    pub fn ledger(source: &std::path::Path, err: LedgerError) -> Self {
        let (code, hint) = match &err {
            LedgerError::ConfigParse(_) => (EXIT_INVALID_CONFIG, None),
            LedgerError::MissingColumn(_) => (
                EXIT_INPUT,
                Some("expected ENT, C_EJERCICIO, C_CONCEPTO, CLAVE_C, CLAVE_R and the amount columns"),
            ),
            LedgerError::YearParse { .. } | LedgerError::AmountParse { .. } | LedgerError::Csv(_) => {
                (EXIT_INPUT, None)
            }
            LedgerError::Io(_) => (EXIT_USAGE, None),
        };
        Self {
            code,
            message: format!("{}: {err}", source.display()),
            hint: hint.map(str::to_string),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
