// Romaneio CLI - delivery route reconciliation from spreadsheet exports

mod compare;
mod config;
mod exit_codes;
mod export;
mod logging;
mod occurrences;
mod routes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use romaneio_recon::occurrence::OCCURRENCE_DATASET;
use romaneio_recon::{Grid, ReconConfig, ReconError, RegionFilter};

use exit_codes::{
    EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_MISSING_COLUMN,
    EXIT_SUCCESS, EXIT_USAGE,
};
use export::OutputArgs;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("ROMANEIO_COMMIT"),
    "\ntarget: ",
    env!("ROMANEIO_TARGET"),
);

#[derive(Parser)]
#[command(name = "romaneio")]
#[command(about = "Reconcile delivery route manifests against carrier status exports")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file (TOML). Without it, <config dir>/romaneio/recon.toml is used when present
    #[arg(long, global = true, env = "ROMANEIO_CONFIG")]
    config: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-route delivery figures from a route manifest and a status export
    #[command(after_help = "\
Examples:
  romaneio routes rotas.xlsx --status status.xlsx
  romaneio routes rotas.xlsx --status status.csv --region sao_paulo
  romaneio routes rotas.csv --status status.csv --json
  romaneio routes rotas.xlsx --status status.xlsx --csv aggregates.csv")]
    Routes {
        /// Route manifest (.xlsx, .xls, .ods, .csv, .tsv or .json)
        manifest: PathBuf,

        /// Carrier status export; without it every order counts as pending
        #[arg(long)]
        status: Option<PathBuf>,

        /// Keep only routes of one region (all, sao_paulo, rio_de_janeiro, nespresso, dafiti)
        #[arg(long, default_value = "all")]
        region: RegionFilter,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Cross-check order numbers of one or two primary exports against a secondary export
    #[command(after_help = "\
Examples:
  romaneio compare base.xlsx --primary riachuelo.xlsx
  romaneio compare base.xlsx --primary lote1.xlsx --primary lote2.xlsx --csv comparacao.csv
  romaneio compare base.csv --primary pedidos.csv --strict

Exit codes:
  0   Comparison finished (or no unmatched orders with --strict)
  62  --strict and at least one order number is on one side only")]
    Compare {
        /// Secondary export (the base's received-orders sheet)
        secondary: PathBuf,

        /// Primary export; pass twice to merge two files
        #[arg(long = "primary", required = true)]
        primaries: Vec<PathBuf>,

        /// Exit 62 when any order number is unmatched
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Keep valid pickup occurrences, one row per reference
    #[command(after_help = "\
Examples:
  romaneio occurrences ocorrencias.xlsx
  romaneio occurrences ocorrencias.csv --csv coletas.csv")]
    Occurrences {
        /// Occurrence export
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Keep the most recent status row per order code
    #[command(after_help = "\
Examples:
  romaneio latest status.xlsx --csv ultimos.csv
  romaneio latest status.csv --json")]
    Latest {
        /// Carrier status export
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect or validate the reconciliation config
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn main() -> ExitCode {
    let Cli { config, verbose, command } = Cli::parse();
    logging::init(verbose);
    let config = config.as_deref();

    let result = match command {
        Commands::Routes { manifest, status, region, output } => {
            routes::cmd_routes(config, &manifest, status.as_deref(), region, &output)
        }
        Commands::Compare { secondary, primaries, strict, output } => {
            compare::cmd_compare(config, &secondary, &primaries, strict, &output)
        }
        Commands::Occurrences { file, output } => occurrences::cmd_occurrences(config, &file, &output),
        Commands::Latest { file, output } => occurrences::cmd_latest(config, &file, &output),
        Commands::Config(cmd) => config::cmd_config(config, cmd),
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

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Map an engine error to its exit code, with a hint where one helps.
    pub fn recon(err: ReconError) -> Self {
        let message = err.to_string();
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => Self {
                code: EXIT_RECON_INVALID_CONFIG,
                message,
                hint: Some("`romaneio config show` prints a complete, valid config".to_string()),
            },
            ReconError::MissingColumn { dataset, .. } => {
                let section = if dataset == OCCURRENCE_DATASET { "occurrence" } else { dataset.as_str() };
                Self {
                    code: EXIT_RECON_MISSING_COLUMN,
                    message,
                    hint: Some(format!("accepted header names are listed under [{section}] in the config")),
                }
            }
            ReconError::NotAGrid(_) => Self::parse(message),
            ReconError::Io(_) => Self::io(message),
            ReconError::EmptyDataset(_) => Self { code: EXIT_ERROR, message, hint: None },
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared loading
// ============================================================================

/// `<config dir>/romaneio/recon.toml`, whether or not it exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("romaneio").join("recon.toml"))
}

/// The config file in effect: the explicit one, else the default location if
/// a file is there. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.is_file()),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<ReconConfig, CliError> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            ReconConfig::load(&path).map_err(CliError::recon)
        }
        None => Ok(ReconConfig::default()),
    }
}

/// Decode an input file. Unsupported extensions are a usage error, unreadable
/// files an I/O error, undecodable content a parse error.
pub fn load_grid(path: &Path) -> Result<Grid, CliError> {
    if romaneio_io::Format::from_path(path).is_none() {
        return Err(CliError::args(format!("unsupported file type: {}", path.display()))
            .with_hint("expected .csv, .tsv, .xlsx, .xls, .ods or .json"));
    }
    std::fs::metadata(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    romaneio_io::load_grid(path).map_err(CliError::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_hint_names_config_section() {
        let err = CliError::recon(ReconError::MissingColumn {
            dataset: OCCURRENCE_DATASET.to_string(),
            column: "Referência".to_string(),
        });
        assert_eq!(err.code, EXIT_RECON_MISSING_COLUMN);
        assert!(err.hint.unwrap().contains("[occurrence]"));

        let err = CliError::recon(ReconError::MissingColumn {
            dataset: "status".to_string(),
            column: "Código".to_string(),
        });
        assert!(err.hint.unwrap().contains("[status]"));
    }

    #[test]
    fn config_errors_map_to_invalid_config() {
        let err = CliError::recon(ReconError::ConfigValidation("markers.driver must not be empty".into()));
        assert_eq!(err.code, EXIT_RECON_INVALID_CONFIG);
        assert!(err.message.contains("markers.driver"));
    }

    #[test]
    fn unsupported_extension_is_usage_error() {
        let err = load_grid(Path::new("relatorio.pdf")).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_grid(Path::new("/nonexistent/rotas.csv")).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
        assert!(err.message.contains("rotas.csv"));
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = Path::new("/tmp/some.recon.toml");
        assert_eq!(resolve_config_path(Some(path)).as_deref(), Some(path));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
