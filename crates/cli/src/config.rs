//! `romaneio config`: show or validate the reconciliation config.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use romaneio_recon::ReconConfig;

use crate::{load_config, resolve_config_path, CliError};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Check a config file without running a pipeline
    #[command(after_help = "\
Examples:
  romaneio config validate recon.toml
  romaneio config validate            # the file in effect, if any")]
    Validate {
        /// Config file; defaults to the one in effect
        file: Option<PathBuf>,
    },

    /// Print the config in effect as TOML
    #[command(after_help = "\
Examples:
  romaneio config show > recon.toml
  romaneio --config custom.toml config show")]
    Show,
}

pub fn cmd_config(global: Option<&Path>, cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { file } => cmd_config_validate(file.as_deref().or(global)),
        ConfigCommands::Show => cmd_config_show(global),
    }
}

fn cmd_config_validate(explicit: Option<&Path>) -> Result<(), CliError> {
    let Some(path) = resolve_config_path(explicit) else {
        eprintln!("no config file in effect; built-in defaults apply");
        return Ok(());
    };

    let config = ReconConfig::load(&path).map_err(CliError::recon)?;
    eprintln!(
        "ok: {} ({} brokers, service label \"{}\")",
        path.display(),
        config.brokers.len(),
        config.occurrence.service_label,
    );
    Ok(())
}

fn cmd_config_show(global: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(global)?;
    let text = config.to_toml().map_err(CliError::recon)?;

    match resolve_config_path(global) {
        Some(path) => println!("# source: {}", path.display()),
        None => println!("# source: built-in defaults"),
    }
    print!("{text}");
    Ok(())
}
