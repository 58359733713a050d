//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use modelsync_core::SyncConfig;
use modelsync_graph::MemoryModel;

pub mod export;
pub mod folders;
pub mod status;
pub mod sync;

/// Reconcile capability sheets with a graph model
#[derive(Parser)]
#[command(name = "modelsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the TOML configuration (defaults apply when absent)
    #[arg(short, long, global = true, env = "MODELSYNC_CONFIG", default_value = "modelsync.toml")]
    pub config: PathBuf,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a CSV sheet into the model and write the merged records
    Sync(sync::SyncArgs),

    /// Write records for every in-scope node of the model
    Export(export::ExportArgs),

    /// Ensure the taxonomy folder tree under each root folder
    Folders(folders::FoldersArgs),

    /// Show model counts
    Status(status::StatusArgs),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = SyncConfig::load(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))?;

        match self.command {
            Commands::Sync(args) => sync::execute(args, &config),
            Commands::Export(args) => export::execute(args, &config),
            Commands::Folders(args) => folders::execute(args, &config),
            Commands::Status(args) => status::execute(args),
        }
    }
}

/// Load a model snapshot, or start empty when `allow_missing` and the file is absent.
pub(crate) fn load_model(path: &Path, allow_missing: bool) -> Result<MemoryModel> {
    if allow_missing && !path.exists() {
        tracing::info!(path = %path.display(), "Model snapshot not found, starting empty");
        return Ok(MemoryModel::new());
    }
    MemoryModel::from_json_file(path).with_context(|| format!("Failed to load model from {}", path.display()))
}

pub(crate) fn save_model(model: &MemoryModel, path: &Path) -> Result<()> {
    model
        .save_json_file(path)
        .with_context(|| format!("Failed to save model to {}", path.display()))
}

/// Parse a one-byte delimiter argument.
pub(crate) fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ if s == "\\t" => Ok(b'\t'),
        _ => Err(format!("delimiter must be a single byte, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn test_cli_parses_sync() {
        let cli = Cli::try_parse_from([
            "modelsync", "--config", "custom.toml", "sync", "sheet.csv", "--model", "model.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(matches!(cli.command, Commands::Sync(_)));
    }
}
