//! `modelsync sync`: reconcile a sheet into the model.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use modelsync_core::tabular::{read_input, write_csv, CsvFormat};
use modelsync_core::{SyncConfig, SyncResult, TabularInput};
use modelsync_graph::run_sync;

use super::{load_model, parse_delimiter, save_model};
use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Sheet to reconcile: CSV, or JSON rows (array of arrays or of objects)
    pub input: PathBuf,

    /// Model snapshot (JSON); created when missing
    #[arg(short, long, default_value = "model.json")]
    pub model: PathBuf,

    /// Where to write the merged records
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Field delimiter for input and output
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Reconcile and report without saving the model
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: SyncArgs, config: &SyncConfig) -> Result<()> {
    let format = CsvFormat::with_delimiter(args.delimiter);
    let input = read_sheet(&args.input, format, config)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut model = load_model(&args.model, true)?;

    if !args.json {
        println!("{} {}", "Syncing".bold(), args.input.display().to_string().cyan());
    }
    let outcome = run_sync(&mut model, input, config)?;

    if let Some(path) = &args.output {
        write_csv(path, &config.output_headers(), &outcome.records, format)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if !args.dry_run {
        save_model(&model, &args.model)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        output::print_report(&outcome.report);
        if let Some(path) = &args.output {
            println!("  Merged records written to {}", path.display().to_string().cyan());
        }
        if args.dry_run {
            println!("  {}", "Dry run: model not saved".dimmed());
        }
    }
    Ok(())
}

fn read_sheet(path: &Path, format: CsvFormat, config: &SyncConfig) -> SyncResult<TabularInput> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let content = std::fs::read_to_string(path)?;
        return TabularInput::from_json(serde_json::from_str(&content)?);
    }
    read_input(path, format, config.columns.header_rows)
}
