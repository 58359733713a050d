//! `modelsync export`: records for the model's nodes alone.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use modelsync_core::tabular::{write_csv, write_records, CsvFormat};
use modelsync_core::SyncConfig;
use modelsync_graph::export_graph_only;

use super::{load_model, parse_delimiter};

#[derive(Args)]
pub struct ExportArgs {
    /// Model snapshot (JSON)
    #[arg(short, long, default_value = "model.json")]
    pub model: PathBuf,

    /// Output CSV (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

pub fn execute(args: ExportArgs, config: &SyncConfig) -> Result<()> {
    let model = load_model(&args.model, false)?;
    let records = export_graph_only(&model, config)?;
    let headers = config.output_headers();
    let format = CsvFormat::with_delimiter(args.delimiter);

    match &args.output {
        Some(path) => {
            write_csv(path, &headers, &records, format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {} records to {}",
                "Exported".green().bold(),
                records.len(),
                path.display().to_string().cyan()
            );
        }
        None => write_records(std::io::stdout().lock(), &headers, &records, format)?,
    }
    Ok(())
}
