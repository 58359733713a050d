//! `modelsync folders`: ensure the taxonomy folder tree.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use modelsync_core::SyncConfig;
use modelsync_graph::folders::ensure_taxonomy_folders;

use super::{load_model, save_model};

#[derive(Args)]
pub struct FoldersArgs {
    /// Model snapshot (JSON)
    #[arg(short, long, default_value = "model.json")]
    pub model: PathBuf,
}

pub fn execute(args: FoldersArgs, config: &SyncConfig) -> Result<()> {
    let mut model = load_model(&args.model, false)?;
    let outcome = ensure_taxonomy_folders(&mut model, config).context("Failed to ensure taxonomy folders")?;
    save_model(&model, &args.model)?;

    println!("{}", "Taxonomy folders:".bold());
    println!("  Created: {}", outcome.created.to_string().green());
    println!("  Existing: {}", outcome.reused);
    for root in &outcome.missing_roots {
        println!("  {} root folder '{}' not found", "!".yellow(), root);
    }
    Ok(())
}
