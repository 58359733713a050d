//! `modelsync status`: model counts.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::load_model;
use crate::output;

#[derive(Args)]
pub struct StatusArgs {
    /// Model snapshot (JSON)
    #[arg(short, long, default_value = "model.json")]
    pub model: PathBuf,

    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: StatusArgs) -> Result<()> {
    let model = load_model(&args.model, false)?;
    let counts = model.counts();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        output::print_counts(&args.model, &counts);
    }
    Ok(())
}
