//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use std::path::Path;

use modelsync_graph::{ModelCounts, SyncReport};

/// Print the summary of a sync run.
pub fn print_report(report: &SyncReport) {
    let heading = if report.has_failures() {
        "Sync finished with failures:".yellow().bold()
    } else {
        "Sync complete:".green().bold()
    };
    println!("\n{}", heading);
    println!("  Rows:            {}", report.rows);
    println!("  Added:           {}", report.added.to_string().green());
    println!("  Updated:         {}", report.updated.to_string().cyan());
    println!("  Skipped:         {}", count(report.skipped, |s| s.yellow()));
    println!("  Failed:          {}", count(report.failed, |s| s.red().bold()));
    println!("  Graph-only:      {}", report.graph_only);
    println!("  Folders created: {}", report.folders_created);
    println!("  Views created:   {}", report.views_created);
    println!("  Placements:      {}", report.placements_added);
    if report.property_failures > 0 {
        println!("  Property writes failed: {}", report.property_failures.to_string().red());
    }
    if let Some(ms) = report.elapsed_ms() {
        println!("  {}", format!("{} ms", ms).dimmed());
    }
}

/// Print model counts.
pub fn print_counts(path: &Path, counts: &ModelCounts) {
    println!("{} {}", "Model".bold(), path.display().to_string().dimmed());
    println!("{}", "─".repeat(40));
    println!("  Nodes:         {}", counts.nodes);
    println!("  Relationships: {}", counts.relationships);
    println!("  Folders:       {}", counts.folders);
    println!("  Views:         {}", counts.views);
    println!("  Placements:    {}", counts.placements);
}

/// Highlight non-zero counts.
fn count(n: usize, style: impl Fn(&str) -> ColoredString) -> ColoredString {
    let s = n.to_string();
    if n == 0 {
        s.as_str().dimmed()
    } else {
        style(&s)
    }
}
