//! Scan command implementation

use std::path::Path;

use anyhow::{Context, Result};

/// Print every `remote_markdown` URL referenced under `dir`, one per line.
pub fn execute(dir: &Path, quiet: bool) -> Result<()> {
    let urls = mdpull_core::scan_posts(dir)
        .with_context(|| format!("failed to scan posts in {}", dir.display()))?;

    for url in &urls {
        println!("{url}");
    }
    if !quiet && urls.is_empty() {
        eprintln!("No remote_markdown tags found in {}", dir.display());
    }
    Ok(())
}
