//! Sweep command implementation

use anyhow::Result;
use mdpull_core::{Config, Resolver};

/// Remove stale cache entries and report how many went.
pub fn execute(config: &Config) -> Result<()> {
    let resolver = Resolver::from_config(config)?;
    let removed = resolver.sweep()?;
    println!("Removed {removed} stale cache entries from {}", config.cache.dir.display());
    Ok(())
}
