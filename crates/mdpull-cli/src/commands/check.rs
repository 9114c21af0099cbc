//! Check command implementation

use anyhow::{Result, bail};
use colored::Colorize;
use mdpull_core::{Config, Error, Resolver};

/// Validate and fetch each URL, bypassing the cache.
///
/// Every URL is reported with the kind of failure; the command fails if any of them did.
pub async fn execute(config: &Config, urls: &[String]) -> Result<()> {
    let resolver = Resolver::from_config(config)?;
    let mut failed = 0usize;

    for url in urls {
        match resolver.check(url).await {
            Ok(body) => println!("{} {url} ({} bytes)", "ok".green(), body.len()),
            Err(e) => {
                failed += 1;
                let label = match &e {
                    Error::Fetch(fetch) => fetch.kind(),
                    other => other.category(),
                };
                let hint = if e.is_recoverable() { ", may succeed on retry" } else { "" };
                println!("{} {url} [{label}{hint}]: {e}", "failed".red());
            },
        }
    }

    if failed > 0 {
        bail!("{failed} of {} URLs failed", urls.len());
    }
    Ok(())
}
