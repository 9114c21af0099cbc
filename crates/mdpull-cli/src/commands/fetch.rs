//! Fetch command implementation

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use futures::stream::{self, StreamExt};
use mdpull_core::{Config, FetchResult, Resolver, scan_posts};
use serde::Serialize;
use tracing::warn;

/// Options for `mdpull fetch`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub urls: Vec<String>,
    pub posts: Option<PathBuf>,
    pub concurrency: usize,
    pub no_sweep: bool,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct FetchOutput<'a> {
    url: &'a str,
    status: &'static str,
    content: &'a str,
}

/// Resolve every requested document through the cache.
///
/// Individual failures become placeholders in the output; they do not fail the command.
pub async fn execute(config: &Config, options: FetchOptions) -> Result<()> {
    let resolver = Resolver::from_config(config)?;

    if config.cache.sweep_on_start && !options.no_sweep {
        if let Err(e) = resolver.sweep() {
            warn!(error = %e, "cache sweep failed");
        }
    }

    let urls = collect_urls(options.urls, options.posts.as_deref())?;
    if urls.is_empty() {
        if !options.quiet {
            eprintln!("No documents to fetch");
        }
        return Ok(());
    }

    let resolver = &resolver;
    let mut results: Vec<(usize, FetchResult)> = stream::iter(urls.iter().enumerate())
        .map(|(i, url)| async move { (i, resolver.resolve(url).await) })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(i, _)| *i);

    if options.json {
        let output: Vec<FetchOutput<'_>> = results
            .iter()
            .map(|(i, result)| FetchOutput {
                url: &urls[*i],
                status: result.status(),
                content: result.text(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (_, result) in &results {
            print!("{}", result.text());
        }
    }

    if !options.quiet {
        print_summary(&results);
    }
    Ok(())
}

/// Explicit URLs first, then those found in posts, without duplicates.
fn collect_urls(explicit: Vec<String>, posts: Option<&std::path::Path>) -> Result<Vec<String>> {
    let mut urls = explicit;
    if let Some(dir) = posts {
        let found = scan_posts(dir)
            .with_context(|| format!("failed to scan posts in {}", dir.display()))?;
        urls.extend(found);
    }

    let mut seen = HashSet::new();
    urls.retain(|url| seen.insert(url.trim().to_string()));
    Ok(urls)
}

fn print_summary(results: &[(usize, FetchResult)]) {
    let count = |status: &str| results.iter().filter(|(_, r)| r.status() == status).count();
    let (hits, fetched, failed) = (count("hit"), count("fetched"), count("failed"));

    let failed_label = format!("{failed} failed");
    let failed_label = if failed > 0 {
        failed_label.red()
    } else {
        failed_label.normal()
    };
    eprintln!(
        "{} {} cached, {} fetched, {failed_label}",
        "✓".green(),
        hits,
        fetched
    );
}
