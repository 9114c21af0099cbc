//! # CLI Structure and Argument Parsing
//!
//! `mdpull` prefetches the remote markdown a static site embeds, so page generation can read
//! it from cache.
//!
//! ```bash
//! # Warm the cache for every document referenced by the site's posts
//! mdpull fetch --posts _posts
//!
//! # Fetch specific documents and print them as JSON
//! mdpull fetch https://raw.githubusercontent.com/o/r/master/README.md --json
//!
//! # Drop stale entries
//! mdpull sweep
//!
//! # Verify links without touching the cache
//! mdpull check https://example.com/docs/guide.md
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `mdpull` command
#[derive(Parser, Clone, Debug)]
#[command(name = "mdpull")]
#[command(version)]
#[command(about = "mdpull - Fetch and cache remote markdown for static site builds", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to `$MDPULL_CONFIG`, then the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache directory, overriding configuration
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Resolve documents through the cache, fetching what is missing or stale
    Fetch {
        /// Document URLs
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Also resolve every `remote_markdown` tag found under this posts directory
        #[arg(long, value_name = "DIR")]
        posts: Option<PathBuf>,

        /// Documents resolved in parallel
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
        concurrency: u16,

        /// Skip the stale-entry sweep before fetching
        #[arg(long)]
        no_sweep: bool,

        /// Print a JSON array of results instead of document text
        #[arg(long)]
        json: bool,
    },

    /// Remove cache entries older than the TTL
    Sweep,

    /// Validate and fetch each URL without using the cache
    Check {
        /// Document URLs
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// List `remote_markdown` tag URLs found in a posts directory
    Scan {
        /// Posts directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::try_parse_from(["mdpull", "fetch", "https://example.com/a.md"]).unwrap();
        let Commands::Fetch {
            urls,
            posts,
            concurrency,
            no_sweep,
            json,
        } = cli.command
        else {
            unreachable!("expected fetch");
        };
        assert_eq!(urls, vec!["https://example.com/a.md"]);
        assert!(posts.is_none());
        assert_eq!(concurrency, 4);
        assert!(!no_sweep);
        assert!(!json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mdpull", "sweep", "--cache-dir", "/tmp/c", "-q"]).unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_rejects_zero_concurrency_and_empty_check() {
        assert!(Cli::try_parse_from(["mdpull", "fetch", "--concurrency", "0"]).is_err());
        assert!(Cli::try_parse_from(["mdpull", "check"]).is_err());
        assert!(Cli::try_parse_from(["mdpull", "-v", "-q", "sweep"]).is_err());
    }
}
