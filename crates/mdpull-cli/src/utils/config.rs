//! Resolving the effective configuration from flags, file and environment.

use std::path::Path;

use anyhow::{Context, Result};
use mdpull_core::Config;

/// Load configuration, honoring `--config` and `--cache-dir`.
///
/// An explicit config file must exist. Environment overrides apply on top of whichever file
/// was read, and `cache_dir` wins over both.
pub fn load(config_path: Option<&Path>, cache_dir: Option<&Path>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_overrides(|name| std::env::var(name).ok())?;
            config
        },
        None => Config::load().context("failed to load configuration")?,
    };

    if let Some(dir) = cache_dir {
        config.cache.dir = dir.to_path_buf();
    }
    Ok(config)
}
