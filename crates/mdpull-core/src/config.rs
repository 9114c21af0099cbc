//! Configuration for cache and fetch behavior.
//!
//! Every setting has a built-in default, so a config file is optional. Lookup order:
//!
//! 1. **Defaults**: the constants in this module
//! 2. **Config file**: `$MDPULL_CONFIG`, else `<platform config dir>/mdpull/config.toml`
//! 3. **Environment variables**: `MDPULL_CACHE_DIR`, `MDPULL_TTL_SECS`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [cache]
//! dir = "/home/user/site/.mdpull-cache"
//! ttl_secs = 604800
//! sweep_on_start = true
//!
//! [fetch]
//! timeout_secs = 10
//! max_retries = 3
//! retry_delay_ms = 1000
//! user_agent = "mdpull/0.4.0"
//! readme_fallback = true
//! ```
//!
//! Sections and fields may be omitted; missing values keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// How long a cached document is served before it is fetched again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Applied to connecting and to the request as a whole.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on attempts for a single fetch.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the linear backoff: attempt `n` is followed by a sleep of `n × RETRY_DELAY`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("mdpull/", env!("CARGO_PKG_VERSION"));

/// `Accept` header sent with every request.
pub const ACCEPT_MARKDOWN: &str = "text/markdown, text/plain;q=0.9, */*;q=0.1";

const CONFIG_ENV: &str = "MDPULL_CONFIG";
const CACHE_DIR_ENV: &str = "MDPULL_CACHE_DIR";
const TTL_ENV: &str = "MDPULL_TTL_SECS";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache location and lifetime.
    pub cache: CacheConfig,
    /// Network behavior.
    pub fetch: FetchConfig,
}

/// Cache location and lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding cached documents. Created on first write.
    pub dir: PathBuf,
    /// Seconds a cached document stays fresh.
    pub ttl_secs: u64,
    /// Whether `fetch` sweeps stale entries before resolving anything.
    pub sweep_on_start: bool,
}

/// Network behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Seconds before a connect or request is abandoned.
    pub timeout_secs: u64,
    /// Maximum attempts per fetch when the transport fails.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub retry_delay_ms: u64,
    /// User agent header.
    pub user_agent: String,
    /// Whether a 404 on a GitHub raw README triggers a search of alternate branches/names.
    pub readme_fallback: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_secs: DEFAULT_TTL.as_secs(),
            sweep_on_start: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: u64::try_from(DEFAULT_RETRY_DELAY.as_millis()).unwrap_or(1000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            readme_fallback: true,
        }
    }
}

impl CacheConfig {
    /// TTL as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl FetchConfig {
    /// Timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff base as a [`Duration`].
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Load configuration from the default location, then apply environment overrides.
    ///
    /// A missing file yields defaults; a file that exists but does not parse is an error.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::default_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from an explicit file. Environment overrides are not applied.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `MDPULL_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.cache.dir = PathBuf::from(dir.trim());
        }
        if let Some(ttl) = lookup(TTL_ENV) {
            self.cache.ttl_secs = ttl
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{TTL_ENV} must be a number of seconds: {e}")))?;
        }
        Ok(())
    }

    /// `<platform config dir>/mdpull/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "mdpull", "mdpull")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "mdpull", "mdpull").map_or_else(
        || PathBuf::from(".mdpull-cache"),
        |dirs| dirs.cache_dir().join("documents"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = Config::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(604_800));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(10));
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.retry_delay(), Duration::from_secs(1));
        assert!(config.fetch.user_agent.starts_with("mdpull/"));
        assert!(config.cache.sweep_on_start);
        assert!(config.fetch.readme_fallback);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[fetch]\nmax_retries = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_full_file_overrides_every_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[cache]\n\
             dir = \"/srv/site/.md-cache\"\n\
             ttl_secs = 3600\n\
             sweep_on_start = false\n\
             \n\
             [fetch]\n\
             timeout_secs = 20\n\
             max_retries = 1\n\
             retry_delay_ms = 250\n\
             user_agent = \"site-build/2.0\"\n\
             readme_fallback = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("/srv/site/.md-cache"));
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert!(!config.cache.sweep_on_start);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(20));
        assert_eq!(config.fetch.max_retries, 1);
        assert_eq!(config.fetch.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.fetch.user_agent, "site-build/2.0");
        assert!(!config.fetch.readme_fallback);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[cache\nttl_secs = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("MDPULL_CACHE_DIR", " /tmp/md-cache "), ("MDPULL_TTL_SECS", "60")]);
        let mut config = Config::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.cache.dir, PathBuf::from("/tmp/md-cache"));
        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_bad_ttl_override_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|name| (name == "MDPULL_TTL_SECS").then(|| "a week".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
