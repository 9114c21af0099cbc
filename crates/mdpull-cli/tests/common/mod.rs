#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an `mdpull` command isolated to `dir`.
///
/// The cache lives in `dir/cache` and the config path points at `dir/config.toml`, which is
/// only read if a test writes it.
#[allow(dead_code)]
pub fn mdpull_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mdpull"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("MDPULL_CACHE_DIR", dir.join("cache"));
    cmd.env("MDPULL_CONFIG", dir.join("config.toml"));
    cmd.env_remove("MDPULL_TTL_SECS");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a config that keeps retries fast.
#[allow(dead_code)]
pub fn write_fast_config(dir: &Path) {
    std::fs::write(
        dir.join("config.toml"),
        "[fetch]\nmax_retries = 2\nretry_delay_ms = 10\ntimeout_secs = 5\n",
    )
    .expect("failed to write test config");
}
