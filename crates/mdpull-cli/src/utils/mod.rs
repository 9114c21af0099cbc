//! Shared helpers for the CLI.

pub mod config;
pub mod logging;
