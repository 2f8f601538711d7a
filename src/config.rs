//! Dashboard configuration
//!
//! Settings come from environment variables, optionally overridden by
//! command-line flags (which are folded into the environment the same way
//! the flags of the original deployment scripts were).

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the strax server address
pub const ADDR_ENV: &str = "STRAXRPC_ADDR";

const DEFAULT_ADDR: &str = "localhost:50051";
const DEFAULT_REFRESH_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend network address, host:port
    pub addr: String,

    /// Seconds between dataset-list refreshes
    pub refresh_secs: u64,

    /// Optional template file; the compiled-in set is used when absent
    pub templates_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Read configuration from the environment with explicit defaults
    pub fn from_env() -> Self {
        let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());

        let refresh_secs = std::env::var("STRAXUI_REFRESH_SECS")
            .ok()
            .map(|raw| parse_refresh_secs(&raw))
            .unwrap_or(DEFAULT_REFRESH_SECS);

        let templates_path = std::env::var("STRAXUI_TEMPLATES").ok().map(PathBuf::from);

        Self {
            addr,
            refresh_secs,
            templates_path,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

/// Parse a refresh period, warning and defaulting on junk values
fn parse_refresh_secs(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=300).contains(&secs) => secs,
        Ok(secs) => {
            eprintln!(
                "⚠ Refresh period {}s out of range [1-300], using default: {}s",
                secs, DEFAULT_REFRESH_SECS
            );
            DEFAULT_REFRESH_SECS
        }
        Err(_) => {
            eprintln!(
                "⚠ Invalid refresh period '{}', using default: {}s",
                raw, DEFAULT_REFRESH_SECS
            );
            DEFAULT_REFRESH_SECS
        }
    }
}

/// Fold command-line flags into the environment
pub fn parse_args(args: &[String]) {
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                std::env::set_var(ADDR_ENV, &args[i + 1]);
                i += 2;
            }
            "--refresh-secs" if i + 1 < args.len() => {
                std::env::set_var("STRAXUI_REFRESH_SECS", &args[i + 1]);
                i += 2;
            }
            "--templates" if i + 1 < args.len() => {
                std::env::set_var("STRAXUI_TEMPLATES", &args[i + 1]);
                i += 2;
            }
            _ => i += 1,
        }
    }
}
