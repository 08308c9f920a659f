//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::feed::DEFAULT_PAGE_SIZE;

pub const DEFAULT_BASE_URL: &str = "http://kpakozz96pyc.xyz:8447/api/";

/// The server rejects anything larger.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Browse the dish catalog from the terminal
#[derive(Parser, Debug)]
#[command(name = "dishfeed", version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the catalog API
    #[arg(long, env = "DISHFEED_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Dishes fetched per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Where the login session is stored
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Validated runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub token_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.page_size == 0 || cli.page_size > MAX_PAGE_SIZE {
            bail!("--page-size must be between 1 and {MAX_PAGE_SIZE}, got {}", cli.page_size);
        }
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be positive");
        }
        let base_url = cli.base_url.trim().to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("--base-url must be an http(s) URL, got {base_url:?}");
        }
        Ok(Self {
            base_url,
            page_size: cli.page_size,
            timeout: Duration::from_secs(cli.timeout_secs),
            token_file: cli.token_file.unwrap_or_else(default_token_path),
            log_file: cli.log_file,
        })
    }
}

/// Platform config directory for the session file.
pub fn default_token_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("dishfeed").join("session.json");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("dishfeed")
                .join("session.json");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("dishfeed").join("session.json");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("dishfeed")
                .join("session.json");
        }
    }

    PathBuf::from(".dishfeed-session.json")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
