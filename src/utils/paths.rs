//! Path utilities for yt-batch
//!
//! Respects XDG Base Directory Specification for config; downloads land in
//! a `downloads/` tree under the current directory unless configured.

use crate::error::Result;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_NAME: &str = "yt-batch";

/// Get config directory path
/// Respects XDG_CONFIG_HOME, defaults to ~/.config/yt-batch
pub fn get_config_dir() -> String {
    let base = env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        dirs::config_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}/.config", env::var("HOME").unwrap_or_default()))
    });

    format!("{}/{}", base, APP_NAME)
}

/// Get config file path
pub fn get_config_path() -> String {
    format!("{}/config.json", get_config_dir())
}

/// Downloads root: the configured directory, or ./downloads
pub fn downloads_root(configured: &str) -> PathBuf {
    if configured.is_empty() {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("downloads")
    } else {
        PathBuf::from(configured)
    }
}

/// Ensure a directory exists
pub async fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path.as_ref()).await?;
    Ok(())
}

/// Ensure all required app directories exist
pub async fn ensure_app_dirs() -> Result<()> {
    ensure_dir(get_config_dir()).await?;
    Ok(())
}
