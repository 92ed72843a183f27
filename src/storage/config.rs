//! Configuration management

use crate::error::Result;
use crate::types::Config;
use crate::utils::paths::{ensure_dir, get_config_dir, get_config_path};
use std::path::Path;
use tokio::fs;

/// Load configuration from file, falling back to defaults
pub async fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    if !Path::new(&config_path).exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path).await?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub async fn save_config(config: &Config) -> Result<()> {
    ensure_dir(get_config_dir()).await?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(get_config_path(), content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DownloadKind;

    #[test]
    fn config_round_trips_through_json() {
        let config = Config {
            ytdlp_path: "/usr/local/bin/yt-dlp".into(),
            download_dir: "/media/dl".into(),
            quality: 720,
            kind: DownloadKind::AudioOnly,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quality, 720);
        assert_eq!(back.kind, DownloadKind::AudioOnly);
        assert_eq!(back.ytdlp_path, config.ytdlp_path);
    }

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.quality, 1080);
        assert_eq!(config.kind, DownloadKind::Both);
        assert!(config.ytdlp_path.is_empty());
    }
}
