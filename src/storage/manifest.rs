//! Manifest readers
//!
//! Two input shapes: a JSON array of `{folderName, playlistLink}` records,
//! or a plain text file with one URL per line where folders are numbered
//! `playlist-1`, `playlist-2`, ... Blank lines are skipped.

use crate::error::{Result, YtBatchError};
use crate::types::ManifestEntry;
use std::path::Path;
use tokio::fs;

/// Which manifest format to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Json,
    Text,
}

impl ManifestKind {
    /// Guess from the file extension; anything but .json reads as text
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ManifestKind::Json,
            _ => ManifestKind::Text,
        }
    }
}

/// Read a manifest of playlists, dispatching on `kind`
pub async fn read_manifest(path: &Path, kind: ManifestKind) -> Result<Vec<ManifestEntry>> {
    let entries = match kind {
        ManifestKind::Json => read_json(path).await?,
        ManifestKind::Text => read_text(path).await?,
    };

    if entries.is_empty() {
        return Err(YtBatchError::Manifest(format!(
            "No playlists found in {}",
            path.display()
        )));
    }
    Ok(entries)
}

async fn read_json(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| YtBatchError::Manifest(format!("Error reading {}: {e}", path.display())))?;

    serde_json::from_str(&content)
        .map_err(|e| YtBatchError::Manifest(format!("Error parsing {}: {e}", path.display())))
}

async fn read_text(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| YtBatchError::Manifest(format!("Error reading {}: {e}", path.display())))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| ManifestEntry {
            folder_name: format!("playlist-{}", i + 1),
            playlist_link: line.to_string(),
        })
        .collect())
}
