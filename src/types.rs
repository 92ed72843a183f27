//! Type definitions for yt-batch
//!
//! Source of truth for all data structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================
// Manifest Types
// ============================================

/// One record from a JSON manifest file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Subdirectory name under downloads/
    pub folder_name: String,
    /// Playlist (or single video) URL
    pub playlist_link: String,
}

/// A fully resolved download job: one playlist, one target folder
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    /// Folder label under the downloads root
    pub folder: String,
    /// Maximum acceptable video height, e.g. 1080
    pub ceiling: u32,
    pub kind: DownloadKind,
}

// ============================================
// Playlist Metadata (yt-dlp --dump-single-json)
// ============================================

/// Flat playlist entry as reported by yt-dlp
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Flattened playlist payload
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

// ============================================
// Download Types
// ============================================

/// What streams to download for each item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// Video with audio, muxed by yt-dlp/ffmpeg
    #[default]
    Both,
    /// Video stream only
    VideoOnly,
    /// Audio stream only
    AudioOnly,
}

impl DownloadKind {
    /// Container extension for the output template
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadKind::Both | DownloadKind::VideoOnly => "mp4",
            DownloadKind::AudioOnly => "m4a",
        }
    }
}

/// Terminal result for a single item. Exactly one per item per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Downloaded and verified
    Downloaded(PathBuf),
    /// Output already existed; no download subprocess was started
    Skipped(PathBuf),
    /// Primary and fallback attempts both failed
    Failed(String),
}

impl DownloadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed(_))
    }
}

// ============================================
// Summary Types
// ============================================

/// Per-playlist aggregate
#[derive(Debug, Clone)]
pub struct PlaylistSummary {
    pub folder: String,
    pub total: usize,
    /// 1-based indexes of items that failed
    pub failed: Vec<usize>,
}

impl PlaylistSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Whole-run aggregate
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub summaries: Vec<PlaylistSummary>,
    /// Folder labels of playlists that failed before any items could run
    pub failed_playlists: Vec<String>,
}

impl BatchSummary {
    pub fn total_failed_items(&self) -> usize {
        self.summaries.iter().map(|s| s.failed_count()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_playlists.is_empty() && self.total_failed_items() == 0
    }
}

// ============================================
// Config Types
// ============================================

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the yt-dlp executable (empty = discover from env/PATH)
    pub ytdlp_path: String,
    /// Downloads root directory (empty = ./downloads)
    pub download_dir: String,
    /// Default quality ceiling
    pub quality: u32,
    /// Default download kind
    pub kind: DownloadKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ytdlp_path: String::new(),
            download_dir: String::new(),
            quality: 1080,
            kind: DownloadKind::default(),
        }
    }
}
