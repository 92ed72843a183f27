//! Error types for yt-batch

use thiserror::Error;

/// Main error type for yt-batch
#[derive(Error, Debug)]
pub enum YtBatchError {
    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Playlist error: {0}")]
    Playlist(String),

    #[error("Process exited with code {code:?}: {stderr}")]
    Process { code: Option<i32>, stderr: String },

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<YtBatchError>,
    },

    #[error("Download completed but file verification failed: {0}")]
    Verification(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YtBatchError {
    /// Whether the underlying failure was a broken output pipe, looking
    /// through retry exhaustion to the final cause. yt-dlp occasionally dies
    /// with EPIPE even though the file on disk is fine.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            Self::File(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
            Self::RetriesExhausted { last, .. } => last.is_broken_pipe(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, YtBatchError>;
