//! Per-item download orchestration
//!
//! The life of one item: pacing delay, resolve the output filename (skip if
//! it already exists), pick a format under the quality ceiling, run the
//! constrained download through the retry policy, verify the file on disk,
//! and fall back to an unconstrained "best" download before giving up.
//! Failure here is terminal for the item, never for the playlist.

use crate::core::formats::{available_heights, format_spec, select_height};
use crate::core::process::{Completion, file_non_empty, run_download, run_tool};
use crate::core::progress::ProgressEstimator;
use crate::core::retry::RetryPolicy;
use crate::error::Result;
use crate::types::{DownloadKind, DownloadOutcome};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Container extensions yt-dlp may leave behind when it dies mid-pipe
const PIPE_SURVIVOR_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "webm"];

/// One item to download
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub url: String,
    /// yt-dlp output template path, e.g. `downloads/pl/3-%(title).50s.mp4`
    pub template: PathBuf,
    pub ceiling: u32,
    pub kind: DownloadKind,
    /// 1-based position within the playlist
    pub index: usize,
    pub total: usize,
}

/// Downloads a single item through yt-dlp with retry, verification and
/// fallback. Delays are fields so tests can zero them.
#[derive(Debug, Clone)]
pub struct ItemDownloader {
    pub tool: PathBuf,
    pub retry: RetryPolicy,
    /// Pause before each item, independent of retry backoff
    pub pacing: Duration,
    /// Pause before the unconstrained fallback attempt
    pub fallback_delay: Duration,
}

impl ItemDownloader {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            retry: RetryPolicy::default(),
            pacing: Duration::from_millis(2000),
            fallback_delay: Duration::from_millis(3000),
        }
    }

    /// Run the full state machine for one item
    pub async fn download(&self, req: &ItemRequest) -> DownloadOutcome {
        // Throttle before touching the source at all.
        sleep(self.pacing).await;

        println!(
            "\n{}",
            format!("Processing video {}/{}...", req.index, req.total).bold()
        );

        let resolved = self.resolve_filename(req).await;

        if let Some(ref path) = resolved
            && path.exists()
        {
            println!(
                "File already exists: {}, skipping...",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            );
            return DownloadOutcome::Skipped(path.clone());
        }

        // Exactly one format is chosen before any download attempt.
        let heights = available_heights(&self.tool, &req.url).await;
        let chosen = select_height(&heights, req.ceiling);
        if !heights.is_empty() {
            println!(
                "Available formats: {}",
                heights
                    .iter()
                    .map(|h| format!("{h}p"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if let Some(h) = chosen {
            println!("Selected format: {}", format!("{h}p").cyan());
        }

        let primary_args = self.download_args(&format_spec(req.kind, chosen), req);

        match self.attempt(&primary_args, resolved.as_deref()).await {
            Ok((path, completion)) => {
                println!("\n{}", completion_note(req.index, completion, false).green());
                return DownloadOutcome::Downloaded(path);
            }
            Err(e) => {
                eprintln!(
                    "{} {}",
                    format!("Failed to download video {}:", req.index).red(),
                    e
                );
            }
        }

        // Unconstrained fallback: let yt-dlp resolve the format itself.
        println!("{}", "Trying fallback format...".yellow());
        sleep(self.fallback_delay).await;

        let fallback_args = self.download_args(&format_spec(req.kind, None), req);
        match self.attempt(&fallback_args, resolved.as_deref()).await {
            Ok((path, completion)) => {
                println!("\n{}", completion_note(req.index, completion, true).green());
                DownloadOutcome::Downloaded(path)
            }
            Err(e) => {
                let reason = format!("fallback failed: {e}");
                eprintln!(
                    "{} {}",
                    format!("Failed to download video {} with fallback format:", req.index).red(),
                    e
                );
                DownloadOutcome::Failed(reason)
            }
        }
    }

    /// Ask the tool for the expanded output filename without downloading.
    /// Resolution failure is non-fatal: we download anyway, unverified.
    async fn resolve_filename(&self, req: &ItemRequest) -> Option<PathBuf> {
        let args = vec![
            "--get-filename".to_string(),
            "-o".to_string(),
            req.template.display().to_string(),
            "--restrict-filenames".to_string(),
            req.url.clone(),
        ];

        match run_tool(&self.tool, &args, None).await {
            Ok(output) => {
                let name = output.stdout.trim();
                if name.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(name))
                }
            }
            Err(_) => {
                println!("Could not check filename, attempting download...");
                None
            }
        }
    }

    /// One retried download pass plus verification. EPIPE from the tool is
    /// tolerated when a container variant of the expected file survived it.
    async fn attempt(&self, args: &[String], expected: Option<&Path>) -> Result<(PathBuf, Completion)> {
        let bar = download_bar();
        let monitor = expected.map(|p| spawn_size_monitor(p.to_path_buf(), bar.clone()));

        let result = self
            .retry
            .run(async |_| run_download(&self.tool, args, expected).await)
            .await;

        if let Some(handle) = monitor {
            handle.abort();
        }
        bar.finish_and_clear();

        let output = match result {
            Ok(output) => output,
            Err(e) if e.is_broken_pipe() => {
                if let Some(path) = pipe_survivor(expected) {
                    return Ok((path, Completion::BrokenPipe));
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let path = verify_output(expected, output.completion)?;
        Ok((path, output.completion))
    }

    /// The original tool invocation, format-constrained, with merge and
    /// fragment-retry handling delegated to yt-dlp itself.
    fn download_args(&self, format: &str, req: &ItemRequest) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--format".into(),
            format.into(),
            "--output".into(),
            req.template.display().to_string(),
            "--restrict-filenames".into(),
            "--no-playlist".into(),
            "--no-mtime".into(),
            "--force-ipv4".into(),
            "--retries".into(),
            "3".into(),
            "--fragment-retries".into(),
            "3".into(),
            "--retry-sleep".into(),
            "5".into(),
        ];
        if req.kind != DownloadKind::AudioOnly {
            args.extend(["--merge-output-format".into(), "mp4".into()]);
        }
        args.extend([
            "--no-keep-video".into(),
            "--no-keep-fragments".into(),
            "--prefer-ffmpeg".into(),
            "--no-check-certificates".into(),
            "--buffer-size".into(),
            "8K".into(),
            "--no-part".into(),
            "--no-cache-dir".into(),
            "--no-progress".into(),
            "--quiet".into(),
            req.url.clone(),
        ]);
        args
    }
}

/// Status line for a verified download
fn completion_note(index: usize, completion: Completion, fallback: bool) -> String {
    match completion {
        Completion::BrokenPipe => {
            format!("Video {index} downloaded successfully despite EPIPE error")
        }
        _ if fallback => format!("Video {index} download completed with fallback format"),
        _ => format!("Video {index} download and merge completed"),
    }
}

/// The output file must exist with content. With an unknown resolved path a
/// clean completion is accepted as-is: nothing can corroborate or refute it.
fn verify_output(expected: Option<&Path>, completion: Completion) -> Result<PathBuf> {
    let Some(path) = expected else {
        return Ok(PathBuf::new());
    };

    if file_non_empty(path) {
        if completion == Completion::BenignMerge {
            println!(
                "{}",
                "Tool exited nonzero during merge; output verified on disk".dimmed()
            );
        }
        return Ok(path.to_path_buf());
    }

    Err(crate::error::YtBatchError::Verification(
        path.display().to_string(),
    ))
}

/// After an EPIPE, any container variant of the expected file that exists
/// with content counts as the download.
fn pipe_survivor(expected: Option<&Path>) -> Option<PathBuf> {
    let path = expected?;
    PIPE_SURVIVOR_EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|p| file_non_empty(p))
}

fn download_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    bar.set_message("Downloading...");
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Poll the growing output file and turn size deltas into chunk events for
/// the sliding-window estimator. yt-dlp runs with --no-progress, so this is
/// the only live feedback. Total size is unknown up front.
fn spawn_size_monitor(path: PathBuf, bar: ProgressBar) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut estimator = ProgressEstimator::new(None);
        let mut last_size = 0u64;

        loop {
            sleep(Duration::from_millis(250)).await;

            let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            if size > last_size {
                estimator.record(size - last_size, Instant::now());
                last_size = size;
            }

            let snap = estimator.snapshot();
            bar.set_message(format!(
                "{} | {} | ETA: {}",
                snap.rate, snap.transferred, snap.eta
            ));
        }
    })
}
