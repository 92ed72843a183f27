//! yt-batch - batch playlist downloads in your terminal
//!
//! Reads a manifest of playlists, shells out to yt-dlp per item, and keeps
//! going through failures. Every choice the prompts ask for can also be
//! supplied as a flag, so unattended runs need no terminal at all.

use clap::Parser;
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};

use yt_batch::core::batch::BatchController;
use yt_batch::core::playlist::PlaylistProcessor;
use yt_batch::core::process::is_command_available;
use yt_batch::error::YtBatchError;
use yt_batch::storage::config;
use yt_batch::storage::manifest::{self, ManifestKind};
use yt_batch::types::{BatchSummary, Config, DownloadKind, Job, ManifestEntry};
use yt_batch::ui::prompts;
use yt_batch::utils::paths::{downloads_root, ensure_app_dirs, get_config_path};

/// Batch-download YouTube playlists with yt-dlp. Resilient and hands-off.
#[derive(Parser, Debug)]
#[command(name = "yt-batch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Manifest file (.json or .txt), or a single playlist URL
    manifest: Option<String>,

    /// Maximum video quality ceiling, e.g. 1080
    #[arg(short, long)]
    quality: Option<u32>,

    /// Download audio only
    #[arg(long)]
    audio: bool,

    /// Download the video stream only
    #[arg(long, conflicts_with = "audio")]
    video_only: bool,

    /// Path to the yt-dlp executable
    #[arg(long)]
    ytdlp: Option<String>,

    /// Downloads root directory
    #[arg(short, long)]
    output: Option<String>,

    /// Treat the manifest as plain text regardless of extension
    #[arg(long)]
    text: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ensure_app_dirs().await?;
    let cfg = config::load_config().await?;
    if !Path::new(&get_config_path()).exists() {
        config::save_config(&cfg).await?;
    }

    // Missing tool is fatal before any work begins.
    let tool = resolve_tool(&cli, &cfg).await?;

    let interactive = cli.manifest.is_none();
    let entries = resolve_entries(&cli).await?;

    let quality = match cli.quality {
        Some(q) => q,
        None if interactive => prompts::prompt_quality()?,
        None => cfg.quality,
    };
    let kind = if cli.audio {
        DownloadKind::AudioOnly
    } else if cli.video_only {
        DownloadKind::VideoOnly
    } else if interactive {
        prompts::prompt_kind()?
    } else {
        cfg.kind
    };

    let jobs: Vec<Job> = entries
        .into_iter()
        .map(|e| Job {
            url: e.playlist_link,
            folder: e.folder_name,
            ceiling: quality,
            kind,
        })
        .collect();

    println!("\n{}", "Starting downloads...".bold());
    println!("Total playlists: {}", jobs.len());

    let root = downloads_root(cli.output.as_deref().unwrap_or(&cfg.download_dir));
    let controller = BatchController::new(PlaylistProcessor::new(tool, root));
    let summary = controller.run(&jobs).await;

    report(&summary);
    Ok(())
}

/// yt-dlp location: flag, then YT_DLP_PATH, then config, then PATH
async fn resolve_tool(cli: &Cli, cfg: &Config) -> Result<PathBuf, YtBatchError> {
    if let Some(ref path) = cli.ytdlp {
        return Ok(PathBuf::from(path));
    }
    if let Ok(path) = env::var("YT_DLP_PATH")
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    if !cfg.ytdlp_path.is_empty() {
        return Ok(PathBuf::from(&cfg.ytdlp_path));
    }
    if is_command_available("yt-dlp").await {
        return Ok(PathBuf::from("yt-dlp"));
    }
    Err(YtBatchError::MissingDependency(
        "yt-dlp (set YT_DLP_PATH or pass --ytdlp)".into(),
    ))
}

/// Manifest entries from the CLI argument, or interactively
async fn resolve_entries(cli: &Cli) -> Result<Vec<ManifestEntry>, YtBatchError> {
    match cli.manifest {
        Some(ref arg) if arg.starts_with("http://") || arg.starts_with("https://") => {
            // A bare URL is a one-playlist manifest.
            Ok(vec![ManifestEntry {
                folder_name: "playlist-1".into(),
                playlist_link: arg.clone(),
            }])
        }
        Some(ref path) => {
            let path = Path::new(path);
            let kind = if cli.text {
                ManifestKind::Text
            } else {
                ManifestKind::from_path(path)
            };
            manifest::read_manifest(path, kind).await
        }
        None => {
            let kind = prompts::prompt_manifest_kind()?;
            let path = prompts::prompt_manifest_path(kind)?;
            manifest::read_manifest(Path::new(&path), kind).await
        }
    }
}

fn report(summary: &BatchSummary) {
    println!("\n{}", "All playlists have been processed!".bold());

    for playlist in &summary.summaries {
        if playlist.failed.is_empty() {
            println!(
                "{} {} ({} videos)",
                "✓".green(),
                playlist.folder,
                playlist.total
            );
        } else {
            let indexes: Vec<String> = playlist.failed.iter().map(|i| i.to_string()).collect();
            println!(
                "{} {} ({} of {} failed: video {})",
                "✗".red(),
                playlist.folder,
                playlist.failed_count(),
                playlist.total,
                indexes.join(", ")
            );
        }
    }
    for folder in &summary.failed_playlists {
        println!("{} {} (playlist failed)", "✗".red(), folder);
    }

    if summary.is_clean() {
        println!("{}", "All downloads completed successfully.".green());
    } else {
        println!(
            "{}",
            format!(
                "{} failed items, {} failed playlists. Artifacts were kept for manual cleanup.",
                summary.total_failed_items(),
                summary.failed_playlists.len()
            )
            .yellow()
        );
    }
}
