//! Batch controller - per-playlist failure isolation
//!
//! Playlists run in manifest order. A playlist-fatal error is logged and the
//! batch moves on; downloaded files are idempotent append-only artifacts, so
//! nothing is ever rolled back.

use crate::core::playlist::PlaylistProcessor;
use crate::types::{BatchSummary, Job};
use colored::Colorize;

/// Runs every job of a manifest through a playlist processor
#[derive(Debug, Clone)]
pub struct BatchController {
    pub processor: PlaylistProcessor,
}

impl BatchController {
    pub fn new(processor: PlaylistProcessor) -> Self {
        Self { processor }
    }

    /// Process all jobs sequentially; never aborts on a playlist failure.
    pub async fn run(&self, jobs: &[Job]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (i, job) in jobs.iter().enumerate() {
            println!("\n{}", "========================================".dimmed());
            println!("Processing playlist {} of {}", i + 1, jobs.len());
            println!("URL: {}", job.url);
            println!("Folder: {}", job.folder);
            println!("{}", "========================================".dimmed());

            match self.processor.process(job).await {
                Ok(playlist_summary) => summary.summaries.push(playlist_summary),
                Err(e) => {
                    eprintln!(
                        "{} {}",
                        format!("Failed to process playlist {}:", i + 1).red(),
                        e
                    );
                    println!("Continuing with next playlist...");
                    summary.failed_playlists.push(job.folder.clone());
                }
            }
        }

        summary
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::fake_tool;
    use crate::core::retry::RetryPolicy;
    use crate::types::DownloadKind;
    use std::time::Duration;

    fn jobs() -> Vec<Job> {
        ["good", "broken"]
            .into_iter()
            .map(|folder| Job {
                url: format!("https://www.youtube.com/playlist?list={folder}"),
                folder: folder.into(),
                ceiling: 1080,
                kind: DownloadKind::Both,
            })
            .collect()
    }

    #[tokio::test]
    async fn playlist_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();

        // Metadata for the "broken" playlist fails outright; the "good" one
        // has a single item that downloads cleanly.
        let tool = fake_tool::install(
            dir.path(),
            r#"for a in "$@"; do
  if [ "$prev" = "-o" ] || [ "$prev" = "--output" ]; then tmpl="$a"; fi
  prev="$a"
  last="$a"
done
case "$*" in
  *broken*) exit 1;;
  *--dump-single-json*) echo '{"entries":[{"id":"aaa"}]}'; exit 0;;
  *--get-filename*) printf '%s\n' "$tmpl" | sed 's/%(title)\.50s/aaa/'; exit 0;;
  *--list-formats*) echo "137 mp4 1920x1080 1080p 30 | avc1"; exit 0;;
  *) out=$(printf '%s' "$tmpl" | sed 's/%(title)\.50s/aaa/'); echo data > "$out"; exit 0;;
esac"#,
        );

        let mut processor = PlaylistProcessor::new(&tool, dir.path().join("downloads"));
        processor.inter_item_delay = Duration::ZERO;
        processor.item.pacing = Duration::ZERO;
        processor.item.fallback_delay = Duration::ZERO;
        processor.item.retry = RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::ZERO,
        };

        let summary = BatchController::new(processor).run(&jobs()).await;

        assert_eq!(summary.failed_playlists, vec!["broken".to_string()]);
        assert_eq!(summary.summaries.len(), 1);
        assert_eq!(summary.summaries[0].folder, "good");
        assert_eq!(summary.total_failed_items(), 0);
        assert!(!summary.is_clean());
        assert!(dir.path().join("downloads/good/1-aaa.mp4").exists());
    }
}
