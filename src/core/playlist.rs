//! Playlist processing - sequential items, failure tally
//!
//! Items run strictly one at a time, in playlist order, with a fixed pause
//! between them. The source and the wrapped tool do not tolerate parallel
//! bursts well, so the sequencing is a policy, not a shortcut. One failed
//! item never aborts the rest of the playlist.

use crate::core::item::{ItemDownloader, ItemRequest};
use crate::core::process::run_tool;
use crate::error::{Result, YtBatchError};
use crate::types::{Job, PlaylistInfo, PlaylistSummary};
use crate::utils::paths::ensure_dir;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

/// Upper bound on entries pulled from a single playlist query
const PLAYLIST_ITEM_RANGE: &str = "1-1000";

/// Processes one playlist end to end
#[derive(Debug, Clone)]
pub struct PlaylistProcessor {
    pub tool: PathBuf,
    /// Root directory that per-playlist folders are created under
    pub downloads_root: PathBuf,
    pub item: ItemDownloader,
    /// Pause between consecutive items, separate from retry backoff
    pub inter_item_delay: Duration,
}

impl PlaylistProcessor {
    pub fn new(tool: impl Into<PathBuf>, downloads_root: impl Into<PathBuf>) -> Self {
        let tool = tool.into();
        Self {
            item: ItemDownloader::new(&tool),
            tool,
            downloads_root: downloads_root.into(),
            inter_item_delay: Duration::from_millis(1000),
        }
    }

    /// Download every item of `job`'s playlist into its folder.
    /// Fails only for playlist-fatal conditions (no metadata, no entries);
    /// item failures are tallied into the summary instead.
    pub async fn process(&self, job: &Job) -> Result<PlaylistSummary> {
        ensure_dir(&self.downloads_root).await?;
        let playlist_dir = self.downloads_root.join(&job.folder);
        ensure_dir(&playlist_dir).await?;

        println!("\n{}", format!("Processing Playlist: {}", job.folder).bold());
        println!("Getting playlist information...");

        let info = self.fetch_info(&job.url).await?;
        if info.entries.is_empty() {
            return Err(YtBatchError::Playlist("No videos found in playlist".into()));
        }

        let total = info.entries.len();
        println!(
            "Found {} videos in playlist: {}",
            total.to_string().cyan(),
            job.folder
        );
        println!("Starting downloads...");

        let mut failed = Vec::new();
        for (i, entry) in info.entries.iter().enumerate() {
            let index = i + 1;
            let req = ItemRequest {
                url: format!("https://www.youtube.com/watch?v={}", entry.id),
                template: playlist_dir.join(format!(
                    "{index}-%(title).50s.{}",
                    job.kind.extension()
                )),
                ceiling: job.ceiling,
                kind: job.kind,
                index,
                total,
            };

            let outcome = self.item.download(&req).await;
            if outcome.is_failure() {
                failed.push(index);
            }

            if index < total {
                sleep(self.inter_item_delay).await;
            }
        }

        if !failed.is_empty() {
            println!(
                "\n{}",
                format!(
                    "Failed to download {} videos from playlist: {}",
                    failed.len(),
                    job.folder
                )
                .red()
            );
        }
        println!(
            "\n{}",
            format!("Playlist {} downloads completed!", job.folder).green()
        );

        Ok(PlaylistSummary {
            folder: job.folder.clone(),
            total,
            failed,
        })
    }

    /// Flattened playlist metadata as a single JSON payload
    async fn fetch_info(&self, url: &str) -> Result<PlaylistInfo> {
        let args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--playlist-items".to_string(),
            PLAYLIST_ITEM_RANGE.to_string(),
            "--flat-playlist".to_string(),
            url.to_string(),
        ];

        let output = run_tool(&self.tool, &args, None)
            .await
            .map_err(|e| YtBatchError::Playlist(format!("Failed to get playlist info: {e}")))?;

        if output.stdout.trim().is_empty() {
            return Err(YtBatchError::Playlist("Failed to get playlist info".into()));
        }

        serde_json::from_str(output.stdout.trim())
            .map_err(|_| YtBatchError::Playlist("Failed to parse playlist info".into()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::fake_tool;
    use crate::core::retry::RetryPolicy;
    use crate::types::DownloadKind;

    fn quick_processor(tool: impl Into<PathBuf>, root: impl Into<PathBuf>) -> PlaylistProcessor {
        let mut processor = PlaylistProcessor::new(tool, root);
        processor.inter_item_delay = Duration::ZERO;
        processor.item.pacing = Duration::ZERO;
        processor.item.fallback_delay = Duration::ZERO;
        processor.item.retry = RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::ZERO,
        };
        processor
    }

    fn job(folder: &str) -> Job {
        Job {
            url: format!("https://www.youtube.com/playlist?list={folder}"),
            folder: folder.into(),
            ceiling: 720,
            kind: DownloadKind::Both,
        }
    }

    /// Fake yt-dlp covering the whole item flow: metadata, filename
    /// resolution (template expanded with the video id), format listing,
    /// and downloads that fail for any id listed in `failing_ids`.
    fn full_tool_body(failing_ids: &str) -> String {
        format!(
            r#"for a in "$@"; do
  if [ "$prev" = "-o" ] || [ "$prev" = "--output" ]; then tmpl="$a"; fi
  prev="$a"
  last="$a"
done
id=${{last##*v=}}
out=$(printf '%s' "$tmpl" | sed "s/%(title)\.50s/$id/")
case "$*" in
  *--dump-single-json*)
    echo '{{"title":"pl","entries":[{{"id":"aaa"}},{{"id":"bbb"}},{{"id":"ccc"}}]}}'
    exit 0;;
  *--get-filename*) echo "$out"; exit 0;;
  *--list-formats*) echo "136 mp4 1280x720 720p 30 | avc1"; exit 0;;
  *)
    case "{failing_ids}" in
      *"$id"*) exit 1;;
    esac
    echo data > "$out"
    exit 0;;
esac"#
        )
    }

    #[tokio::test]
    async fn all_items_download_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool::install(dir.path(), &full_tool_body("none"));
        let root = dir.path().join("downloads");

        let summary = quick_processor(&tool, &root).process(&job("pl")).await.unwrap();

        assert_eq!(summary.total, 3);
        assert!(summary.failed.is_empty());
        for (i, id) in ["aaa", "bbb", "ccc"].iter().enumerate() {
            assert!(root.join("pl").join(format!("{}-{id}.mp4", i + 1)).exists());
        }

        // Manifest order: item URLs appear in entry order in the log.
        let calls = fake_tool::invocations(dir.path());
        let order: Vec<usize> = ["v=aaa", "v=bbb", "v=ccc"]
            .iter()
            .map(|v| calls.iter().position(|c| c.contains(v)).unwrap())
            .collect();
        assert!(order[0] < order[1] && order[1] < order[2]);
    }

    #[tokio::test]
    async fn one_failed_item_never_aborts_the_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool::install(dir.path(), &full_tool_body("bbb"));
        let root = dir.path().join("downloads");

        let summary = quick_processor(&tool, &root).process(&job("pl")).await.unwrap();

        // Item 2 fails primary and fallback; 1 and 3 still complete.
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, vec![2]);
        assert!(root.join("pl/1-aaa.mp4").exists());
        assert!(!root.join("pl/2-bbb.mp4").exists());
        assert!(root.join("pl/3-ccc.mp4").exists());
    }

    #[tokio::test]
    async fn empty_playlist_is_fatal_for_the_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool::install(
            dir.path(),
            r#"echo '{"title":"pl","entries":[]}'; exit 0"#,
        );

        let err = quick_processor(&tool, dir.path().join("downloads"))
            .process(&job("pl"))
            .await
            .unwrap_err();

        assert!(matches!(err, YtBatchError::Playlist(_)));
    }

    #[tokio::test]
    async fn unparseable_metadata_is_fatal_for_the_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool::install(dir.path(), r#"echo 'not json'; exit 0"#);

        let err = quick_processor(&tool, dir.path().join("downloads"))
            .process(&job("pl"))
            .await
            .unwrap_err();

        assert!(matches!(err, YtBatchError::Playlist(_)));
    }
}
