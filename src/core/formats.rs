//! Format selection - quality ceiling with min fallback
//!
//! Queries yt-dlp for the encodings available on an item and picks the best
//! height not exceeding the requested ceiling. When every available height
//! exceeds the ceiling, the *smallest* one wins: a user who asked for 480p
//! gets the closest thing to it, never a surprise 4K file.

use crate::core::process::run_tool;
use crate::types::DownloadKind;
use colored::Colorize;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

/// Query yt-dlp for the mp4 heights available on `url`, descending.
/// A query failure degrades to an empty list; the caller falls back to the
/// generic "best" directive, so this is never fatal to the item.
pub async fn available_heights(tool: &Path, url: &str) -> Vec<u32> {
    let args = vec![
        "--list-formats".to_string(),
        "--no-warnings".to_string(),
        url.to_string(),
    ];

    match run_tool(tool, &args, None).await {
        Ok(output) => parse_heights(&output.stdout),
        Err(e) => {
            eprintln!("{} {}", "Error getting formats:".yellow(), e);
            Vec::new()
        }
    }
}

/// Parse `--list-formats` output: lines mentioning mp4, `<height>p` markers,
/// deduplicated, sorted descending.
pub fn parse_heights(listing: &str) -> Vec<u32> {
    let marker = Regex::new(r"\b(\d+)p\b").expect("Invalid regex");

    let mut heights = BTreeSet::new();
    for line in listing.lines() {
        if !line.contains("mp4") {
            continue;
        }
        if let Some(cap) = marker.captures(line)
            && let Ok(h) = cap[1].parse::<u32>()
        {
            heights.insert(h);
        }
    }

    heights.into_iter().rev().collect()
}

/// Pick the greatest height not exceeding `ceiling`; if none qualifies, the
/// smallest available. `None` only for an empty list.
pub fn select_height(available: &[u32], ceiling: u32) -> Option<u32> {
    available
        .iter()
        .copied()
        .filter(|h| *h <= ceiling)
        .max()
        .or_else(|| available.iter().copied().min())
}

/// Build the yt-dlp format selector for a chosen height.
/// `None` degenerates to a generic best directive that yt-dlp resolves itself.
pub fn format_spec(kind: DownloadKind, height: Option<u32>) -> String {
    match (kind, height) {
        (DownloadKind::Both, Some(h)) => format!(
            "bestvideo[height={h}][ext=mp4]+bestaudio[ext=m4a]/best[height={h}][ext=mp4]/bestvideo[height<={h}]+bestaudio/best[height<={h}]"
        ),
        (DownloadKind::Both, None) => "best".to_string(),
        (DownloadKind::VideoOnly, Some(h)) => {
            format!("bestvideo[height={h}][ext=mp4]/bestvideo[height<={h}]")
        }
        (DownloadKind::VideoOnly, None) => "bestvideo/best".to_string(),
        (DownloadKind::AudioOnly, _) => "bestaudio[ext=m4a]/bestaudio".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LISTING: &str = "\
ID      EXT   RESOLUTION FPS | FILESIZE   TBR PROTO | VCODEC
sb2     mhtml 48x27        1 |                mhtml | images
139     m4a   audio only     |    1.71MiB   49k https | audio only
18      mp4   640x360 360p 30 |   10.18MiB  270k https | avc1.42001E
135     mp4   854x480 480p 30 |            609k https | avc1.4d401f
136     mp4   1280x720 720p 30 |  25.80MiB  684k https | avc1.64001f
137     mp4   1920x1080 1080p 30 | 84.42MiB 2239k https | avc1.640028
248     webm  1920x1080 1080p 30 | 70.10MiB 1859k https | vp9
";

    #[test]
    fn parses_mp4_heights_descending_deduped() {
        let heights = parse_heights(SAMPLE_LISTING);
        assert_eq!(heights, vec![1080, 720, 480, 360]);
    }

    #[test]
    fn ignores_non_mp4_lines() {
        let heights = parse_heights("248 webm 1920x1080 1080p 30 | vp9\n");
        assert!(heights.is_empty());
    }

    #[test]
    fn picks_greatest_at_or_below_ceiling() {
        assert_eq!(select_height(&[1080, 720, 480, 240], 480), Some(480));
        assert_eq!(select_height(&[1080, 720, 360, 240], 480), Some(360));
        assert_eq!(select_height(&[1080, 720, 480, 240], 1080), Some(1080));
    }

    #[test]
    fn falls_back_to_minimum_when_all_exceed_ceiling() {
        // Requesting low quality when only high-resolution streams exist
        // yields the smallest available stream, not the largest.
        assert_eq!(select_height(&[2160, 1080], 480), Some(1080));
        assert_eq!(select_height(&[2160], 480), Some(2160));
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert_eq!(select_height(&[], 1080), None);
    }

    #[test]
    fn format_spec_constrains_height() {
        let spec = format_spec(DownloadKind::Both, Some(720));
        assert!(spec.starts_with("bestvideo[height=720][ext=mp4]+bestaudio[ext=m4a]"));
        assert!(spec.ends_with("best[height<=720]"));
    }

    #[test]
    fn format_spec_degenerates_to_best() {
        assert_eq!(format_spec(DownloadKind::Both, None), "best");
        assert_eq!(
            format_spec(DownloadKind::AudioOnly, Some(720)),
            "bestaudio[ext=m4a]/bestaudio"
        );
    }
}
