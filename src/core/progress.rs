//! Progress estimation - sliding-window throughput and ETA
//!
//! Byte-chunk events are kept in a trailing 3-second window. Throughput is
//! the window's bytes over its time span; with a single event (or a zero
//! span) the full window length is used as the denominator so the rate never
//! spikes or divides by zero.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_millis(3000);
const DAY: Duration = Duration::from_secs(24 * 3600);

/// One observed burst of downloaded bytes
#[derive(Debug, Clone, Copy)]
struct ChunkEvent {
    bytes: u64,
    at: Instant,
}

/// Estimated time to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// Not enough signal: zero rate, unknown total, or nothing remaining
    Calculating,
    /// Longer than a day; exact hours are not worth reporting
    OverADay,
    In(Duration),
}

/// Rendered progress state for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Floor percentage in [0, 100]; 0 when the total size is unknown
    pub percentage: u8,
    /// e.g. "1.5 MB/s"
    pub rate: String,
    /// e.g. "12.3 MB / 101.2 MB"
    pub transferred: String,
    /// e.g. "4m 12s", "calculating...", "> 24h"
    pub eta: String,
}

/// Sliding-window throughput and ETA estimator for one download
#[derive(Debug)]
pub struct ProgressEstimator {
    window: Duration,
    chunks: VecDeque<ChunkEvent>,
    downloaded: u64,
    total: Option<u64>,
}

impl ProgressEstimator {
    pub fn new(total: Option<u64>) -> Self {
        Self::with_window(total, DEFAULT_WINDOW)
    }

    pub fn with_window(total: Option<u64>, window: Duration) -> Self {
        Self {
            window,
            chunks: VecDeque::new(),
            downloaded: 0,
            total,
        }
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Record a chunk arrival, then evict everything older than the window.
    /// Timestamps must be non-decreasing.
    pub fn record(&mut self, bytes: u64, at: Instant) {
        self.downloaded += bytes;
        self.chunks.push_back(ChunkEvent { bytes, at });

        let cutoff = at.checked_sub(self.window);
        if let Some(cutoff) = cutoff {
            while let Some(front) = self.chunks.front() {
                if front.at < cutoff {
                    self.chunks.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Bytes per second over the retained window
    pub fn throughput(&self) -> f64 {
        if self.chunks.is_empty() {
            return 0.0;
        }

        let total_bytes: u64 = self.chunks.iter().map(|c| c.bytes).sum();
        let window_secs = self.window.as_secs_f64();

        let oldest = self.chunks.front().expect("non-empty").at;
        let newest = self.chunks.back().expect("non-empty").at;
        let span = newest.duration_since(oldest).as_secs_f64();

        if self.chunks.len() == 1 || span <= 0.0 {
            return total_bytes as f64 / window_secs;
        }
        total_bytes as f64 / span
    }

    /// Floor percentage clamped to [0, 100]; 0 when total is unknown
    pub fn percentage(&self) -> u8 {
        match self.total {
            Some(total) if total > 0 => {
                let pct = (self.downloaded as f64 / total as f64) * 100.0;
                pct.floor().clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }

    pub fn eta(&self) -> Eta {
        let remaining = match self.total {
            Some(total) if total > self.downloaded => total - self.downloaded,
            _ => return Eta::Calculating,
        };
        estimate_eta(self.throughput(), remaining)
    }

    /// Render the current state for a progress line
    pub fn snapshot(&self) -> ProgressSnapshot {
        let rate = format!("{}/s", format_bytes(self.throughput().max(0.0) as u64));
        let transferred = match self.total {
            Some(total) => format!(
                "{} / {}",
                format_bytes(self.downloaded),
                format_bytes(total)
            ),
            None => format_bytes(self.downloaded),
        };

        ProgressSnapshot {
            percentage: self.percentage(),
            rate,
            transferred,
            eta: format_eta(self.eta()),
        }
    }
}

/// ETA from a rate and a remaining byte count
pub fn estimate_eta(bytes_per_sec: f64, remaining: u64) -> Eta {
    if bytes_per_sec <= 0.0 || !bytes_per_sec.is_finite() || remaining == 0 {
        return Eta::Calculating;
    }

    let secs = remaining as f64 / bytes_per_sec;
    if !secs.is_finite() || secs <= 0.0 {
        return Eta::Calculating;
    }

    let eta = Duration::from_secs_f64(secs);
    if eta > DAY { Eta::OverADay } else { Eta::In(eta) }
}

/// "1h 2m 3s" style rendering; sentinels pass through
pub fn format_eta(eta: Eta) -> String {
    match eta {
        Eta::Calculating => "calculating...".to_string(),
        Eta::OverADay => "> 24h".to_string(),
        Eta::In(d) => {
            let total = d.as_secs();
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;

            let mut parts = Vec::new();
            if hours > 0 {
                parts.push(format!("{hours}h"));
            }
            if minutes > 0 {
                parts.push(format!("{minutes}m"));
            }
            if secs > 0 || parts.is_empty() {
                parts.push(format!("{secs}s"));
            }
            parts.join(" ")
        }
    }
}

/// 1024-based human byte string, e.g. "10.18 MB"
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);

    // Trim trailing zeros the way "%g" would: 1.50 MB -> 1.5 MB, 2.00 -> 2
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", s, UNITS[exp])
}
