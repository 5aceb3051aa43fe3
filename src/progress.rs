//! Translation of raw engine progress into normalized progress events
//!
//! The engine reports progress as loosely-typed JSON dictionaries keyed by a
//! `status` field. [`RawProgress`] gives those a closed set of shapes, and
//! [`translate`] maps the shapes onto [`ProgressEvent`]s. Only active
//! transfers with a known, positive total produce an event; everything else is
//! ignored.

use serde::{Deserialize, Serialize};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Raw progress payload as reported by the engine
///
/// All numeric fields are optional and accepted as floats, since the engine
/// emits integers, floats or `null` depending on what it knows.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RawProgress {
    /// Bytes are being transferred
    Downloading {
        /// Bytes received so far
        #[serde(default)]
        downloaded_bytes: Option<f64>,
        /// Exact size, when the server reported one
        #[serde(default)]
        total_bytes: Option<f64>,
        /// Estimated size, for fragmented streams
        #[serde(default)]
        total_bytes_estimate: Option<f64>,
        /// Transfer rate in bytes per second
        #[serde(default)]
        speed: Option<f64>,
        /// File being written
        #[serde(default)]
        filename: Option<String>,
    },
    /// One file finished transferring (post-processing may follow)
    Finished {
        /// File that was written
        #[serde(default)]
        filename: Option<String>,
    },
    /// The engine gave up on the current file
    Error {
        /// File that was being written
        #[serde(default)]
        filename: Option<String>,
    },
    /// Any status this crate does not model
    #[serde(other)]
    Other,
}

impl RawProgress {
    /// Parse a JSON progress dictionary
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Normalized progress snapshot for one job
///
/// Each event supersedes the previous one; events are never merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion in `[0, 1]`
    pub fraction: f64,
    /// Transfer rate in bytes per second
    pub rate_bps: u64,
    /// Bytes received so far
    pub downloaded_bytes: u64,
    /// Total size used to compute `fraction`
    pub total_bytes: u64,
    /// Human-readable summary, e.g. `25.0% | 1.5 MB/s`
    pub label: String,
}

impl ProgressEvent {
    /// Completion as a percentage
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }

    /// This event, or `stored` when this one would move progress backwards
    ///
    /// A lower event keeps only its transfer rate; fraction and byte counts
    /// stay those of `stored` so the snapshot remains self-consistent.
    pub(crate) fn not_below(self, stored: &ProgressEvent) -> Self {
        if self.fraction >= stored.fraction {
            return self;
        }
        Self {
            fraction: stored.fraction,
            rate_bps: self.rate_bps,
            downloaded_bytes: stored.downloaded_bytes,
            total_bytes: stored.total_bytes,
            label: progress_label(stored.fraction, self.rate_bps),
        }
    }
}

/// Translate a raw engine event
///
/// Returns `None` for setup/finalization events and for transfers whose total
/// size is unknown or zero.
pub fn translate(raw: &RawProgress) -> Option<ProgressEvent> {
    let RawProgress::Downloading {
        downloaded_bytes,
        total_bytes,
        total_bytes_estimate,
        speed,
        ..
    } = raw
    else {
        return None;
    };

    let total = positive(*total_bytes).or_else(|| positive(*total_bytes_estimate))?;
    let downloaded = downloaded_bytes.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);

    let fraction = (downloaded / total).clamp(0.0, 1.0);
    let rate_bps = speed
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| s as u64)
        .unwrap_or(0);

    Some(ProgressEvent {
        fraction,
        rate_bps,
        downloaded_bytes: downloaded as u64,
        total_bytes: total as u64,
        label: progress_label(fraction, rate_bps),
    })
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Format a transfer rate as MB/s with one decimal
pub fn format_rate(rate_bps: u64) -> String {
    format!("{:.1} MB/s", rate_bps as f64 / BYTES_PER_MIB)
}

fn progress_label(fraction: f64, rate_bps: u64) -> String {
    format!("{:.1}% | {}", fraction * 100.0, format_rate(rate_bps))
}
