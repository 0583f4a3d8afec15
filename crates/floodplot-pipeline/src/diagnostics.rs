//! Conversion diagnostics: per-color timing and counts.
//!
//! Timestamps come from a caller-supplied [`Clock`] so the pipeline stays
//! free of platform time APIs. Durations are serialized as fractional
//! seconds (`f64`) for JSON compatibility, since `std::time::Duration`
//! does not implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ConvertSummary, Dimensions};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A clock that never advances. Used when timing is not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl Clock for NoClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Diagnostics for one palette color's scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorDiagnostics {
    /// Palette index.
    pub index: usize,
    /// Reference color as `#rrggbb`.
    pub color: String,
    /// Blobs traced.
    pub blobs: usize,
    /// Cells drawn.
    pub cells: usize,
    /// Jumps emitted.
    pub jumps: usize,
    /// Largest flood-fill queue seen.
    pub peak_queue: usize,
    /// Wall-clock duration of the scan (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Diagnostics collected from a single conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertDiagnostics {
    /// Source image dimensions.
    pub dimensions: Dimensions,
    /// One entry per scanned color, in scan order.
    pub colors: Vec<ColorDiagnostics>,
    /// Run totals.
    pub summary: ConvertSummary,
    /// Pen lifts (down to up transitions).
    pub pen_lifts: usize,
    /// Touched pixels in the visited mask at the end of the run.
    pub touched_pixels: u64,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl ConvertDiagnostics {
    /// Fraction of the image covered by the visited mask, 0.0 to 1.0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        let pixels = u64::from(self.dimensions.width) * u64::from(self.dimensions.height);
        if pixels == 0 {
            0.0
        } else {
            self.touched_pixels as f64 / pixels as f64
        }
    }

    /// Human-readable multi-line report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Conversion Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}  |  Cell size: {}px",
            self.dimensions.width, self.dimensions.height, self.summary.diameter,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<8} {:<8} {:>6} {:>8} {:>6} {:>10} {:>10}",
            "Index", "Color", "Blobs", "Cells", "Jumps", "PeakQueue", "Duration"
        ));
        lines.push("-".repeat(64));

        for c in &self.colors {
            lines.push(format!(
                "{:<8} {:<8} {:>6} {:>8} {:>6} {:>10} {:>8.3}ms",
                c.index,
                c.color,
                c.blobs,
                c.cells,
                c.jumps,
                c.peak_queue,
                duration_ms(c.duration),
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Moves: {}  |  Jumps: {}  |  Pen lifts: {}  |  Coverage: {:.1}%",
            self.summary.moves,
            self.summary.jumps,
            self.pen_lifts,
            self.coverage() * 100.0,
        ));

        lines.join("\n")
    }
}

/// Convert a duration to fractional milliseconds.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
