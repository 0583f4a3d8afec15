//! Shared types for the floodplot conversion pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can hand images to the
/// pipeline without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for the visited mask debug view.
pub use image::GrayImage;

/// A position on the sampling grid, in image pixel coordinates.
///
/// Signed because flood fill probes neighbours one cell beyond the image
/// edges; those probes are rejected by the visited mask, never sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Horizontal position (pixels from left edge).
    pub x: i64,
    /// Vertical position (pixels from top edge).
    pub y: i64,
}

impl GridPoint {
    /// Create a new grid point.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point, saturating at
    /// `i64::MAX`.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// The four orthogonal neighbours one cell away, in flood-fill
    /// enqueue order: +x, -x, +y, -y.
    #[must_use]
    pub const fn neighbors(self, diameter: i64) -> [Self; 4] {
        [
            Self::new(self.x + diameter, self.y),
            Self::new(self.x - diameter, self.y),
            Self::new(self.x, self.y + diameter),
            Self::new(self.x, self.y - diameter),
        ]
    }
}

/// Tool engagement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pen {
    /// Tool lifted: travel without marking.
    Up,
    /// Tool engaged: the move leaves a mark.
    Down,
}

/// A single tool move: target position plus pen state.
///
/// Moves are produced in strict emission order and are the only output
/// of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Target x in image pixel coordinates.
    pub x: i64,
    /// Target y in image pixel coordinates.
    pub y: i64,
    /// Pen state while travelling to the target.
    pub pen: Pen,
}

impl Move {
    /// Create a move to `point` with the given pen state.
    #[must_use]
    pub const fn new(point: GridPoint, pen: Pen) -> Self {
        Self {
            x: point.x,
            y: point.y,
            pen,
        }
    }

    /// The target position.
    #[must_use]
    pub const fn point(&self) -> GridPoint {
        GridPoint::new(self.x, self.y)
    }

    /// Returns `true` for travel moves.
    #[must_use]
    pub const fn is_pen_up(&self) -> bool {
        matches!(self.pen, Pen::Up)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Configuration for a conversion run.
///
/// Only used to derive the cell size: the tool width, expressed in image
/// pixels, quartered so neighbouring strokes overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Physical tool (pen tip) diameter, in the same unit as `paper_width`.
    pub tool_diameter: f64,

    /// Physical drawable paper width.
    pub paper_width: f64,
}

impl PlotConfig {
    /// Default tool diameter in millimetres.
    pub const DEFAULT_TOOL_DIAMETER: f64 = 4.0;

    /// Default paper width in millimetres (A4 portrait).
    pub const DEFAULT_PAPER_WIDTH: f64 = 210.0;

    /// Check that both scalars are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidInput`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.tool_diameter.is_finite() || self.tool_diameter <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "tool diameter must be positive, got {}",
                self.tool_diameter
            )));
        }
        if !self.paper_width.is_finite() || self.paper_width <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "paper width must be positive, got {}",
                self.paper_width
            )));
        }
        Ok(())
    }

    /// Cell size in pixels for an image of the given width:
    /// `max(1, tool_diameter * image_width / (4 * paper_width))`, truncated.
    ///
    /// Never returns 0; a degenerate result clamps to 1 so flood fill
    /// always advances.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_diameter(&self, image_width: u32) -> u32 {
        let df = self.tool_diameter * f64::from(image_width) / (4.0 * self.paper_width);
        // `!(df >= 1.0)` also catches NaN.
        if !(df >= 1.0) {
            return 1;
        }
        df.min(f64::from(u32::MAX)) as u32
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            tool_diameter: Self::DEFAULT_TOOL_DIAMETER,
            paper_width: Self::DEFAULT_PAPER_WIDTH,
        }
    }
}

/// Counts reported by a finished conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    /// Cell size used for sampling and visitation, in pixels.
    pub diameter: u32,
    /// Connected regions traced, across all colors.
    pub blobs: usize,
    /// Cells drawn, across all colors.
    pub cells: usize,
    /// Moves handed to the sink, including the final parking move.
    pub moves: usize,
    /// Pen-up relocations between non-adjacent cells.
    pub jumps: usize,
}

/// Errors that can occur during a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image or configuration cannot be converted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator broke its contract (e.g. a quantizer returned an
    /// index outside the palette).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The move sink failed; the run was aborted and its output is partial.
    #[error("move sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}
