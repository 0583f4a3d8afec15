//! Image-to-paper coordinate mapping.
//!
//! The pipeline works in image pixels with Y pointing down. Plotters
//! work in millimetres with the origin at the paper center and Y pointing
//! up. A [`CoordinateMapper`] bridges the two.

use floodplot_pipeline::Dimensions;

/// Maps image pixel coordinates to device coordinates.
pub trait CoordinateMapper {
    /// Device coordinates of pixel `(x, y)`.
    fn to_paper(&self, x: i64, y: i64) -> (f64, f64);
}

/// Leaves pixel coordinates unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelMapper;

impl CoordinateMapper for PixelMapper {
    #[allow(clippy::cast_precision_loss)]
    fn to_paper(&self, x: i64, y: i64) -> (f64, f64) {
        (x as f64, y as f64)
    }
}

/// Fits the image onto the paper, centered, with a uniform scale and
/// the Y axis flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperMapper {
    scale: f64,
    center_x: f64,
    center_y: f64,
}

impl PaperMapper {
    /// Largest uniform scale that fits `dimensions` inside a paper of
    /// `paper_width × paper_height`.
    ///
    /// A zero-size image maps everything to the paper center.
    #[must_use]
    pub fn fit(dimensions: Dimensions, paper_width: f64, paper_height: f64) -> Self {
        let w = f64::from(dimensions.width);
        let h = f64::from(dimensions.height);
        let scale = if w > 0.0 && h > 0.0 {
            (paper_width / w).min(paper_height / h)
        } else {
            0.0
        };
        Self {
            scale,
            center_x: w / 2.0,
            center_y: h / 2.0,
        }
    }

    /// Millimetres per pixel.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }
}

impl CoordinateMapper for PaperMapper {
    #[allow(clippy::cast_precision_loss)]
    fn to_paper(&self, x: i64, y: i64) -> (f64, f64) {
        (
            (x as f64 - self.center_x) * self.scale,
            (self.center_y - y as f64) * self.scale,
        )
    }
}
