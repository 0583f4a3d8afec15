//! Visited mask: which cells have already been committed to output.
//!
//! Pixel-resolution, but only ever written in whole cell rectangles.
//! The mask is monotonic for a run: nothing ever clears it.

use image::{GrayImage, Luma};

use crate::sample::ClampedRect;
use crate::types::Dimensions;

/// Value painted into touched pixels.
const TOUCHED: Luma<u8> = Luma([255]);

/// Tracks committed cells for one conversion run.
#[derive(Debug, Clone)]
pub struct VisitedMask {
    mask: GrayImage,
    diameter: i64,
}

impl VisitedMask {
    /// An untouched mask matching `dimensions`, queried in
    /// `diameter`-sized cells.
    #[must_use]
    pub fn new(dimensions: Dimensions, diameter: u32) -> Self {
        Self {
            mask: GrayImage::new(dimensions.width, dimensions.height),
            diameter: i64::from(diameter.max(1)),
        }
    }

    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.mask.width(),
            height: self.mask.height(),
        }
    }

    /// Whether the cell at `(x0, y0)` has been touched.
    ///
    /// Also `true` when the clamped cell holds no pixels at all, so that
    /// off-image positions read as blocked and flood fill never walks
    /// past the edges.
    #[must_use]
    pub fn is_region_touched(&self, x0: i64, y0: i64) -> bool {
        let rect = ClampedRect::new(
            x0,
            y0,
            x0 + self.diameter,
            y0 + self.diameter,
            self.dimensions(),
        );
        if rect.is_empty() {
            return true;
        }
        rect.pixels()
            .any(|(x, y)| self.mask.get_pixel(x, y).0[0] != 0)
    }

    /// Paint `(x0, y0)`-`(x1, y1)` as touched, clamped into the image.
    ///
    /// Idempotent.
    pub fn mark_region_touched(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let rect = ClampedRect::new(x0, y0, x1, y1, self.dimensions());
        for (x, y) in rect.pixels() {
            self.mask.put_pixel(x, y, TOUCHED);
        }
    }

    /// Paint the whole cell whose top-left corner is `(x, y)`.
    pub fn mark_cell(&mut self, x: i64, y: i64) {
        self.mark_region_touched(x, y, x + self.diameter, y + self.diameter);
    }

    /// Number of touched pixels.
    #[must_use]
    pub fn touched_pixels(&self) -> u64 {
        self.mask.pixels().filter(|p| p.0[0] != 0).count() as u64
    }

    /// The mask as an image: 0 for untouched, 255 for touched.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.mask
    }

    /// Consume the mask, returning the underlying image.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.mask
    }
}
