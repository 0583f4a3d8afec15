//! Block sampling: average the color of a rectangular cell.
//!
//! Both the sampler and the visited mask clamp rectangles the same way,
//! through [`ClampedRect`]: the origin is raised to 0 and the far edge is
//! capped at `dimension - 1`, then the rectangle is read half-open. The
//! cap means the last pixel row and column of an image are never read.

use image::RgbImage;

use crate::color::Color;
use crate::palette::Quantizer;
use crate::types::{ConvertError, Dimensions};

/// A pixel rectangle `[x0, x1) × [y0, y1)` clamped into image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedRect {
    /// Left edge, inclusive.
    pub x0: u32,
    /// Top edge, inclusive.
    pub y0: u32,
    /// Right edge, exclusive.
    pub x1: u32,
    /// Bottom edge, exclusive.
    pub y1: u32,
}

impl ClampedRect {
    /// Clamp an arbitrary rectangle into `dimensions`.
    ///
    /// The result is empty (see [`is_empty`](Self::is_empty)) when the
    /// input lies entirely outside the image.
    #[must_use]
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64, dimensions: Dimensions) -> Self {
        let max_x = i64::from(dimensions.width) - 1;
        let max_y = i64::from(dimensions.height) - 1;
        let x0 = clamp_low(x0);
        let y0 = clamp_low(y0);
        let x1 = clamp_low(x1.min(max_x));
        let y1 = clamp_low(y1.min(max_y));
        Self {
            x0,
            y0,
            x1: x1.max(x0),
            y1: y1.max(y0),
        }
    }

    /// Returns `true` if the rectangle holds no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Number of pixels inside the rectangle.
    #[must_use]
    pub const fn area(&self) -> u64 {
        (self.x1 - self.x0) as u64 * (self.y1 - self.y0) as u64
    }

    /// Iterate over every `(x, y)` inside the rectangle, row-major.
    pub fn pixels(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Raise negatives to 0 and saturate anything beyond `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_low(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

/// Average color of the pixels inside `(x0, y0)`-`(x1, y1)`.
///
/// Returns [`Color::WHITE`] when the clamped rectangle is empty, which
/// callers treat as "no data".
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_color(image: &RgbImage, x0: i64, y0: i64, x1: i64, y1: i64) -> Color {
    let rect = ClampedRect::new(x0, y0, x1, y1, Dimensions::of(image));
    if rect.is_empty() {
        return Color::WHITE;
    }

    let sum = rect
        .pixels()
        .fold(Color::BLACK, |acc, (x, y)| acc + Color::from(*image.get_pixel(x, y)));
    sum * (1.0 / rect.area() as f32)
}

/// Average color of the `diameter × diameter` cell whose top-left corner
/// is `(x, y)`.
#[must_use]
pub fn sample_cell(image: &RgbImage, x: i64, y: i64, diameter: i64) -> Color {
    average_color(image, x, y, x + diameter, y + diameter)
}

/// Samples and quantizes whole cells of one image.
///
/// Couples the block averager to a [`Quantizer`] and enforces the
/// quantizer's contract: an index outside the palette is reported as
/// [`ConvertError::InvariantViolation`] instead of being compared.
#[derive(Debug)]
pub struct BlockSampler<'a, Q: ?Sized> {
    image: &'a RgbImage,
    quantizer: &'a Q,
    diameter: i64,
}

impl<'a, Q: Quantizer + ?Sized> BlockSampler<'a, Q> {
    /// Sample `image` in `diameter`-sized cells. A zero diameter is
    /// treated as 1.
    #[must_use]
    pub fn new(image: &'a RgbImage, quantizer: &'a Q, diameter: u32) -> Self {
        Self {
            image,
            quantizer,
            diameter: i64::from(diameter.max(1)),
        }
    }

    /// Cell size in pixels.
    #[must_use]
    pub const fn diameter(&self) -> i64 {
        self.diameter
    }

    /// Dimensions of the sampled image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(self.image)
    }

    /// The quantizer cells are classified with.
    #[must_use]
    pub const fn quantizer(&self) -> &'a Q {
        self.quantizer
    }

    /// Palette index of the cell whose top-left corner is `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvariantViolation`] if the quantizer
    /// answers with an index outside `0..len()`.
    pub fn quantize_cell(&self, x: i64, y: i64) -> Result<usize, ConvertError> {
        let color = sample_cell(self.image, x, y, self.diameter);
        let index = self.quantizer.quantize(color);
        if index >= self.quantizer.len() {
            return Err(ConvertError::InvariantViolation(format!(
                "quantizer returned index {index} for a palette of {} colors",
                self.quantizer.len()
            )));
        }
        Ok(index)
    }

    /// Whether the cell at `(x, y)` quantizes to `color_index`.
    ///
    /// # Errors
    ///
    /// See [`quantize_cell`](Self::quantize_cell).
    pub fn matches(&self, color_index: usize, x: i64, y: i64) -> Result<bool, ConvertError> {
        Ok(self.quantize_cell(x, y)? == color_index)
    }
}
