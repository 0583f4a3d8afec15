//! Color quantization: map a sampled color to a palette index.
//!
//! The [`Quantizer`] trait is the seam the scanner and flood fill depend
//! on. [`Palette`] is the stock implementation: an ordered list of
//! reference colors with nearest-neighbour lookup, one of which may be
//! marked as the background that is never drawn.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Maps colors to palette indices.
///
/// Implementations must be deterministic and side-effect free; the
/// conversion samples the same block several times and relies on getting
/// the same index each time.
pub trait Quantizer {
    /// Number of palette entries. Valid indices are `0..len()`.
    fn len(&self) -> usize;

    /// Returns `true` if the palette has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the palette entry nearest to `color`.
    fn quantize(&self, color: Color) -> usize;

    /// Reference color at `index`, if in range.
    fn color(&self, index: usize) -> Option<Color>;

    /// Whether `index` is the background entry, which is never drawn.
    fn is_background(&self, index: usize) -> bool;
}

/// An ordered, fixed list of reference colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Color>,
    background: Option<usize>,
}

impl Palette {
    /// Create a palette with no background entry.
    #[must_use]
    pub const fn new(colors: Vec<Color>) -> Self {
        Self {
            colors,
            background: None,
        }
    }

    /// Mark `index` as the background. Out-of-range indices are ignored.
    #[must_use]
    pub fn with_background(mut self, index: usize) -> Self {
        if index < self.colors.len() {
            self.background = Some(index);
        }
        self
    }

    /// The reference colors, in scan order.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// The background index, if any.
    #[must_use]
    pub const fn background(&self) -> Option<usize> {
        self.background
    }
}

impl Default for Palette {
    /// Black, red, green, blue on a white background.
    fn default() -> Self {
        Self::new(vec![
            Color::BLACK,
            Color::RED,
            Color::GREEN,
            Color::BLUE,
            Color::WHITE,
        ])
        .with_background(4)
    }
}

impl Quantizer for Palette {
    fn len(&self) -> usize {
        self.colors.len()
    }

    /// Nearest entry by squared RGB distance; the earliest entry wins ties.
    fn quantize(&self, color: Color) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, reference) in self.colors.iter().enumerate() {
            let dist = color.distance_squared(*reference);
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best
    }

    fn color(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    fn is_background(&self, index: usize) -> bool {
        self.background == Some(index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_order() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 5);
        assert_eq!(palette.color(0), Some(Color::BLACK));
        assert_eq!(palette.color(1), Some(Color::RED));
        assert_eq!(palette.color(4), Some(Color::WHITE));
        assert!(palette.is_background(4));
        assert!(!palette.is_background(0));
    }

    #[test]
    fn quantize_exact_entries() {
        let palette = Palette::default();
        for (i, c) in palette.colors().iter().enumerate() {
            assert_eq!(palette.quantize(*c), i);
        }
    }

    #[test]
    fn quantize_nearest() {
        let palette = Palette::default();
        assert_eq!(palette.quantize(Color::from_rgb8(200, 30, 30)), 1);
        assert_eq!(palette.quantize(Color::from_rgb8(20, 20, 20)), 0);
        assert_eq!(palette.quantize(Color::from_rgb8(230, 230, 240)), 4);
    }

    #[test]
    fn white_sentinel_quantizes_to_background() {
        let palette = Palette::default();
        let index = palette.quantize(Color::WHITE);
        assert!(palette.is_background(index));
    }

    #[test]
    fn ties_go_to_earliest_entry() {
        let palette = Palette::new(vec![Color::BLACK, Color::WHITE]);
        let mid = Color::new(127.5, 127.5, 127.5);
        assert_eq!(palette.quantize(mid), 0);
    }

    #[test]
    fn out_of_range_background_is_ignored() {
        let palette = Palette::new(vec![Color::BLACK]).with_background(3);
        assert_eq!(palette.background(), None);
    }

    #[test]
    fn serde_round_trip_keeps_background() {
        let palette = Palette::default();
        let json = serde_json::to_string(&palette).unwrap();
        let back: Palette = serde_json::from_str(&json).unwrap();
        assert_eq!(back, palette);
    }
}
