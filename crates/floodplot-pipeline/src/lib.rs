//! floodplot-pipeline: flood-fill tool path planning (sans-IO).
//!
//! Converts a raster color image into an ordered sequence of pen-up /
//! pen-down moves for a plotter:
//!
//! 1. Derive the cell size from the tool and paper widths.
//! 2. For each palette color in order, raster-scan the cell grid.
//! 3. Each untouched cell of that color seeds a breadth-first flood fill
//!    that draws its whole blob and marks it in the visited mask.
//! 4. Between consecutive cells, draw on if they are neighbours,
//!    otherwise lift, travel and lower.
//! 5. Park the tool at the origin.
//!
//! This crate has **no I/O dependencies**: moves leave through the
//! [`MoveSink`] trait, implemented by the serializers in
//! `floodplot-export`.

pub mod color;
pub mod convert;
pub mod decode;
pub mod diagnostics;
pub mod flood;
pub mod palette;
pub mod plan;
pub mod sample;
pub mod scan;
pub mod types;
pub mod visited;

pub use color::Color;
pub use convert::{Conversion, ConvertOutcome};
pub use diagnostics::{Clock, ConvertDiagnostics, NoClock};
pub use palette::{Palette, Quantizer};
pub use plan::{Cursor, MoveSink, PathPlanner};
pub use types::{
    ConvertError, ConvertSummary, Dimensions, GridPoint, Move, Pen, PlotConfig, RgbImage,
};
pub use visited::VisitedMask;

/// Convert an image into its full move sequence.
///
/// # Errors
///
/// Returns [`ConvertError::InvalidInput`] for a zero-size image or an
/// invalid config, and [`ConvertError::InvariantViolation`] if the
/// quantizer breaks its contract.
pub fn convert<Q: Quantizer + ?Sized>(
    image: &RgbImage,
    quantizer: &Q,
    config: &PlotConfig,
) -> Result<Vec<Move>, ConvertError> {
    let mut moves = Vec::new();
    convert_into(image, quantizer, config, &mut moves)?;
    Ok(moves)
}

/// Convert an image, streaming moves into `sink`.
///
/// # Errors
///
/// As [`convert`], plus [`ConvertError::Sink`] if the sink fails. The run
/// stops at the first sink failure; the sink keeps whatever it accepted.
pub fn convert_into<Q, S>(
    image: &RgbImage,
    quantizer: &Q,
    config: &PlotConfig,
    sink: &mut S,
) -> Result<ConvertSummary, ConvertError>
where
    Q: Quantizer + ?Sized,
    S: MoveSink + ?Sized,
{
    let outcome = Conversion::new(image, quantizer, config)?.run(sink, &NoClock)?;
    Ok(outcome.diagnostics.summary)
}

/// Convert an image with timing diagnostics and the final visited mask.
///
/// # Errors
///
/// As [`convert_into`].
pub fn convert_with_diagnostics<Q, S, C>(
    image: &RgbImage,
    quantizer: &Q,
    config: &PlotConfig,
    sink: &mut S,
    clock: &C,
) -> Result<ConvertOutcome, ConvertError>
where
    Q: Quantizer + ?Sized,
    S: MoveSink + ?Sized,
    C: Clock,
{
    Conversion::new(image, quantizer, config)?.run(sink, clock)
}

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) and convert them.
///
/// # Errors
///
/// Returns [`ConvertError::EmptyInput`] or [`ConvertError::ImageDecode`]
/// for unreadable input, otherwise as [`convert_into`].
pub fn process<Q, S>(
    image_bytes: &[u8],
    quantizer: &Q,
    config: &PlotConfig,
    sink: &mut S,
) -> Result<ConvertSummary, ConvertError>
where
    Q: Quantizer + ?Sized,
    S: MoveSink + ?Sized,
{
    let image = decode::decode_rgb(image_bytes)?;
    convert_into(&image, quantizer, config, sink)
}
