//! One conversion run: every drawable color, in palette order.
//!
//! A [`Conversion`] owns the run-scoped state (visited mask and path
//! planner) and is consumed by [`Conversion::run`]. For each non-background
//! palette index it tells the sink to select the tool, lifts the pen, and
//! scans for blobs. After the last color it parks the tool at the origin.

use image::RgbImage;

use crate::diagnostics::{Clock, ColorDiagnostics, ConvertDiagnostics};
use crate::palette::Quantizer;
use crate::plan::{MoveSink, PathPlanner, sink_error};
use crate::sample::BlockSampler;
use crate::scan::scan_color;
use crate::types::{ConvertError, ConvertSummary, Dimensions, GridPoint, PlotConfig};
use crate::visited::VisitedMask;

/// What a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    /// Counts and timings.
    pub diagnostics: ConvertDiagnostics,
    /// Final visited mask (every drawn cell is touched).
    pub mask: VisitedMask,
}

/// A validated, ready-to-run conversion.
#[derive(Debug)]
pub struct Conversion<'a, Q: ?Sized> {
    sampler: BlockSampler<'a, Q>,
    mask: VisitedMask,
    planner: PathPlanner,
}

impl<'a, Q: Quantizer + ?Sized> Conversion<'a, Q> {
    /// Validate inputs and set up run state.
    ///
    /// The cursor starts at the image center with the pen up.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidInput`] for a zero-size image or an
    /// invalid config, and [`ConvertError::InvariantViolation`] for an
    /// empty palette.
    pub fn new(
        image: &'a RgbImage,
        quantizer: &'a Q,
        config: &PlotConfig,
    ) -> Result<Self, ConvertError> {
        let dimensions = Dimensions::of(image);
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(ConvertError::InvalidInput(format!(
                "image must be non-empty, got {}x{}",
                dimensions.width, dimensions.height
            )));
        }
        config.validate()?;
        if quantizer.is_empty() {
            return Err(ConvertError::InvariantViolation(
                "palette has no colors".to_string(),
            ));
        }

        // A cell larger than the image samples the same clamped rectangle.
        let diameter = config
            .cell_diameter(dimensions.width)
            .min(dimensions.width.max(dimensions.height));
        let start = GridPoint::new(
            i64::from(dimensions.width / 2),
            i64::from(dimensions.height / 2),
        );

        Ok(Self {
            sampler: BlockSampler::new(image, quantizer, diameter),
            mask: VisitedMask::new(dimensions, diameter),
            planner: PathPlanner::new(diameter, start),
        })
    }

    /// Cell size in pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn diameter(&self) -> u32 {
        self.sampler.diameter() as u32
    }

    /// Run every drawable color through `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Sink`] as soon as the sink fails; the sink
    /// keeps whatever it had accepted. Returns
    /// [`ConvertError::InvariantViolation`] if the quantizer misbehaves.
    pub fn run<S, C>(mut self, sink: &mut S, clock: &C) -> Result<ConvertOutcome, ConvertError>
    where
        S: MoveSink + ?Sized,
        C: Clock,
    {
        let run_start = clock.now();
        let dimensions = self.sampler.dimensions();
        let quantizer = self.sampler.quantizer();
        let mut summary = ConvertSummary {
            diameter: self.diameter(),
            ..ConvertSummary::default()
        };
        let mut colors = Vec::new();

        log::info!(
            "converting {}x{} image, cell size {}px, {} palette colors",
            dimensions.width,
            dimensions.height,
            summary.diameter,
            quantizer.len(),
        );

        for index in 0..quantizer.len() {
            if quantizer.is_background(index) {
                continue;
            }
            let color = quantizer.color(index).ok_or_else(|| {
                ConvertError::InvariantViolation(format!("palette has no color at index {index}"))
            })?;

            let color_start = clock.now();
            sink.select_tool(index, color).map_err(sink_error)?;
            self.planner.lift();

            let stats = scan_color(
                &self.sampler,
                &mut self.mask,
                &mut self.planner,
                sink,
                index,
            )?;
            log::info!(
                "color {index} ({}): {} blobs, {} cells",
                color.to_hex(),
                stats.blobs,
                stats.cells,
            );

            summary.blobs += stats.blobs;
            summary.cells += stats.cells;
            summary.jumps += stats.jumps;
            colors.push(ColorDiagnostics {
                index,
                color: color.to_hex(),
                blobs: stats.blobs,
                cells: stats.cells,
                jumps: stats.jumps,
                peak_queue: stats.peak_queue,
                duration: clock.elapsed(&color_start),
            });
        }

        self.planner.park(sink)?;
        sink.finish().map_err(sink_error)?;

        let planner_stats = self.planner.stats();
        summary.moves = planner_stats.moves;

        Ok(ConvertOutcome {
            diagnostics: ConvertDiagnostics {
                dimensions,
                colors,
                summary,
                pen_lifts: planner_stats.pen_lifts,
                touched_pixels: self.mask.touched_pixels(),
                total_duration: clock.elapsed(&run_start),
            },
            mask: self.mask,
        })
    }
}
