//! floodplot-export: output formats for floodplot move streams.
//!
//! Every format is a [`floodplot_pipeline::MoveSink`], so moves are
//! written as the planner produces them:
//!
//! - [`GcodeWriter`] streams plotter G-code to any `io::Write`.
//! - [`PlotRecorder`] collects strokes for an SVG preview via [`to_svg`].

pub mod gcode;
pub mod mapper;
pub mod svg;

pub use gcode::{GcodeConfig, GcodeWriter};
pub use mapper::{CoordinateMapper, PaperMapper, PixelMapper};
pub use svg::{PlotRecorder, Stroke, SvgMetadata, SvgOptions, to_svg};

/// Errors from writing an output format.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The underlying writer failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
