//! G-code move sink for pen plotters.
//!
//! Streams the move sequence straight to any [`io::Write`] as it is
//! produced:
//!
//! - a tool change (`M06 T<n>`) before each palette color, followed by a
//!   pen lift;
//! - a pen command (`G00 Z<angle>`) only when the pen state changes;
//! - `G00` for travel moves and `G01` for drawing moves, in millimetres
//!   after mapping through a [`CoordinateMapper`].
//!
//! Pen heights default to the servo angles of the reference firmware
//! (80° up, 10° down).

use std::io::{self, Write};

use floodplot_pipeline::{Color, Move, MoveSink, Pen};
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::mapper::CoordinateMapper;

/// Machine settings for G-code output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeConfig {
    /// Z value (servo angle) for a lifted pen.
    pub pen_up_z: f64,
    /// Z value (servo angle) for a lowered pen.
    pub pen_down_z: f64,
    /// Feed rate for drawing moves, in mm/min.
    pub feed_rate: f64,
    /// Drawable paper width in millimetres.
    pub paper_width: f64,
    /// Drawable paper height in millimetres.
    pub paper_height: f64,
    /// Decimal places for coordinates.
    pub precision: usize,
}

impl GcodeConfig {
    /// Default pen-up servo angle.
    pub const DEFAULT_PEN_UP_Z: f64 = 80.0;
    /// Default pen-down servo angle.
    pub const DEFAULT_PEN_DOWN_Z: f64 = 10.0;
    /// Default drawing feed rate in mm/min.
    pub const DEFAULT_FEED_RATE: f64 = 3000.0;
    /// Default paper width in millimetres (A4 portrait).
    pub const DEFAULT_PAPER_WIDTH: f64 = 210.0;
    /// Default paper height in millimetres (A4 portrait).
    pub const DEFAULT_PAPER_HEIGHT: f64 = 297.0;
    /// Default coordinate precision.
    pub const DEFAULT_PRECISION: usize = 3;
}

impl Default for GcodeConfig {
    fn default() -> Self {
        Self {
            pen_up_z: Self::DEFAULT_PEN_UP_Z,
            pen_down_z: Self::DEFAULT_PEN_DOWN_Z,
            feed_rate: Self::DEFAULT_FEED_RATE,
            paper_width: Self::DEFAULT_PAPER_WIDTH,
            paper_height: Self::DEFAULT_PAPER_HEIGHT,
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

/// Streams moves as G-code.
#[derive(Debug)]
pub struct GcodeWriter<W, M> {
    out: W,
    mapper: M,
    config: GcodeConfig,
    pen: Option<Pen>,
    lines: usize,
}

impl<W: Write, M: CoordinateMapper> GcodeWriter<W, M> {
    /// Create a writer and emit the program header.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the header cannot be written.
    pub fn new(out: W, mapper: M, config: GcodeConfig) -> Result<Self, ExportError> {
        let mut writer = Self {
            out,
            mapper,
            config,
            pen: None,
            lines: 0,
        };
        writer.line("; floodplot")?;
        writer.line("G21 ; millimetres")?;
        writer.line("G90 ; absolute positioning")?;
        writer.set_pen(Pen::Up)?;
        Ok(writer)
    }

    /// Number of lines written so far.
    #[must_use]
    pub const fn lines_written(&self) -> usize {
        self.lines
    }

    /// Consume the writer, returning the underlying output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.lines += 1;
        Ok(())
    }

    /// Emit a pen command unless the pen is already in `pen` state.
    fn set_pen(&mut self, pen: Pen) -> io::Result<()> {
        if self.pen == Some(pen) {
            return Ok(());
        }
        let z = match pen {
            Pen::Up => self.config.pen_up_z,
            Pen::Down => self.config.pen_down_z,
        };
        self.line(&format!("G00 Z{z}"))?;
        self.pen = Some(pen);
        Ok(())
    }
}

impl<W: Write, M: CoordinateMapper> MoveSink for GcodeWriter<W, M> {
    type Error = ExportError;

    fn select_tool(&mut self, index: usize, color: Color) -> Result<(), ExportError> {
        log::debug!("tool change to T{index} ({})", color.to_hex());
        self.line(&format!("M06 T{index} ; color {}", color.to_hex()))?;
        // A tool change always leaves the pen up, whatever we last sent.
        self.pen = None;
        self.set_pen(Pen::Up)?;
        Ok(())
    }

    fn move_to(&mut self, mv: Move) -> Result<(), ExportError> {
        self.set_pen(mv.pen)?;
        let (x, y) = self.mapper.to_paper(mv.x, mv.y);
        let p = self.config.precision;
        let text = match mv.pen {
            Pen::Up => format!("G00 X{x:.p$} Y{y:.p$}"),
            Pen::Down => format!("G01 X{x:.p$} Y{y:.p$} F{}", self.config.feed_rate),
        };
        self.line(&text)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        self.set_pen(Pen::Up)?;
        self.line("; end")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use floodplot_pipeline::GridPoint;

    use super::*;
    use crate::mapper::PixelMapper;

    fn writer() -> GcodeWriter<Vec<u8>, PixelMapper> {
        GcodeWriter::new(Vec::new(), PixelMapper, GcodeConfig::default()).unwrap()
    }

    fn text(w: GcodeWriter<Vec<u8>, PixelMapper>) -> String {
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn header_lifts_pen() {
        let out = text(writer());
        assert_eq!(
            out,
            "; floodplot\nG21 ; millimetres\nG90 ; absolute positioning\nG00 Z80\n"
        );
    }

    #[test]
    fn pen_command_only_on_change() {
        let mut w = writer();
        w.move_to(Move::new(GridPoint::new(1, 2), Pen::Down)).unwrap();
        w.move_to(Move::new(GridPoint::new(3, 4), Pen::Down)).unwrap();
        w.move_to(Move::new(GridPoint::new(9, 9), Pen::Up)).unwrap();
        let out = text(w);
        let body: Vec<&str> = out.lines().skip(4).collect();
        assert_eq!(
            body,
            vec![
                "G00 Z10",
                "G01 X1.000 Y2.000 F3000",
                "G01 X3.000 Y4.000 F3000",
                "G00 Z80",
                "G00 X9.000 Y9.000",
            ]
        );
    }

    #[test]
    fn tool_change_relifts_pen() {
        let mut w = writer();
        w.select_tool(2, Color::GREEN).unwrap();
        let out = text(w);
        assert!(out.ends_with("M06 T2 ; color #00ff00\nG00 Z80\n"));
    }

    #[test]
    fn finish_lifts_and_marks_end() {
        let mut w = writer();
        w.move_to(Move::new(GridPoint::new(0, 0), Pen::Down)).unwrap();
        w.finish().unwrap();
        let out = text(w);
        assert!(out.ends_with("G00 Z80\n; end\n"));
    }

    #[test]
    fn precision_is_configurable() {
        let config = GcodeConfig {
            precision: 1,
            ..GcodeConfig::default()
        };
        let mut w = GcodeWriter::new(Vec::new(), PixelMapper, config).unwrap();
        w.move_to(Move::new(GridPoint::new(5, 6), Pen::Up)).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert!(out.ends_with("G00 X5.0 Y6.0\n"));
    }

    #[test]
    fn counts_lines() {
        let mut w = writer();
        assert_eq!(w.lines_written(), 4);
        w.move_to(Move::new(GridPoint::new(1, 1), Pen::Up)).unwrap();
        assert_eq!(w.lines_written(), 5);
    }

    #[test]
    fn config_serde_defaults_missing_fields() {
        let config: GcodeConfig = serde_json::from_str(r#"{"feed_rate": 1200.0}"#).unwrap();
        assert!((config.feed_rate - 1200.0).abs() < f64::EPSILON);
        assert!((config.pen_up_z - GcodeConfig::DEFAULT_PEN_UP_Z).abs() < f64::EPSILON);
    }
}
