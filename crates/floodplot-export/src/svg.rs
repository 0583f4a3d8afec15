//! SVG preview of a plot.
//!
//! [`PlotRecorder`] is a [`MoveSink`] that gathers the move stream into
//! colored strokes (runs of pen-down moves) and pen-up travel segments.
//! [`to_svg`] then renders the recording with the [`svg`] crate: one
//! `<path>` per stroke in its palette color, plus optional dashed travel
//! lines so jump overhead is visible.
//!
//! Coordinates stay in image pixels; the `viewBox` matches the source
//! image so the preview overlays it exactly.

use std::convert::Infallible;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use floodplot_pipeline::{Color, Dimensions, GridPoint, Move, MoveSink, Pen};

/// Metadata to embed in the SVG document.
///
/// Text values are XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Emitted as `<title>`, typically the source file stem.
    pub title: Option<&'a str>,

    /// Emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized plot configuration, embedded in `<metadata>` so the
    /// preview records the settings it was produced with.
    pub config_json: Option<&'a str>,
}

/// Rendering options for [`to_svg`].
#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    /// Draw pen-up travel as dashed gray lines.
    pub show_travel: bool,
    /// Stroke width in pixels. Set it to the cell diameter for a
    /// filled-looking preview.
    pub stroke_width: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            show_travel: false,
            stroke_width: 1.0,
        }
    }
}

/// A connected pen-down run in one color.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Palette color of the tool that drew it.
    pub color: Color,
    /// Visited points, in drawing order. Never empty.
    pub points: Vec<GridPoint>,
}

/// Records a move stream for SVG rendering.
#[derive(Debug, Clone, Default)]
pub struct PlotRecorder {
    strokes: Vec<Stroke>,
    travel: Vec<(GridPoint, GridPoint)>,
    color: Color,
    last: Option<GridPoint>,
    drawing: bool,
}

impl PlotRecorder {
    /// Create an empty recorder. Strokes default to black until the
    /// first tool change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded strokes, in drawing order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Recorded pen-up travel segments, in order.
    #[must_use]
    pub fn travel(&self) -> &[(GridPoint, GridPoint)] {
        &self.travel
    }
}

impl MoveSink for PlotRecorder {
    type Error = Infallible;

    fn select_tool(&mut self, _index: usize, color: Color) -> Result<(), Infallible> {
        self.color = color;
        self.drawing = false;
        Ok(())
    }

    fn move_to(&mut self, mv: Move) -> Result<(), Infallible> {
        let point = mv.point();
        match mv.pen {
            Pen::Down if self.drawing => {
                if let Some(stroke) = self.strokes.last_mut() {
                    stroke.points.push(point);
                }
            }
            Pen::Down => {
                // Lowering the pen draws from wherever it was lifted.
                let mut points = Vec::with_capacity(2);
                if let Some(from) = self.last.filter(|&from| from != point) {
                    points.push(from);
                }
                points.push(point);
                self.strokes.push(Stroke {
                    color: self.color,
                    points,
                });
                self.drawing = true;
            }
            Pen::Up => {
                if let Some(from) = self.last.filter(|&from| from != point) {
                    self.travel.push((from, point));
                }
                self.drawing = false;
            }
        }
        self.last = Some(point);
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn xy(p: GridPoint) -> (f64, f64) {
    (p.x as f64, p.y as f64)
}

/// Build the `d` attribute for a run of points.
///
/// A single point becomes a zero-length segment so round line caps still
/// render it as a dot.
fn build_path_data(points: &[GridPoint]) -> String {
    let Some((&first, rest)) = points.split_first() else {
        return String::new();
    };
    let mut data = Data::new().move_to(xy(first));
    if rest.is_empty() {
        data = data.line_to(xy(first));
    }
    for &p in rest {
        data = data.line_to(xy(p));
    }
    String::from(Value::from(data))
}

/// Render a recorded plot as an SVG document string.
#[must_use]
pub fn to_svg(
    recorder: &PlotRecorder,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
    options: &SvgOptions,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut metadata_el = Element::new("metadata");
        metadata_el.assign("id", "floodplot-config");
        metadata_el.append(Text::new(config_json));
        doc = doc.add(metadata_el);
    }

    for stroke in &recorder.strokes {
        let path = Path::new()
            .set("d", build_path_data(&stroke.points))
            .set("fill", "none")
            .set("stroke", stroke.color.to_hex())
            .set("stroke-width", options.stroke_width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round");
        doc = doc.add(path);
    }

    if options.show_travel && !recorder.travel.is_empty() {
        let mut group = Group::new()
            .set("id", "travel")
            .set("fill", "none")
            .set("stroke", "#999999")
            .set("stroke-width", 1)
            .set("stroke-dasharray", "4,4");
        for &(from, to) in &recorder.travel {
            group = group.add(Path::new().set("d", build_path_data(&[from, to])));
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn down(x: i64, y: i64) -> Move {
        Move::new(GridPoint::new(x, y), Pen::Down)
    }

    fn up(x: i64, y: i64) -> Move {
        Move::new(GridPoint::new(x, y), Pen::Up)
    }

    fn record(moves: &[Move]) -> PlotRecorder {
        let mut rec = PlotRecorder::new();
        rec.select_tool(1, Color::RED).unwrap();
        for &mv in moves {
            rec.move_to(mv).unwrap();
        }
        rec
    }

    const DIMS: Dimensions = Dimensions {
        width: 20,
        height: 10,
    };

    #[test]
    fn continuous_moves_form_one_stroke() {
        let rec = record(&[down(0, 0), down(4, 0), down(8, 0)]);
        assert_eq!(rec.strokes().len(), 1);
        assert_eq!(rec.strokes()[0].points.len(), 3);
        assert_eq!(rec.strokes()[0].color, Color::RED);
        assert!(rec.travel().is_empty());
    }

    #[test]
    fn jump_splits_strokes_and_records_travel() {
        let rec = record(&[down(0, 0), up(0, 0), up(12, 4), down(12, 4), down(16, 4)]);
        assert_eq!(rec.strokes().len(), 2);
        assert_eq!(
            rec.strokes()[1].points,
            vec![GridPoint::new(12, 4), GridPoint::new(16, 4)]
        );
        assert_eq!(
            rec.travel(),
            &[(GridPoint::new(0, 0), GridPoint::new(12, 4))]
        );
    }

    #[test]
    fn tool_change_starts_new_stroke_from_last_point() {
        let mut rec = record(&[down(0, 0), down(4, 0)]);
        rec.select_tool(3, Color::BLUE).unwrap();
        rec.move_to(down(4, 4)).unwrap();
        assert_eq!(rec.strokes().len(), 2);
        let blue = &rec.strokes()[1];
        assert_eq!(blue.color, Color::BLUE);
        assert_eq!(
            blue.points,
            vec![GridPoint::new(4, 0), GridPoint::new(4, 4)]
        );
    }

    #[test]
    fn svg_has_one_path_per_stroke_in_color() {
        let rec = record(&[down(0, 0), up(0, 0), up(12, 4), down(12, 4)]);
        let svg = to_svg(&rec, DIMS, &SvgMetadata::default(), &SvgOptions::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"0 0 20 10\""));
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("stroke=\"#ff0000\"").count(), 2);
        assert!(!svg.contains("id=\"travel\""));
    }

    #[test]
    fn single_point_stroke_renders_as_dot() {
        assert_eq!(build_path_data(&[GridPoint::new(3, 5)]), "M3,5 L3,5");
    }

    #[test]
    fn travel_group_when_requested() {
        let rec = record(&[down(0, 0), up(0, 0), up(12, 4), down(12, 4)]);
        let options = SvgOptions {
            show_travel: true,
            ..SvgOptions::default()
        };
        let svg = to_svg(&rec, DIMS, &SvgMetadata::default(), &options);
        assert!(svg.contains("id=\"travel\""));
        assert!(svg.contains("stroke-dasharray=\"4,4\""));
        assert_eq!(svg.matches("<path").count(), 3);
    }

    #[test]
    fn metadata_is_embedded_and_escaped() {
        let rec = PlotRecorder::new();
        let metadata = SvgMetadata {
            title: Some("cats & dogs"),
            description: Some("tool 4mm"),
            config_json: Some(r#"{"tool_diameter":4.0}"#),
        };
        let svg = to_svg(&rec, DIMS, &metadata, &SvgOptions::default());
        assert!(svg.contains("<title>cats &amp; dogs</title>"));
        assert!(svg.contains("<desc>tool 4mm</desc>"));
        assert!(svg.contains("<metadata id=\"floodplot-config\">"));
        assert!(svg.contains("tool_diameter"));
        assert!(!svg.contains("xmlns:floodplot"));
    }
}
