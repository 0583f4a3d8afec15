//! floodplot: convert a raster color image into pen plotter G-code.
//!
//! Quantizes the image to the default black/red/green/blue palette, flood
//! fills every blob of each color, and writes the resulting moves as
//! G-code and/or an SVG preview. Per-color diagnostics go to stdout.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin floodplot -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use floodplot_export::{
    ExportError, GcodeConfig, GcodeWriter, PaperMapper, PlotRecorder, SvgMetadata, SvgOptions,
};
use floodplot_pipeline::{Clock, Color, Dimensions, Move, MoveSink, Palette, PlotConfig};
use serde::{Deserialize, Serialize};

/// Flood-fill an image into pen plotter moves.
///
/// Each palette color is drawn in turn with its own tool. Blobs are
/// filled cell by cell, lifting the pen only to jump between blobs.
#[derive(Parser)]
#[command(name = "floodplot", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Tool (pen tip) diameter in millimetres.
    #[arg(long, default_value_t = PlotConfig::DEFAULT_TOOL_DIAMETER)]
    tool_diameter: f64,

    /// Paper width in millimetres.
    #[arg(long, default_value_t = PlotConfig::DEFAULT_PAPER_WIDTH)]
    paper_width: f64,

    /// Paper height in millimetres.
    #[arg(long, default_value_t = GcodeConfig::DEFAULT_PAPER_HEIGHT)]
    paper_height: f64,

    /// Write G-code to file.
    #[arg(long)]
    gcode: Option<PathBuf>,

    /// Write an SVG preview to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Draw pen-up travel in the SVG preview.
    #[arg(long, requires = "svg")]
    show_travel: bool,

    /// Write the final visited mask as a grayscale PNG.
    #[arg(long)]
    mask_png: Option<PathBuf>,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full config as a JSON string: `{"plot": {...}, "gcode": {...}}`.
    ///
    /// When provided, the tool and paper flags are ignored. Missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Log filter in `env_logger` syntax (e.g. "debug",
    /// "`floodplot_pipeline=trace`"). Falls back to `RUST_LOG`, then "info".
    #[arg(long)]
    log_level: Option<String>,
}

/// Everything the CLI can configure, as accepted by `--config-json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    plot: PlotConfig,
    gcode: GcodeConfig,
}

/// Build a [`CliConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual tool and paper flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<CliConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(CliConfig {
        plot: PlotConfig {
            tool_diameter: cli.tool_diameter,
            paper_width: cli.paper_width,
        },
        gcode: GcodeConfig {
            paper_width: cli.paper_width,
            paper_height: cli.paper_height,
            ..GcodeConfig::default()
        },
    })
}

/// Initialize the global logger.
///
/// An explicit filter wins over `RUST_LOG`; with neither, logs at info.
fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::new();

    if let Some(filter) = filter {
        builder.parse_filters(filter);
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }

    builder.init();
    log::debug!("logging initialized");
}

/// The requested outputs, fed from a single conversion run.
struct Outputs {
    gcode: Option<GcodeWriter<BufWriter<File>, PaperMapper>>,
    preview: Option<PlotRecorder>,
}

impl MoveSink for Outputs {
    type Error = ExportError;

    fn select_tool(&mut self, index: usize, color: Color) -> Result<(), ExportError> {
        if let Some(gcode) = &mut self.gcode {
            gcode.select_tool(index, color)?;
        }
        if let Some(preview) = &mut self.preview {
            let Ok(()) = preview.select_tool(index, color);
        }
        Ok(())
    }

    fn move_to(&mut self, mv: Move) -> Result<(), ExportError> {
        if let Some(gcode) = &mut self.gcode {
            gcode.move_to(mv)?;
        }
        if let Some(preview) = &mut self.preview {
            let Ok(()) = preview.move_to(mv);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        if let Some(gcode) = &mut self.gcode {
            gcode.finish()?;
        }
        Ok(())
    }
}

/// Open the G-code file and write its header.
fn open_gcode(
    path: &Path,
    dimensions: Dimensions,
    config: &GcodeConfig,
) -> Result<GcodeWriter<BufWriter<File>, PaperMapper>, ExportError> {
    let file = BufWriter::new(File::create(path)?);
    let mapper = PaperMapper::fit(dimensions, config.paper_width, config.paper_height);
    log::debug!("paper scale {:.4} mm/px", mapper.scale());
    GcodeWriter::new(file, mapper, config.clone())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match floodplot_pipeline::decode::decode_rgb(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let dimensions = Dimensions::of(&image);

    log::info!(
        "{}: {}x{} ({} bytes)",
        cli.image_path.display(),
        dimensions.width,
        dimensions.height,
        image_bytes.len(),
    );
    log::debug!("config: {config:?}");

    let gcode = match cli.gcode.as_deref() {
        Some(path) => match open_gcode(path, dimensions, &config.gcode) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("Error writing G-code to {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    let mut outputs = Outputs {
        gcode,
        preview: cli.svg.as_ref().map(|_| PlotRecorder::new()),
    };

    let outcome = match floodplot_pipeline::convert_with_diagnostics(
        &image,
        &Palette::default(),
        &config.plot,
        &mut outputs,
        &StdClock,
    ) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Conversion error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let diagnostics = &outcome.diagnostics;

    if cli.json {
        match serde_json::to_string_pretty(diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    if let Some(ref path) = cli.gcode {
        eprintln!("G-code written to {}", path.display());
    }

    if let (Some(svg_path), Some(recorder)) = (&cli.svg, &outputs.preview) {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("floodplot");
        let desc = format!(
            "tool {}mm on {}mm paper, {}px cells",
            config.plot.tool_diameter, config.plot.paper_width, diagnostics.summary.diameter,
        );
        let config_json = serde_json::to_string(&config).ok();
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            config_json: config_json.as_deref(),
        };
        let options = SvgOptions {
            show_travel: cli.show_travel,
            stroke_width: f64::from(diagnostics.summary.diameter),
        };
        let svg = floodplot_export::to_svg(recorder, dimensions, &metadata, &options);
        match std::fs::write(svg_path, &svg) {
            Ok(()) => {
                eprintln!(
                    "SVG written to {} ({} bytes)",
                    svg_path.display(),
                    svg.len(),
                );
            }
            Err(e) => {
                eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(ref mask_path) = cli.mask_png {
        match outcome.mask.as_image().save(mask_path) {
            Ok(()) => eprintln!("Mask written to {}", mask_path.display()),
            Err(e) => {
                eprintln!("Error writing mask to {}: {e}", mask_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
