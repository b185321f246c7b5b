//! Subcommands and their output.

use clap::{Parser, Subcommand, ValueEnum};
use dtfprep_core::units::{checked_cm_to_px, checked_px_to_cm};
use dtfprep_core::{DEFAULT_SNAP_TOLERANCE, Document, DocumentError, SnapLine, SpacingGuide, ruler_ticks};
use dtfprep_validate::{ValidateError, ValidationConfig, ValidationReport, validate_file};
use kurbo::{Line, Point};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use uuid::Uuid;

/// Command errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid DPI: {0}")]
    InvalidDpi(f64),
}

pub type CliResult<T> = Result<T, CliError>;

/// DTF print preparation tools.
#[derive(Parser, Debug)]
#[command(name = "dtfprep", version, about = "DTF print preparation tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check PNG, TIFF or PDF files against print constraints.
    Validate {
        /// Files to check.
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Validation config (JSON). Defaults to the per-user config, then built-in values.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Print reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Snap an object of a document to alignment guides and report equal spacing.
    Snap {
        /// Document JSON file.
        document: PathBuf,
        /// ID of the object being moved.
        #[arg(long)]
        object: Uuid,
        /// Proposed anchor x in pixels.
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        /// Proposed anchor y in pixels.
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
        /// Snap distance in pixels.
        #[arg(short, long, default_value_t = DEFAULT_SNAP_TOLERANCE)]
        tolerance: f64,
    },
    /// Print centimeter ruler ticks as JSON.
    Ruler {
        /// Document length in pixels.
        #[arg(long)]
        length: f64,
        #[arg(long)]
        dpi: f64,
        /// Zoom factor.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        /// Screen offset in pixels.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
    },
    /// Convert between centimeters and pixels.
    Convert {
        value: f64,
        #[arg(long)]
        dpi: f64,
        /// Target unit.
        #[arg(long, value_enum)]
        to: Unit,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    Cm,
    Px,
}

/// Run a command, writing to stdout.
pub fn run(cli: Cli) -> CliResult<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(cli, &mut out)
}

/// Run a command, writing to `out`.
pub fn run_with(cli: Cli, out: &mut dyn Write) -> CliResult<ExitCode> {
    match cli.command {
        Command::Validate { files, config, json } => validate(&files, config, json, out),
        Command::Snap {
            document,
            object,
            x,
            y,
            tolerance,
        } => snap(document, object, Point::new(x, y), tolerance, out),
        Command::Ruler {
            length,
            dpi,
            scale,
            offset,
        } => {
            let ticks = ruler_ticks(length, scale, dpi, offset);
            writeln!(out, "{}", serde_json::to_string_pretty(&ticks)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Convert { value, dpi, to } => {
            let converted = match to {
                Unit::Cm => checked_px_to_cm(value, dpi),
                Unit::Px => checked_cm_to_px(value, dpi),
            }
            .ok_or(CliError::InvalidDpi(dpi))?;
            writeln!(out, "{}", format_converted(converted, to))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn format_converted(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Cm => format!("{:.2} cm", value),
        Unit::Px => format!("{} px", value.round()),
    }
}

fn validate(files: &[PathBuf], config: Option<PathBuf>, json: bool, out: &mut dyn Write) -> CliResult<ExitCode> {
    let config = ValidationConfig::load_or_default(config.as_deref())?;
    let mut all_valid = true;

    for path in files {
        match validate_file(path, &config) {
            Ok(report) => {
                all_valid &= report.valid;
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&FileReport { path, report: &report })?)?;
                } else {
                    write_report(out, path, &report)?;
                }
            }
            Err(e) => {
                all_valid = false;
                log::error!("Failed to validate {}: {}", path.display(), e);
                writeln!(out, "{}: error: {}", path.display(), e)?;
            }
        }
    }

    Ok(if all_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a PathBuf,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

fn write_report(out: &mut dyn Write, path: &std::path::Path, report: &ValidationReport) -> io::Result<()> {
    let info = &report.info;
    writeln!(
        out,
        "{}: {} ({}x{} px, {:.0} DPI, {:.2} x {:.2} cm)",
        path.display(),
        if report.valid { "OK" } else { "INVALID" },
        info.width_px,
        info.height_px,
        info.dpi,
        info.width_cm(),
        info.height_cm()
    )?;
    for issue in &report.issues {
        writeln!(out, "  - {}", issue)?;
    }
    if let Some(content) = &report.content {
        writeln!(
            out,
            "  content: {:.2} x {:.2} cm, {:.1}% empty{}",
            content.width_cm,
            content.height_cm,
            content.empty_space_pct,
            if content.has_empty_space { " (trim recommended)" } else { "" }
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SnapReport<'a> {
    anchor: Point,
    snapped: bool,
    lines: &'a [SnapLine],
    segments: Vec<Line>,
    spacing: Vec<SpacingGuide>,
}

fn snap(document: PathBuf, object: Uuid, proposed: Point, tolerance: f64, out: &mut dyn Write) -> CliResult<ExitCode> {
    let json = std::fs::read_to_string(&document)?;
    let doc = Document::from_json(&json)?;
    let outcome = doc.snap_object(object, proposed, tolerance)?;
    let spacing = doc.spacing_guides(object, outcome.anchor, tolerance)?;

    let stage = doc.settings.size();
    let report = SnapReport {
        anchor: outcome.anchor,
        snapped: outcome.is_snapped(),
        lines: &outcome.lines,
        segments: outcome.lines.iter().map(|l| l.segment(stage)).collect(),
        spacing,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtfprep_core::{CanvasObject, DocumentSettings};
    use tempfile::tempdir;

    fn run_args(args: &[&str]) -> (CliResult<ExitCode>, String) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = run_with(cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_convert() {
        let (result, out) = run_args(&["dtfprep", "convert", "300", "--dpi", "300", "--to", "cm"]);
        assert!(result.is_ok());
        assert_eq!(out.trim(), "2.54 cm");

        let (_, out) = run_args(&["dtfprep", "convert", "21", "--dpi", "300", "--to", "px"]);
        assert_eq!(out.trim(), "2480 px");
    }

    #[test]
    fn test_convert_rejects_zero_dpi() {
        let (result, _) = run_args(&["dtfprep", "convert", "1", "--dpi", "0", "--to", "px"]);
        assert!(matches!(result, Err(CliError::InvalidDpi(_))));
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["dtfprep", "validate"]).is_err());
    }

    #[test]
    fn test_ruler_outputs_json() {
        let (result, out) = run_args(&["dtfprep", "ruler", "--length", "118", "--dpi", "300"]);
        assert!(result.is_ok());
        let ticks: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(ticks.as_array().unwrap().len(), 10);
    }

    #[test]
    fn test_snap_command() {
        let dir = tempdir().unwrap();
        let mut doc = Document::new(DocumentSettings {
            width: 400,
            height: 400,
            dpi: 300.0,
            background_color: "#ffffff".to_string(),
        });
        let id = doc.add_object(CanvasObject::new(Point::new(100.0, 100.0), 50.0, 50.0));
        let path = dir.path().join("doc.json");
        std::fs::write(&path, doc.to_json().unwrap()).unwrap();

        let id = id.to_string();
        let path = path.to_string_lossy().to_string();
        let (result, out) = run_args(&["dtfprep", "snap", &path, "--object", &id, "--x", "-3", "--y", "120"]);
        assert!(result.is_ok());

        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["snapped"], true);
        assert_eq!(report["anchor"]["x"], 0.0);
        assert_eq!(report["lines"][0]["axis"], "vertical");
        assert_eq!(report["lines"][0]["kind"], "start");
        assert_eq!(report["spacing"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_validate_reports_errors_per_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let missing = missing.to_string_lossy().to_string();
        let (result, out) = run_args(&["dtfprep", "validate", &missing]);
        assert_eq!(result.unwrap(), ExitCode::FAILURE);
        assert!(out.contains("error"));
    }
}
