//! Checking raster files against print constraints.

use crate::config::ValidationConfig;
use crate::content::{ContentBounds, content_bounds};
use crate::error::ValidateResult;
use crate::raster::{RasterFormat, RasterInfo, read_alpha, read_info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A print constraint the file does not meet.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("DPI out of range. Actual: {actual:.0}, required: {min}-{max}")]
    DpiOutOfRange { actual: f64, min: f64, max: f64 },
    #[error("Width above the maximum. Actual: {actual_cm:.2}cm, maximum: {max_cm:.2}cm")]
    WidthAboveMaximum { actual_cm: f64, max_cm: f64 },
    #[error(
        "Width below the minimum. Actual: {actual_cm:.2}cm, minimum: {min_cm:.2}cm \
         (maximum: {max_cm:.2}cm, tolerance: {tolerance_cm:.1}cm)"
    )]
    WidthBelowMinimum {
        actual_cm: f64,
        min_cm: f64,
        max_cm: f64,
        tolerance_cm: f64,
    },
    #[error("Height below the minimum. Actual: {actual_cm:.2}cm, minimum: {min_cm}cm")]
    HeightBelowMinimum { actual_cm: f64, min_cm: f64 },
}

/// Physical size of the visible content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub width_cm: f64,
    pub height_cm: f64,
    pub has_empty_space: bool,
    pub empty_space_pct: f64,
}

impl ContentSummary {
    pub fn new(bounds: &ContentBounds, dpi: f64, threshold_pct: f64) -> Self {
        Self {
            width_cm: bounds.width_cm(dpi),
            height_cm: bounds.height_cm(dpi),
            has_empty_space: bounds.has_empty_space(threshold_pct),
            empty_space_pct: bounds.empty_space_pct,
        }
    }
}

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub info: RasterInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentSummary>,
}

/// Check measured file properties against `config`.
pub fn validate_info(info: &RasterInfo, content: Option<&ContentBounds>, config: &ValidationConfig) -> ValidationReport {
    let mut issues = Vec::new();

    if info.dpi < config.min_dpi || info.dpi > config.max_dpi {
        issues.push(ValidationIssue::DpiOutOfRange {
            actual: info.dpi,
            min: config.min_dpi,
            max: config.max_dpi,
        });
    }

    // The configured width is a ceiling; the tolerance only extends downwards.
    let width_cm = info.width_cm();
    if width_cm > config.width_cm {
        issues.push(ValidationIssue::WidthAboveMaximum {
            actual_cm: width_cm,
            max_cm: config.width_cm,
        });
    } else if width_cm < config.min_width_cm() {
        issues.push(ValidationIssue::WidthBelowMinimum {
            actual_cm: width_cm,
            min_cm: config.min_width_cm(),
            max_cm: config.width_cm,
            tolerance_cm: config.width_tolerance_cm,
        });
    }

    let height_cm = info.height_cm();
    if height_cm < config.min_height_cm {
        issues.push(ValidationIssue::HeightBelowMinimum {
            actual_cm: height_cm,
            min_cm: config.min_height_cm,
        });
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        info: *info,
        content: content.map(|b| ContentSummary::new(b, info.dpi, config.empty_space_threshold_pct)),
    }
}

/// Read a PNG, TIFF or PDF file and validate it.
///
/// Content bounds are best-effort: if pixel data cannot be decoded the report
/// is produced without them. PDFs never have content bounds.
pub fn validate_file(path: &Path, config: &ValidationConfig) -> ValidateResult<ValidationReport> {
    let info = read_info(path)?;
    if !info.dpi_from_file {
        log::debug!("{} has no density information, assuming {} DPI", path.display(), info.dpi);
    }

    let content = if info.format == RasterFormat::Pdf {
        None
    } else {
        match read_alpha(path) {
            Ok(mask) => content_bounds(&mask),
            Err(e) => {
                log::warn!("Could not detect content bounds of {}: {}", path.display(), e);
                None
            }
        }
    };

    let report = validate_info(&info, content.as_ref(), config);
    log::info!(
        "Validated {}: {} ({} issues)",
        path.display(),
        if report.valid { "ok" } else { "invalid" },
        report.issues.len()
    );
    Ok(report)
}
