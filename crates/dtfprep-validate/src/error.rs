//! Validation errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading files or configuration.
///
/// Print-constraint violations are not errors; see [`crate::ValidationIssue`].
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG decode error: {0}")]
    Png(#[from] png::DecodingError),
    #[error("TIFF decode error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Unsupported file format: {0} (use PNG, TIFF or PDF)")]
    UnsupportedFormat(PathBuf),
    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for validation operations.
pub type ValidateResult<T> = Result<T, ValidateError>;
