//! dtfprep Validation
//!
//! Checks PNG, TIFF and PDF files against print constraints: resolution range,
//! physical width and height, and how much of the image is empty space.

mod config;
mod content;
mod error;
mod pdf;
mod raster;
mod report;

pub use config::ValidationConfig;
pub use content::{ContentBounds, content_bounds};
pub use error::{ValidateError, ValidateResult};
pub use pdf::{PDF_ASSUMED_DPI, PDF_POINTS_PER_INCH, pdf_info};
pub use raster::{AlphaMask, RasterFormat, RasterInfo, read_alpha, read_info, resolution_to_dpi};
pub use report::{ContentSummary, ValidationIssue, ValidationReport, validate_file, validate_info};
