//! Bounding box of the non-transparent content of an image.

use crate::raster::AlphaMask;
use dtfprep_core::units::px_to_cm;
use serde::Serialize;

/// Pixel box around every pixel with non-zero alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentBounds {
    pub x: u32,
    pub y: u32,
    pub width_px: u32,
    pub height_px: u32,
    /// Share of the image outside the content box, rounded to one decimal.
    pub empty_space_pct: f64,
    /// Unrounded share, used for the threshold check.
    #[serde(skip)]
    pub(crate) raw_empty_space_pct: f64,
}

impl ContentBounds {
    pub fn width_cm(&self, dpi: f64) -> f64 {
        px_to_cm(self.width_px as f64, dpi)
    }

    pub fn height_cm(&self, dpi: f64) -> f64 {
        px_to_cm(self.height_px as f64, dpi)
    }

    /// Whether the unrounded empty share exceeds `threshold_pct`.
    pub fn has_empty_space(&self, threshold_pct: f64) -> bool {
        self.raw_empty_space_pct > threshold_pct
    }
}

/// Find the content box. Returns `None` for a fully transparent image.
pub fn content_bounds(mask: &AlphaMask) -> Option<ContentBounds> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (y, row) in mask.rows().enumerate() {
        let Some(first) = row.iter().position(|&a| a > 0) else {
            continue;
        };
        // position() found a match, so rposition() will too
        let last = row.iter().rposition(|&a| a > 0).unwrap_or(first);
        let y = y as u32;
        found = true;
        min_x = min_x.min(first as u32);
        max_x = max_x.max(last as u32);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if !found {
        return None;
    }

    let width_px = max_x - min_x + 1;
    let height_px = max_y - min_y + 1;
    let total = mask.width() as f64 * mask.height() as f64;
    let content = width_px as f64 * height_px as f64;
    let raw_empty_space_pct = (total - content) / total * 100.0;

    Some(ContentBounds {
        x: min_x,
        y: min_y,
        width_px,
        height_px,
        empty_space_pct: (raw_empty_space_pct * 10.0).round() / 10.0,
        raw_empty_space_pct,
    })
}
