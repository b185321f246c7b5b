//! Conversions between pixels and physical print measurements.

/// Centimeters per inch.
pub const CM_PER_INCH: f64 = 2.54;

/// Meters per inch (for pixels-per-meter density fields).
pub const METERS_PER_INCH: f64 = 0.0254;

/// Resolution assumed when a file carries no density information.
pub const DEFAULT_DPI: f64 = 72.0;

/// Convert pixels to centimeters at `dpi`.
pub fn px_to_cm(px: f64, dpi: f64) -> f64 {
    px / dpi * CM_PER_INCH
}

/// Convert centimeters to pixels at `dpi`.
pub fn cm_to_px(cm: f64, dpi: f64) -> f64 {
    cm / CM_PER_INCH * dpi
}

/// Convert centimeters to whole pixels at `dpi`.
pub fn cm_to_px_rounded(cm: f64, dpi: f64) -> u32 {
    cm_to_px(cm, dpi).round().max(0.0) as u32
}

/// [`px_to_cm`], rejecting a non-positive or non-finite `dpi`.
pub fn checked_px_to_cm(px: f64, dpi: f64) -> Option<f64> {
    is_valid_dpi(dpi).then(|| px_to_cm(px, dpi))
}

/// [`cm_to_px`], rejecting a non-positive or non-finite `dpi`.
pub fn checked_cm_to_px(cm: f64, dpi: f64) -> Option<f64> {
    is_valid_dpi(dpi).then(|| cm_to_px(cm, dpi))
}

/// Convert a pixels-per-meter density to dots per inch.
pub fn ppm_to_dpi(pixels_per_meter: f64) -> f64 {
    pixels_per_meter * METERS_PER_INCH
}

/// Pixels per centimeter at `dpi`.
pub fn px_per_cm(dpi: f64) -> f64 {
    dpi / CM_PER_INCH
}

/// Check that `dpi` can be used as a divisor.
pub fn is_valid_dpi(dpi: f64) -> bool {
    dpi.is_finite() && dpi > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_to_cm() {
        assert!((px_to_cm(300.0, 300.0) - 2.54).abs() < 1e-12);
        assert!((px_to_cm(2480.0, 300.0) - 20.997).abs() < 0.001);
    }

    #[test]
    fn test_cm_to_px_rounded_matches_a4() {
        assert_eq!(cm_to_px_rounded(21.0, 300.0), 2480);
        assert_eq!(cm_to_px_rounded(29.7, 300.0), 3508);
    }

    #[test]
    fn test_round_trip() {
        let px = cm_to_px(58.0, 300.0);
        assert!((px_to_cm(px, 300.0) - 58.0).abs() < 1e-9);
    }

    #[test]
    fn test_checked_rejects_bad_dpi() {
        assert_eq!(checked_px_to_cm(100.0, 0.0), None);
        assert_eq!(checked_cm_to_px(1.0, -72.0), None);
        assert_eq!(checked_cm_to_px(1.0, f64::NAN), None);
        assert!(checked_cm_to_px(2.54, 72.0).is_some());
    }

    #[test]
    fn test_ppm_to_dpi() {
        // 11811 px/m is the usual encoding of 300 DPI
        assert!((ppm_to_dpi(11811.0) - 300.0).abs() < 0.01);
    }
}
