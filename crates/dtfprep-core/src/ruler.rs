//! Centimeter ruler tick layout.

use crate::units::{is_valid_dpi, px_per_cm};
use serde::{Deserialize, Serialize};

/// Ruler thickness in screen pixels.
pub const RULER_THICKNESS: f64 = 20.0;

/// Longest ruler laid out, in centimeters. Longer rulers are cut off here.
pub const MAX_RULER_CM: u32 = 10_000;

/// Kind of ruler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    /// Whole centimeter.
    Major,
    /// Half centimeter.
    Half,
    /// Millimeter.
    Minor,
}

impl TickKind {
    /// Tick length in screen pixels, measured from the ruler's inner edge.
    pub fn length(self) -> f64 {
        match self {
            TickKind::Major => RULER_THICKNESS,
            TickKind::Half => 8.0,
            TickKind::Minor => 4.0,
        }
    }
}

/// A single tick mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RulerTick {
    /// Position along the ruler in screen pixels.
    pub position: f64,
    pub kind: TickKind,
    /// Centimeter label (major ticks after the origin).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<u32>,
}

/// Compute ticks for a ruler covering `length_px` document pixels (at 100% zoom),
/// drawn at `scale` and shifted by `offset` screen pixels.
///
/// Returns an empty list if `dpi` or `scale` is not positive or `length_px` is not finite.
/// Rulers are cut off at [`MAX_RULER_CM`].
pub fn ruler_ticks(length_px: f64, scale: f64, dpi: f64, offset: f64) -> Vec<RulerTick> {
    if !is_valid_dpi(dpi) || !(scale.is_finite() && scale > 0.0) || !length_px.is_finite() || length_px < 0.0 {
        return Vec::new();
    }

    let cm_step = px_per_cm(dpi) * scale;
    let mm_step = cm_step / 10.0;
    let length_cm = (length_px / px_per_cm(dpi)).floor();
    if length_cm > MAX_RULER_CM as f64 {
        log::warn!("Ruler of {} cm truncated to {} cm", length_cm, MAX_RULER_CM);
    }
    let total_cm = length_cm.min(MAX_RULER_CM as f64) as u32;

    let mut ticks = Vec::with_capacity((total_cm as usize + 1) * 10);
    for cm in 0..=total_cm {
        let base = cm as f64 * cm_step + offset;
        ticks.push(RulerTick {
            position: base,
            kind: TickKind::Major,
            label: (cm > 0).then_some(cm),
        });
        for mm in 1..10u32 {
            let kind = if mm == 5 { TickKind::Half } else { TickKind::Minor };
            ticks.push(RulerTick {
                position: base + mm as f64 * mm_step,
                kind,
                label: None,
            });
        }
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruler_ticks_layout() {
        // 2.54 cm per inch, 254 dpi => 100 px per cm
        let ticks = ruler_ticks(250.0, 1.0, 254.0, 0.0);
        assert_eq!(ticks.len(), 30);

        let majors: Vec<_> = ticks.iter().filter(|t| t.kind == TickKind::Major).collect();
        assert_eq!(majors.len(), 3);
        assert!((majors[1].position - 100.0).abs() < 1e-9);
        assert_eq!(majors[0].label, None);
        assert_eq!(majors[2].label, Some(2));

        let halves: Vec<_> = ticks.iter().filter(|t| t.kind == TickKind::Half).collect();
        assert!((halves[0].position - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ruler_ticks_sorted_with_scale_and_offset() {
        let ticks = ruler_ticks(300.0, 2.0, 254.0, 15.0);
        assert!((ticks[0].position - 15.0).abs() < 1e-9);
        assert!((ticks[10].position - 215.0).abs() < 1e-9);
        assert!(ticks.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn test_ruler_ticks_huge_length_is_capped() {
        let ticks = ruler_ticks(1.0e13, 1.0, 1.0, 0.0);
        assert_eq!(ticks.len(), (MAX_RULER_CM as usize + 1) * 10);
        assert_eq!(ticks.last().and_then(|t| t.label), None);
        let last_major = ticks.iter().rev().find(|t| t.kind == TickKind::Major).unwrap();
        assert_eq!(last_major.label, Some(MAX_RULER_CM));
    }

    #[test]
    fn test_ruler_ticks_invalid_input() {
        assert!(ruler_ticks(100.0, 1.0, 0.0, 0.0).is_empty());
        assert!(ruler_ticks(100.0, 0.0, 300.0, 0.0).is_empty());
        assert!(ruler_ticks(f64::INFINITY, 1.0, 300.0, 0.0).is_empty());
    }

    #[test]
    fn test_tick_lengths() {
        assert_eq!(TickKind::Major.length(), 20.0);
        assert!(TickKind::Half.length() > TickKind::Minor.length());
    }
}
