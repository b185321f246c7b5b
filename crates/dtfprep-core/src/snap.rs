//! Alignment guides for snapping a moving object to the stage and to other objects.
//!
//! Every call works on a full snapshot of the canvas and returns a fresh result:
//! stops are collected from the stage and the other objects, edges are extracted
//! from the moving object, and the closest stop/edge pair per axis becomes a guide.

use kurbo::{Affine, Line, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Distance threshold for guide snapping (in canvas pixels at 100% zoom).
pub const DEFAULT_SNAP_TOLERANCE: f64 = 10.0;

/// Slack around the artboard before an object stops contributing guide stops.
pub const ARTBOARD_MARGIN: f64 = 1.0;

/// Axis a guide lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// X coordinates, drawn as vertical lines.
    Vertical,
    /// Y coordinates, drawn as horizontal lines.
    Horizontal,
}

impl Axis {
    /// Both axes, in output order.
    pub const ALL: [Axis; 2] = [Axis::Vertical, Axis::Horizontal];

    /// Pick the component of a point along this axis.
    pub fn of(self, point: Point) -> f64 {
        match self {
            Axis::Vertical => point.x,
            Axis::Horizontal => point.y,
        }
    }

    /// The other axis.
    pub fn cross(self) -> Axis {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
        }
    }

    /// Point with `along` on this axis and `across` on the other.
    fn point(self, along: f64, across: f64) -> Point {
        match self {
            Axis::Vertical => Point::new(along, across),
            Axis::Horizontal => Point::new(across, along),
        }
    }
}

/// Which edge of a box an alignment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Start,
    Center,
    End,
}

impl SnapKind {
    /// All edge kinds, in extraction order.
    pub const ALL: [SnapKind; 3] = [SnapKind::Start, SnapKind::Center, SnapKind::End];

    fn fraction(self) -> f64 {
        match self {
            SnapKind::Start => 0.0,
            SnapKind::Center => 0.5,
            SnapKind::End => 1.0,
        }
    }
}

/// An axis-aligned bounding box in canvas pixels.
///
/// `rotation` (degrees) is informational only; distances are always measured
/// on the unrotated box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl Rectangle {
    /// Create an unrotated box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Bounding box of a `width` x `height` rectangle placed at `(x, y)` and
    /// rotated by `rotation` degrees about that point.
    pub fn from_rotated(x: f64, y: f64, width: f64, height: f64, rotation: f64) -> Self {
        if rotation.abs() < 0.001 {
            // Normalize flipped (negative) sizes
            return Self::from(Rect::new(x, y, x + width, y + height).abs());
        }

        let origin = Point::new(x, y);
        let rot = Affine::rotate_about(rotation.to_radians(), origin);
        let corners = [
            origin,
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ]
        .map(|p| rot * p);

        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
            rotation,
        }
    }

    /// Convert to a kurbo `Rect`.
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Start coordinate along `axis`.
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.x,
            Axis::Horizontal => self.y,
        }
    }

    /// Size along `axis`.
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.width,
            Axis::Horizontal => self.height,
        }
    }

    /// Coordinate of the `kind` edge along `axis`.
    pub fn edge(&self, axis: Axis, kind: SnapKind) -> f64 {
        self.start(axis) + self.extent(axis) * kind.fraction()
    }

    /// Whether the box lies inside `bounds`, allowing `margin` pixels of slack.
    pub fn is_within(&self, bounds: Rect, margin: f64) -> bool {
        let rect = self.to_rect();
        rect.x0 >= bounds.x0 - margin
            && rect.y0 >= bounds.y0 - margin
            && rect.x1 <= bounds.x1 + margin
            && rect.y1 <= bounds.y1 + margin
    }
}

impl From<Rect> for Rectangle {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

/// Candidate guide coordinates per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideStops {
    pub vertical: Vec<f64>,
    pub horizontal: Vec<f64>,
}

impl GuideStops {
    /// Stops along `axis`.
    pub fn axis(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }

    /// Append the start, center and end of `rect` on both axes.
    pub fn push_rect(&mut self, rect: &Rectangle) {
        for kind in SnapKind::ALL {
            self.vertical.push(rect.edge(Axis::Vertical, kind));
            self.horizontal.push(rect.edge(Axis::Horizontal, kind));
        }
    }

    fn seeded(artboard: Rect) -> Self {
        let mut stops = Self::default();
        stops.push_rect(&Rectangle::from(artboard));
        stops
    }
}

/// Collect guide stops from the stage and every other object.
///
/// The stage contributes `0`, half and full extent on each axis, followed by
/// the start, center and end of each rectangle in input order. The caller
/// excludes the moving object.
pub fn collect_stops(stage: Size, others: &[Rectangle]) -> GuideStops {
    let mut stops = GuideStops::seeded(Rect::from_origin_size(Point::ZERO, stage));
    for rect in others {
        stops.push_rect(rect);
    }
    stops
}

/// Collect guide stops from an artboard that may sit away from the origin.
///
/// Objects lying outside the artboard (beyond [`ARTBOARD_MARGIN`]) do not
/// contribute stops.
pub fn collect_stops_in_artboard(artboard: Rect, others: &[Rectangle]) -> GuideStops {
    let mut stops = GuideStops::seeded(artboard);
    let mut skipped = 0usize;
    for rect in others {
        if rect.is_within(artboard, ARTBOARD_MARGIN) {
            stops.push_rect(rect);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::trace!("Skipped {} objects outside the artboard", skipped);
    }
    stops
}

/// A candidate edge of the moving object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapEdge {
    /// Edge position in canvas space, rounded to a whole pixel.
    pub guide_coordinate: f64,
    /// Anchor minus edge, rounded. Adding it to a guide coordinate gives the anchor.
    pub offset: f64,
    pub kind: SnapKind,
}

/// Start, center and end edges of the moving object on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapEdges {
    pub vertical: [SnapEdge; 3],
    pub horizontal: [SnapEdge; 3],
}

impl SnapEdges {
    /// Edges along `axis`.
    pub fn axis(&self, axis: Axis) -> &[SnapEdge; 3] {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }
}

/// Extract the snap edges of the moving object.
///
/// `anchor` is the object's position property, which need not coincide with
/// the bounding box origin. Rounding is half away from zero.
pub fn extract_edges(moving: &Rectangle, anchor: Point) -> SnapEdges {
    let edges_for = |axis: Axis| {
        let anchor = axis.of(anchor);
        SnapKind::ALL.map(|kind| {
            let guide_coordinate = moving.edge(axis, kind).round();
            SnapEdge {
                guide_coordinate,
                offset: (anchor - guide_coordinate).round(),
                kind,
            }
        })
    };

    SnapEdges {
        vertical: edges_for(Axis::Vertical),
        horizontal: edges_for(Axis::Horizontal),
    }
}

/// A stop/edge pair within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapMatch {
    pub axis: Axis,
    /// The matched guide stop.
    pub coordinate: f64,
    pub offset: f64,
    pub kind: SnapKind,
    /// `|stop - edge|`.
    pub distance: f64,
}

/// An active guide: the best match on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapLine {
    pub axis: Axis,
    /// Guide position (the stop the edge is pulled onto).
    pub coordinate: f64,
    pub offset: f64,
    pub kind: SnapKind,
}

impl SnapLine {
    /// Anchor value along this line's axis once snapped.
    pub fn anchor(&self) -> f64 {
        self.coordinate + self.offset
    }

    /// Drawable segment spanning the stage on the perpendicular axis.
    pub fn segment(&self, stage: Size) -> Line {
        match self.axis {
            Axis::Vertical => Line::new((self.coordinate, 0.0), (self.coordinate, stage.height)),
            Axis::Horizontal => Line::new((0.0, self.coordinate), (stage.width, self.coordinate)),
        }
    }
}

impl From<SnapMatch> for SnapLine {
    fn from(m: SnapMatch) -> Self {
        Self {
            axis: m.axis,
            coordinate: m.coordinate,
            offset: m.offset,
            kind: m.kind,
        }
    }
}

/// All stop/edge pairs on `axis` closer than `tolerance`, in iteration order
/// (stops outer, edges inner).
pub fn snap_matches(axis: Axis, stops: &GuideStops, edges: &SnapEdges, tolerance: f64) -> Vec<SnapMatch> {
    let mut matches = Vec::new();
    for &stop in stops.axis(axis) {
        for edge in edges.axis(axis) {
            let distance = (stop - edge.guide_coordinate).abs();
            if distance < tolerance {
                matches.push(SnapMatch {
                    axis,
                    coordinate: stop,
                    offset: edge.offset,
                    kind: edge.kind,
                    distance,
                });
            }
        }
    }
    matches
}

/// Closest match on `axis`. Equal distances keep the first one encountered.
fn best_match(axis: Axis, stops: &GuideStops, edges: &SnapEdges, tolerance: f64) -> Option<SnapMatch> {
    let mut best: Option<SnapMatch> = None;
    for candidate in snap_matches(axis, stops, edges, tolerance) {
        match best {
            Some(current) if candidate.distance >= current.distance => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Pick at most one guide per axis, vertical first.
pub fn select_guides(stops: &GuideStops, edges: &SnapEdges, tolerance: f64) -> Vec<SnapLine> {
    Axis::ALL
        .into_iter()
        .filter_map(|axis| best_match(axis, stops, edges, tolerance))
        .map(SnapLine::from)
        .collect()
}

/// Move `anchor` onto the given guides. Axes without a guide are unchanged.
pub fn apply_snap(anchor: Point, lines: &[SnapLine]) -> Point {
    let mut snapped = anchor;
    for line in lines {
        match line.axis {
            Axis::Vertical => snapped.x = line.anchor(),
            Axis::Horizontal => snapped.y = line.anchor(),
        }
    }
    snapped
}

/// Result of snapping a moving object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapOutcome {
    /// Anchor after snapping.
    pub anchor: Point,
    /// Active guides (0, 1 or 2).
    pub lines: Vec<SnapLine>,
}

impl SnapOutcome {
    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Guide on `axis`, if any.
    pub fn line(&self, axis: Axis) -> Option<&SnapLine> {
        self.lines.iter().find(|l| l.axis == axis)
    }
}

/// Run edge extraction and guide selection for one frame.
pub fn snap_to_guides(stops: &GuideStops, moving: &Rectangle, anchor: Point, tolerance: f64) -> SnapOutcome {
    let edges = extract_edges(moving, anchor);
    let lines = select_guides(stops, &edges, tolerance);
    let snapped = apply_snap(anchor, &lines);
    log::trace!("Snapped {:?} -> {:?} with {} guides", anchor, snapped, lines.len());
    SnapOutcome {
        anchor: snapped,
        lines,
    }
}

/// Gaps must be wider than this to count as spacing.
pub const MIN_SPACING_GAP: f64 = 5.0;

/// One of the two equal gaps around the moving object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingGuide {
    /// Axis the gap is measured along: `Vertical` for boxes side by side
    /// (x gaps), `Horizontal` for stacked boxes (y gaps).
    pub axis: Axis,
    /// Gap size in pixels.
    pub distance: f64,
    /// Gap segment between the facing edges, through each box's center.
    pub segment: Line,
}

/// Detect equal spacing around the moving object.
///
/// On each axis the boxes are ordered by start. When the moving box sits
/// directly between two others, both gaps are wider than [`MIN_SPACING_GAP`]
/// and they differ by less than `tolerance`, both gaps are returned. Needs at
/// least two other boxes. X gaps come before y gaps.
pub fn spacing_guides(moving: &Rectangle, others: &[Rectangle], tolerance: f64) -> Vec<SpacingGuide> {
    if others.len() < 2 {
        return Vec::new();
    }
    Axis::ALL
        .into_iter()
        .flat_map(|axis| spacing_on_axis(axis, moving, others, tolerance))
        .collect()
}

fn spacing_on_axis(axis: Axis, moving: &Rectangle, others: &[Rectangle], tolerance: f64) -> Vec<SpacingGuide> {
    // Stable sort with the moving box last, so it follows others with the same start
    let mut boxes: Vec<(bool, &Rectangle)> = others.iter().map(|r| (false, r)).collect();
    boxes.push((true, moving));
    boxes.sort_by(|a, b| a.1.start(axis).total_cmp(&b.1.start(axis)));

    let Some(i) = boxes.iter().position(|&(is_moving, _)| is_moving) else {
        return Vec::new();
    };
    if i == 0 || i + 1 == boxes.len() {
        return Vec::new();
    }
    let (before, after) = (boxes[i - 1].1, boxes[i + 1].1);

    let gap_before = moving.start(axis) - before.edge(axis, SnapKind::End);
    let gap_after = after.start(axis) - moving.edge(axis, SnapKind::End);
    let equal = gap_before > MIN_SPACING_GAP
        && gap_after > MIN_SPACING_GAP
        && (gap_before - gap_after).abs() < tolerance;
    if !equal {
        return Vec::new();
    }

    let cross = axis.cross();
    let at = |along: f64, rect: &Rectangle| axis.point(along, rect.edge(cross, SnapKind::Center));
    vec![
        SpacingGuide {
            axis,
            distance: gap_before,
            segment: Line::new(at(before.edge(axis, SnapKind::End), before), at(moving.start(axis), moving)),
        },
        SpacingGuide {
            axis,
            distance: gap_after,
            segment: Line::new(at(moving.edge(axis, SnapKind::End), moving), at(after.start(axis), after)),
        },
    ]
}
