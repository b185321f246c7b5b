//! Print document: artboard settings and the objects placed on it.

use crate::snap::{
    DEFAULT_SNAP_TOLERANCE, GuideStops, Rectangle, SnapOutcome, SpacingGuide, collect_stops_in_artboard, snap_to_guides,
    spacing_guides,
};
use crate::units::{cm_to_px_rounded, px_to_cm};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for canvas objects.
pub type ObjectId = Uuid;

/// Document errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A named document size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub dpi: f64,
}

/// Built-in document sizes.
pub const PRESETS: &[Preset] = &[
    Preset { name: "A4 Portrait", width: 2480, height: 3508, dpi: 300.0 },
    Preset { name: "A4 Landscape", width: 3508, height: 2480, dpi: 300.0 },
    Preset { name: "A3 Portrait", width: 3508, height: 4961, dpi: 300.0 },
    Preset { name: "A3 Landscape", width: 4961, height: 3508, dpi: 300.0 },
    Preset { name: "Letter Portrait", width: 2550, height: 3300, dpi: 300.0 },
    Preset { name: "Letter Landscape", width: 3300, height: 2550, dpi: 300.0 },
    Preset { name: "A5 Portrait", width: 1748, height: 2480, dpi: 300.0 },
    Preset { name: "A5 Landscape", width: 2480, height: 1748, dpi: 300.0 },
    Preset { name: "Instagram Post", width: 1080, height: 1080, dpi: 72.0 },
    Preset { name: "Instagram Story", width: 1080, height: 1920, dpi: 72.0 },
    Preset { name: "Facebook Cover", width: 820, height: 312, dpi: 72.0 },
    Preset { name: "HD 1920x1080", width: 1920, height: 1080, dpi: 72.0 },
    Preset { name: "4K 3840x2160", width: 3840, height: 2160, dpi: 72.0 },
    Preset { name: "10x15 cm", width: 1181, height: 1772, dpi: 300.0 },
    Preset { name: "15x21 cm", width: 1772, height: 2480, dpi: 300.0 },
    Preset { name: "20x30 cm", width: 2362, height: 3543, dpi: 300.0 },
];

/// Find a preset by name (case-insensitive).
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Artboard size and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Print resolution.
    pub dpi: f64,
    /// Background color as a CSS hex string.
    #[serde(default = "default_background")]
    pub background_color: String,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self::from_preset(&PRESETS[0])
    }
}

impl DocumentSettings {
    pub fn from_preset(preset: &Preset) -> Self {
        Self {
            width: preset.width,
            height: preset.height,
            dpi: preset.dpi,
            background_color: default_background(),
        }
    }

    /// Width in centimeters.
    pub fn width_cm(&self) -> f64 {
        px_to_cm(self.width as f64, self.dpi)
    }

    /// Height in centimeters.
    pub fn height_cm(&self) -> f64 {
        px_to_cm(self.height as f64, self.dpi)
    }

    /// Set the size in centimeters, rounding to whole pixels.
    pub fn set_size_cm(&mut self, width_cm: f64, height_cm: f64) {
        self.width = cm_to_px_rounded(width_cm, self.dpi);
        self.height = cm_to_px_rounded(height_cm, self.dpi);
    }

    /// Artboard size in pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// An image or shape placed on the artboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasObject {
    pub(crate) id: ObjectId,
    #[serde(default)]
    pub name: String,
    /// Position property (top-left of the unrotated object).
    pub anchor: Point,
    /// Unscaled width.
    pub width: f64,
    /// Unscaled height.
    pub height: f64,
    /// Rotation in degrees about the anchor.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

impl CanvasObject {
    /// Create a new object.
    pub fn new(anchor: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            anchor,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: true,
            locked: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Client-space bounding box (scaled, rotated, axis-aligned).
    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_rotated(
            self.anchor.x,
            self.anchor.y,
            self.width * self.scale_x,
            self.height * self.scale_y,
            self.rotation,
        )
    }

    /// Bounding box if the anchor were at `anchor`.
    pub fn bounds_at(&self, anchor: Point) -> Rectangle {
        let mut moved = self.clone();
        moved.anchor = anchor;
        moved.bounds()
    }

    /// Printed size in centimeters at `dpi`.
    pub fn size_cm(&self, dpi: f64) -> (f64, f64) {
        (
            px_to_cm((self.width * self.scale_x).abs(), dpi),
            px_to_cm((self.height * self.scale_y).abs(), dpi),
        )
    }
}

/// A print document containing all placed objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    pub settings: DocumentSettings,
    /// All objects, keyed by ID.
    pub objects: HashMap<ObjectId, CanvasObject>,
    /// Z-order of objects (back to front).
    pub z_order: Vec<ObjectId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentSettings::default())
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new(settings: DocumentSettings) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            settings,
            objects: HashMap::new(),
            z_order: Vec::new(),
        }
    }

    /// Add an object on top of the others.
    pub fn add_object(&mut self, object: CanvasObject) -> ObjectId {
        let id = object.id;
        self.z_order.push(id);
        self.objects.insert(id, object);
        id
    }

    /// Remove an object from the document.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<CanvasObject> {
        self.z_order.retain(|&object_id| object_id != id);
        self.objects.remove(&id)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.objects.get(&id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut CanvasObject> {
        self.objects.get_mut(&id)
    }

    /// Objects in z-order (back to front).
    pub fn objects_ordered(&self) -> impl Iterator<Item = &CanvasObject> {
        self.z_order.iter().filter_map(|id| self.objects.get(id))
    }

    /// Commit a new anchor for an object.
    pub fn move_object(&mut self, id: ObjectId, anchor: Point) -> DocumentResult<()> {
        let object = self.get_object_mut(id).ok_or(DocumentError::ObjectNotFound(id))?;
        object.anchor = anchor;
        Ok(())
    }

    /// The artboard rectangle in canvas pixels.
    pub fn artboard(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.settings.size())
    }

    /// Guide stops from the artboard and every visible object not in `moving`.
    pub fn snap_stops(&self, moving: &[ObjectId]) -> GuideStops {
        let others: Vec<Rectangle> = self
            .objects_ordered()
            .filter(|o| o.visible && !moving.contains(&o.id))
            .map(CanvasObject::bounds)
            .collect();
        collect_stops_in_artboard(self.artboard(), &others)
    }

    /// Snap an object being dragged to `proposed` against the artboard and the
    /// other objects. The document is not modified.
    pub fn snap_object(&self, id: ObjectId, proposed: Point, tolerance: f64) -> DocumentResult<SnapOutcome> {
        let object = self.get_object(id).ok_or(DocumentError::ObjectNotFound(id))?;
        let stops = self.snap_stops(&[id]);
        let outcome = snap_to_guides(&stops, &object.bounds_at(proposed), proposed, tolerance);
        log::debug!(
            "Snap {} at {:?}: {} stops, {} guides",
            id,
            proposed,
            stops.vertical.len(),
            outcome.lines.len()
        );
        Ok(outcome)
    }

    /// Equal-spacing guides for an object placed at `anchor`, against every
    /// other visible object.
    pub fn spacing_guides(&self, id: ObjectId, anchor: Point, tolerance: f64) -> DocumentResult<Vec<SpacingGuide>> {
        let object = self.get_object(id).ok_or(DocumentError::ObjectNotFound(id))?;
        let others: Vec<Rectangle> = self
            .objects_ordered()
            .filter(|o| o.visible && o.id != id)
            .map(CanvasObject::bounds)
            .collect();
        Ok(spacing_guides(&object.bounds_at(anchor), &others, tolerance))
    }

    /// [`Document::snap_object`] with the default tolerance.
    pub fn snap_object_default(&self, id: ObjectId, proposed: Point) -> DocumentResult<SnapOutcome> {
        self.snap_object(id, proposed, DEFAULT_SNAP_TOLERANCE)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> DocumentResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON. The z-order is repaired to list every object once.
    pub fn from_json(json: &str) -> DocumentResult<Self> {
        let mut doc: Self = serde_json::from_str(json).map_err(|e| DocumentError::Serialization(e.to_string()))?;
        doc.repair_z_order();
        Ok(doc)
    }

    /// Drop unknown and repeated ids from `z_order` and put objects missing
    /// from it on top, ordered by id.
    fn repair_z_order(&mut self) {
        let listed = self.z_order.len();
        let objects = &self.objects;
        let mut seen = HashSet::new();
        self.z_order.retain(|id| objects.contains_key(id) && seen.insert(*id));

        let mut missing: Vec<ObjectId> = objects.keys().filter(|id| !seen.contains(*id)).copied().collect();
        missing.sort();
        let dropped = listed - self.z_order.len();
        if dropped > 0 || !missing.is_empty() {
            log::warn!(
                "Repaired z-order: dropped {} entries, appended {} objects",
                dropped,
                missing.len()
            );
        }
        self.z_order.extend(missing);
    }
}
