//! Host-agnostic output of a conversion

use super::document::ElementKind;
use super::geometry::{EPSILON, Matrix4, Point2, Point3, Rgba};
use crate::error::Warning;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Which part of an element a material paints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MaterialRole {
    /// Interior of the shape
    Fill,
    /// Outline of the shape
    Stroke,
}

impl MaterialRole {
    fn prefix(&self) -> &'static str {
        match self {
            MaterialRole::Fill => "Fill",
            MaterialRole::Stroke => "Stroke",
        }
    }
}

impl fmt::Display for MaterialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialRole::Fill => f.write_str("fill"),
            MaterialRole::Stroke => f.write_str("stroke"),
        }
    }
}

/// Cache key that de-duplicates materials
///
/// Color is quantized to 8-bit hex and opacity to hundredths, so colors that
/// only differ below that precision share one material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MaterialKey {
    /// Painted role
    pub role: MaterialRole,
    /// Color as `#rrggbb`
    pub color: String,
    /// Opacity in hundredths, `0..=100`
    pub opacity: u8,
}

impl MaterialKey {
    /// Key for a role painted with `rgba` (alpha is the final opacity)
    pub fn new(role: MaterialRole, rgba: &Rgba) -> Self {
        Self {
            role,
            color: rgba.to_hex(),
            opacity: (rgba.a.clamp(0.0, 1.0) * 100.0).round() as u8,
        }
    }

    /// Host-friendly material name such as `Fill_ff0000_100`
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.role.prefix(),
            self.color.trim_start_matches('#'),
            self.opacity
        )
    }
}

/// Dense material index, in order of first use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MaterialId(pub usize);

/// A shared, immutable material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    /// Index into the scene's material table
    pub id: MaterialId,
    /// De-duplication key
    pub key: MaterialKey,
    /// Color and opacity
    pub rgba: Rgba,
    /// Display name
    pub name: String,
}

impl Material {
    /// Painted role
    pub fn role(&self) -> MaterialRole {
        self.key.role
    }
}

/// Shared handle to a material
pub type MaterialRef = Arc<Material>;

/// One flattened polyline of an outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    /// Vertices in order; a closed contour does not repeat its first point
    pub points: Vec<Point2>,
    /// Whether the last point connects back to the first
    pub closed: bool,
}

impl Contour {
    /// Create a contour
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Signed area by the shoelace formula, positive when counter-clockwise
    /// in a y-up frame
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = &self.points[i];
                let b = &self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice / 2.0
    }

    /// Whether the contour encloses a non-negligible area
    pub fn has_area(&self) -> bool {
        self.signed_area().abs() > EPSILON
    }

    /// Total edge length, including the closing edge of a closed contour
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) if self.points.len() > 2 => {
                open + (first - last).norm()
            }
            _ => open,
        }
    }

    /// Even-odd point containment test
    pub fn contains(&self, p: &Point2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Same contour with the point order reversed
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            closed: self.closed,
        }
    }
}

/// How an object is to be realized by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectShape {
    /// Extruded solid painted with the fill material
    Solid,
    /// Thin-walled extrusion of the outline, painted with the stroke material
    Shell,
    /// Extruded solid with a beveled rim in the stroke material
    SolidWithRim,
    /// Text object; the host builds glyph geometry
    Text,
}

/// Content of a text object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    /// Whitespace-collapsed characters
    pub content: String,
    /// Font size in user units
    pub font_size: f64,
    /// Baseline anchor in user units
    pub anchor: Point2,
}

fn serialize_material_id<S: Serializer>(
    material: &Option<MaterialRef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    material.as_ref().map(|m| m.id).serialize(serializer)
}

/// A 3D solid or curve description
///
/// `outline` is in the element's user space; `world_transform` carries it
/// into the scene (scale applied to X/Y, Y flipped, Z left for extrusion).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Object3D {
    /// Unique object name
    pub name: String,
    /// Element kind the object came from
    pub kind: ElementKind,
    /// Realization mode
    pub shape: ObjectShape,
    /// Flattened outline loops
    pub outline: Vec<Contour>,
    /// Text payload for [`ObjectShape::Text`]
    pub text: Option<TextBody>,
    /// Extrusion depth in world units
    pub extrude_depth: f64,
    /// Bevel width in world units, zero without a stroke
    pub bevel_width: f64,
    /// Fill material
    #[serde(serialize_with = "serialize_material_id")]
    pub fill_material: Option<MaterialRef>,
    /// Stroke material
    #[serde(serialize_with = "serialize_material_id")]
    pub stroke_material: Option<MaterialRef>,
    /// Object-to-world transform
    pub world_transform: Matrix4,
    /// Name of the enclosing group
    pub parent: Option<String>,
    /// Document-order index of the source element
    pub source_index: usize,
    /// The source element's `id`
    #[serde(skip)]
    pub(crate) source_id: Option<String>,
}

/// Entry in the group index mirroring `<g>` nesting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode {
    /// Unique group name
    pub name: String,
    /// Name of the enclosing group
    pub parent: Option<String>,
    /// Document-order index of the group element
    pub source_index: usize,
    /// Group-to-world transform
    pub world_transform: Matrix4,
}

/// Orthographic camera looking down -Z
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    /// Camera position
    pub location: Point3,
    /// Point the camera looks at
    pub target: Point3,
    /// Width of the visible area in world units
    pub ortho_scale: f64,
    /// Far clipping distance
    pub clip_end: f64,
}

/// Light type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LightKind {
    /// Directional light
    Sun,
}

/// A scene light
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Light {
    /// Light type
    pub kind: LightKind,
    /// Light position
    pub location: Point3,
    /// Strength in host units
    pub energy: f64,
}

/// Conversion statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Shape elements encountered
    pub elements_total: usize,
    /// Objects produced
    pub objects_created: usize,
    /// Shape elements that produced no object
    pub elements_skipped: usize,
    /// Every recoverable problem, in document order
    pub warnings: Vec<Warning>,
}

/// Result of a conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Objects in document order
    pub objects: Vec<Object3D>,
    /// Material table, indexed by [`MaterialId`]
    pub materials: Vec<MaterialRef>,
    /// Group index
    pub groups: Vec<GroupNode>,
    /// Camera placeholder
    pub camera: Camera,
    /// Light placeholders
    pub lights: Vec<Light>,
    /// Statistics and warnings
    pub summary: Summary,
    /// World units per user unit
    pub scale: f64,
}

impl Scene {
    /// Look up an object by name
    pub fn object(&self, name: &str) -> Option<&Object3D> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Look up a material by id
    pub fn material(&self, id: MaterialId) -> Option<&MaterialRef> {
        self.materials.get(id.0)
    }

    /// Objects whose parent is the named group
    pub fn children_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Object3D> + 'a {
        self.objects
            .iter()
            .filter(move |o| o.parent.as_deref() == Some(group))
    }
}
