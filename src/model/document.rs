//! Parsed document tree

use super::geometry::{Matrix3, Point2, scaling, translation};
use super::path::PathSegment;
use super::style::Style;
use crate::error::{Result, Warning};
use serde::Serialize;
use std::fmt;

/// The `viewBox` rectangle of the root element
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    /// Left edge in user units
    pub min_x: f64,
    /// Top edge in user units
    pub min_y: f64,
    /// Width in user units
    pub width: f64,
    /// Height in user units
    pub height: f64,
}

impl ViewBox {
    /// Parse `"min-x min-y width height"` (comma or whitespace separated)
    ///
    /// Returns `None` unless there are exactly four numbers and a positive size.
    pub fn parse(s: &str) -> Option<Self> {
        let values: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match values.as_slice() {
            &[min_x, min_y, width, height]
                if [min_x, min_y, width, height].iter().all(|v| v.is_finite())
                    && width > 0.0
                    && height > 0.0 =>
            {
                Some(Self {
                    min_x,
                    min_y,
                    width,
                    height,
                })
            }
            _ => None,
        }
    }
}

/// Element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    /// `<rect>`
    Rect,
    /// `<circle>`
    Circle,
    /// `<ellipse>`
    Ellipse,
    /// `<line>`
    Line,
    /// `<polyline>`
    Polyline,
    /// `<polygon>`
    Polygon,
    /// `<path>`
    Path,
    /// `<text>`
    Text,
    /// `<g>`
    Group,
}

impl ElementKind {
    /// Map a markup tag to its kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "path" => ElementKind::Path,
            "text" => ElementKind::Text,
            "g" => ElementKind::Group,
            _ => return None,
        };
        Some(kind)
    }

    /// Markup tag of this kind
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Polyline => "polyline",
            ElementKind::Polygon => "polygon",
            ElementKind::Path => "path",
            ElementKind::Text => "text",
            ElementKind::Group => "g",
        }
    }

    /// Base name used for objects of this kind (`Rect`, `Group`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Rect => "Rect",
            ElementKind::Circle => "Circle",
            ElementKind::Ellipse => "Ellipse",
            ElementKind::Line => "Line",
            ElementKind::Polyline => "Polyline",
            ElementKind::Polygon => "Polygon",
            ElementKind::Path => "Path",
            ElementKind::Text => "Text",
            ElementKind::Group => "Group",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific payload of an element, in user units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    /// Rectangle with optional rounded corners
    Rect {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width
        width: f64,
        /// Height
        height: f64,
        /// Corner radius along x
        rx: f64,
        /// Corner radius along y
        ry: f64,
    },
    /// Circle
    Circle {
        /// Center x
        cx: f64,
        /// Center y
        cy: f64,
        /// Radius
        r: f64,
    },
    /// Axis-aligned ellipse
    Ellipse {
        /// Center x
        cx: f64,
        /// Center y
        cy: f64,
        /// Radius along x
        rx: f64,
        /// Radius along y
        ry: f64,
    },
    /// Straight line segment
    Line {
        /// Start point
        start: Point2,
        /// End point
        end: Point2,
    },
    /// Open polyline
    Polyline(Vec<Point2>),
    /// Closed polygon
    Polygon(Vec<Point2>),
    /// Path as absolute segments
    Path(Vec<PathSegment>),
    /// Text run
    Text {
        /// Anchor point of the baseline
        anchor: Point2,
        /// Font size in user units
        font_size: f64,
        /// Whitespace-collapsed content
        content: String,
    },
    /// Group container
    Group,
}

impl Geometry {
    /// Kind of element this payload belongs to
    pub fn kind(&self) -> ElementKind {
        match self {
            Geometry::Rect { .. } => ElementKind::Rect,
            Geometry::Circle { .. } => ElementKind::Circle,
            Geometry::Ellipse { .. } => ElementKind::Ellipse,
            Geometry::Line { .. } => ElementKind::Line,
            Geometry::Polyline(_) => ElementKind::Polyline,
            Geometry::Polygon(_) => ElementKind::Polygon,
            Geometry::Path(_) => ElementKind::Path,
            Geometry::Text { .. } => ElementKind::Text,
            Geometry::Group => ElementKind::Group,
        }
    }
}

/// One element of the document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Position in document order, counting every recognized element
    pub index: usize,
    /// The `id` attribute
    pub id: Option<String>,
    /// Kind-specific payload
    pub geometry: Geometry,
    /// Style with inheritance applied
    pub style: Style,
    /// The element's own `transform`
    pub local_transform: Matrix3,
    /// Local transform composed with every ancestor transform
    pub resolved_transform: Matrix3,
    /// Child elements (groups only)
    pub children: Vec<Element>,
}

impl Element {
    /// Element type
    pub fn kind(&self) -> ElementKind {
        self.geometry.kind()
    }

    /// Whether this element is a group container
    pub fn is_group(&self) -> bool {
        matches!(self.geometry, Geometry::Group)
    }

    /// Short label for diagnostics: `path#logo` or `rect[3]`
    pub fn label(&self) -> String {
        element_label(self.kind().tag(), self.index, self.id.as_deref())
    }
}

impl Drop for Element {
    // Iterative: nesting depth is unbounded
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

pub(crate) fn element_label(tag: &str, index: usize, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{}#{}", tag, id),
        None => format!("{}[{}]", tag, index),
    }
}

/// A parsed SVG document
///
/// The tree is immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels
    pub height: f64,
    /// The root `viewBox`, when present and valid
    pub view_box: Option<ViewBox>,
    /// Top-level elements in document order
    pub elements: Vec<Element>,
    /// Problems found while parsing
    pub diagnostics: Vec<Warning>,
    /// Number of shape elements encountered, including rejected ones
    pub elements_seen: usize,
}

impl Document {
    /// Viewport width used when neither `width` nor `viewBox` says otherwise
    pub const DEFAULT_WIDTH: f64 = 800.0;
    /// Viewport height used when neither `height` nor `viewBox` says otherwise
    pub const DEFAULT_HEIGHT: f64 = 600.0;

    /// Parse SVG markup
    ///
    /// # Example
    ///
    /// ```
    /// use svg3d::Document;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let doc = Document::parse(r#"<svg width="10" height="10"><rect width="4" height="4"/></svg>"#)?;
    /// assert_eq!(doc.elements.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(markup: &str) -> Result<Self> {
        crate::parser::parse(markup)
    }

    /// Transform from user space (viewBox coordinates) to viewport pixels
    ///
    /// Uses `xMidYMid meet`: uniform scale, centered.
    pub fn viewport_transform(&self) -> Matrix3 {
        let Some(vb) = self.view_box else {
            return Matrix3::identity();
        };
        let s = (self.width / vb.width).min(self.height / vb.height);
        let tx = (self.width - vb.width * s) / 2.0 - vb.min_x * s;
        let ty = (self.height - vb.height * s) / 2.0 - vb.min_y * s;
        translation(tx, ty) * scaling(s, s)
    }

    /// Every element in document order (pre-order, groups before children)
    pub fn iter(&self) -> Descendants<'_> {
        Descendants {
            stack: self.elements.iter().rev().collect(),
        }
    }
}

/// Pre-order iterator over a document tree
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(index: usize, geometry: Geometry) -> Element {
        Element {
            index,
            id: None,
            geometry,
            style: Style::default(),
            local_transform: Matrix3::identity(),
            resolved_transform: Matrix3::identity(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_viewbox_parse() {
        let vb = ViewBox::parse("0, 0 100 50").unwrap();
        assert_eq!(vb.width, 100.0);
        assert_eq!(vb.height, 50.0);
        assert!(ViewBox::parse("0 0 100").is_none());
        assert!(ViewBox::parse("0 0 0 10").is_none());
        assert!(ViewBox::parse("a b c d").is_none());
        assert!(ViewBox::parse("0 0 inf 10").is_none());
        assert!(ViewBox::parse("0 0 10 NaN").is_none());
        assert!(ViewBox::parse("0 0 -5 10").is_none());
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for tag in ["rect", "circle", "ellipse", "line", "polyline", "polygon", "path", "text", "g"] {
            assert_eq!(ElementKind::from_tag(tag).unwrap().tag(), tag);
        }
        assert_eq!(ElementKind::from_tag("defs"), None);
    }

    #[test]
    fn test_labels() {
        let mut rect = leaf(3, Geometry::Group);
        assert_eq!(rect.label(), "g[3]");
        rect.id = Some("logo".into());
        assert_eq!(rect.label(), "g#logo");
    }

    #[test]
    fn test_viewport_transform_meet() {
        let doc = Document {
            width: 200.0,
            height: 100.0,
            view_box: Some(ViewBox {
                min_x: 10.0,
                min_y: 10.0,
                width: 50.0,
                height: 50.0,
            }),
            elements: Vec::new(),
            diagnostics: Vec::new(),
            elements_seen: 0,
        };
        let m = doc.viewport_transform();
        let p = m.transform_point(&Point2::new(10.0, 10.0));
        // Scale 2, centered horizontally: (200 - 100) / 2 = 50
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_iter_is_preorder() {
        let mut group = leaf(0, Geometry::Group);
        group.children.push(leaf(1, Geometry::Polyline(Vec::new())));
        group.children.push(leaf(2, Geometry::Polygon(Vec::new())));
        let doc = Document {
            width: 1.0,
            height: 1.0,
            view_box: None,
            elements: vec![group, leaf(3, Geometry::Path(Vec::new()))],
            diagnostics: Vec::new(),
            elements_seen: 3,
        };
        let order: Vec<usize> = doc.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let mut root = leaf(0, Geometry::Group);
        for index in 1..200_000 {
            let mut group = leaf(index, Geometry::Group);
            group.children.push(root);
            root = group;
        }
        drop(root);
    }
}
