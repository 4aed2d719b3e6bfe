//! Object construction from flattened outlines
//!
//! | fill | stroke | shape |
//! |---|---|---|
//! | yes | no | [`ObjectShape::Solid`] |
//! | no | yes | [`ObjectShape::Shell`] |
//! | yes | yes | [`ObjectShape::SolidWithRim`] |
//! | no | no | no object |

use crate::converter::PathBuilder;
use crate::error::GeometryError;
use crate::material::ResolvedMaterials;
use crate::model::document::{Element, Geometry};
use crate::model::geometry::{EPSILON, embed};
use crate::model::scene::{Contour, Object3D, ObjectShape, TextBody};
use crate::model::style::ResolvedStyle;
use tracing::debug;

/// Geometry of one element before paint is attached
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Flattened outline loops in the element's user space
    Outline(Vec<Contour>),
    /// Text for the host to lay out
    Text(TextBody),
}

/// Builds [`Object3D`]s with one extrusion depth and world scale
pub struct Extruder<'a, P: PathBuilder + ?Sized> {
    builder: &'a P,
    depth: f64,
    scale: f64,
}

impl<'a, P: PathBuilder + ?Sized> Extruder<'a, P> {
    /// Create an extruder; `scale` converts stroke widths to bevel widths
    pub fn new(builder: &'a P, depth: f64, scale: f64) -> Self {
        Self {
            builder,
            depth,
            scale,
        }
    }

    /// Outline or text body of an element
    ///
    /// Needs no paint, so profiles of independent elements can be computed
    /// on worker threads.
    pub fn profile(&self, element: &Element) -> Result<Profile, GeometryError> {
        match &element.geometry {
            Geometry::Text {
                anchor,
                font_size,
                content,
            } => {
                if content.is_empty() {
                    return Err(GeometryError::Empty("text has no content".into()));
                }
                Ok(Profile::Text(TextBody {
                    content: content.clone(),
                    font_size: *font_size,
                    anchor: *anchor,
                }))
            }
            _ => self.builder.outline(element).map(Profile::Outline),
        }
    }

    /// The roles of `style` that `profile` can show
    ///
    /// A fill on an outline without area is dropped when a stroke remains.
    pub fn painted(
        &self,
        element: &Element,
        profile: &Profile,
        style: &ResolvedStyle,
    ) -> Result<ResolvedStyle, GeometryError> {
        let mut painted = *style;
        let Profile::Outline(outline) = profile else {
            return Ok(painted);
        };

        if painted.fill.is_some() && !outline.iter().any(Contour::has_area) {
            if painted.stroke.is_none() {
                return Err(GeometryError::ZeroArea);
            }
            debug!(element = %element.label(), "outline has no area, keeping stroke only");
            painted.fill = None;
        }
        let length: f64 = outline.iter().map(Contour::length).sum();
        if painted.fill.is_none() && painted.stroke.is_some() && length <= EPSILON {
            return Err(GeometryError::ZeroLength);
        }
        Ok(painted)
    }

    /// Attach materials to a profile
    ///
    /// `style` should come from [`Extruder::painted`]; returns `None` when
    /// neither material is present.
    pub fn finish(
        &self,
        element: &Element,
        profile: Profile,
        style: &ResolvedStyle,
        materials: ResolvedMaterials,
    ) -> Option<Object3D> {
        if materials.is_empty() {
            return None;
        }
        let (outline, text) = match profile {
            Profile::Outline(outline) => (outline, None),
            Profile::Text(body) => (Vec::new(), Some(body)),
        };
        let shape = match (&text, materials.fill.is_some(), materials.stroke.is_some()) {
            (Some(_), _, _) => ObjectShape::Text,
            (None, true, false) => ObjectShape::Solid,
            (None, false, true) => ObjectShape::Shell,
            (None, _, _) => ObjectShape::SolidWithRim,
        };
        let bevel_width = if materials.stroke.is_some() {
            style.stroke_width * self.scale
        } else {
            0.0
        };

        Some(Object3D {
            name: String::new(),
            kind: element.kind(),
            shape,
            outline,
            text,
            extrude_depth: self.depth,
            bevel_width,
            fill_material: materials.fill,
            stroke_material: materials.stroke,
            world_transform: embed(&element.resolved_transform),
            parent: None,
            source_index: element.index,
            source_id: element.id.clone(),
        })
    }

    /// Build the object for one element with materials already resolved
    ///
    /// Returns `Ok(None)` when neither role is painted.
    pub fn build(
        &self,
        element: &Element,
        style: &ResolvedStyle,
        materials: &ResolvedMaterials,
    ) -> Result<Option<Object3D>, GeometryError> {
        if materials.is_empty() {
            return Ok(None);
        }
        let profile = self.profile(element)?;
        let offered = ResolvedStyle {
            fill: materials.fill.as_ref().map(|m| m.rgba),
            stroke: materials.stroke.as_ref().map(|m| m.rgba),
            stroke_width: style.stroke_width,
        };
        let painted = self.painted(element, &profile, &offered)?;
        let materials = ResolvedMaterials {
            fill: materials.fill.clone().filter(|_| painted.fill.is_some()),
            stroke: materials.stroke.clone(),
        };
        Ok(self.finish(element, profile, &painted, materials))
    }
}

/// Build one object with the given outline builder, depth and world scale
pub fn build_object(
    builder: &(impl PathBuilder + ?Sized),
    element: &Element,
    style: &ResolvedStyle,
    materials: &ResolvedMaterials,
    depth: f64,
    scale: f64,
) -> Result<Option<Object3D>, GeometryError> {
    Extruder::new(builder, depth, scale).build(element, style, materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialResolver;
    use crate::model::geometry::{Matrix3, Point2, Rgba};
    use crate::model::style::Style;
    use crate::tessellate::Tessellator;

    fn element(geometry: Geometry) -> Element {
        Element {
            index: 0,
            id: None,
            geometry,
            style: Style::default(),
            local_transform: Matrix3::identity(),
            resolved_transform: Matrix3::identity(),
            children: Vec::new(),
        }
    }

    fn paint(fill: Option<Rgba>, stroke: Option<Rgba>) -> (ResolvedStyle, ResolvedMaterials) {
        let style = ResolvedStyle {
            fill,
            stroke,
            stroke_width: 2.0,
        };
        let materials = MaterialResolver::new().resolve(&style);
        (style, materials)
    }

    fn square() -> Element {
        element(Geometry::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            rx: 0.0,
            ry: 0.0,
        })
    }

    fn build(el: &Element, style: &ResolvedStyle, materials: &ResolvedMaterials) -> Result<Option<Object3D>, GeometryError> {
        build_object(&Tessellator::default(), el, style, materials, 0.1, 0.01)
    }

    #[test]
    fn test_decision_table() {
        let red = Some(Rgba::from_rgb8(255, 0, 0));
        let cases = [
            (red, None, Some(ObjectShape::Solid)),
            (None, red, Some(ObjectShape::Shell)),
            (red, red, Some(ObjectShape::SolidWithRim)),
            (None, None, None),
        ];
        for (fill, stroke, expected) in cases {
            let (style, materials) = paint(fill, stroke);
            let object = build(&square(), &style, &materials).unwrap();
            assert_eq!(object.map(|o| o.shape), expected);
        }
    }

    #[test]
    fn test_bevel_follows_stroke_width() {
        let (style, materials) = paint(None, Some(Rgba::BLACK));
        let object = build(&square(), &style, &materials).unwrap().unwrap();
        assert!((object.bevel_width - 0.02).abs() < 1e-12);
        assert_eq!(object.extrude_depth, 0.1);

        let (style, materials) = paint(Some(Rgba::BLACK), None);
        let object = build(&square(), &style, &materials).unwrap().unwrap();
        assert_eq!(object.bevel_width, 0.0);
    }

    #[test]
    fn test_filled_line_has_no_area() {
        let line = element(Geometry::Polyline(vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 5.0),
        ]));
        let (style, materials) = paint(Some(Rgba::BLACK), None);
        assert_eq!(build(&line, &style, &materials), Err(GeometryError::ZeroArea));

        // With a stroke the fill is dropped and the line becomes a shell
        let (style, materials) = paint(Some(Rgba::BLACK), Some(Rgba::BLACK));
        let object = build(&line, &style, &materials).unwrap().unwrap();
        assert_eq!(object.shape, ObjectShape::Shell);
        assert!(object.fill_material.is_none());
    }

    #[test]
    fn test_zero_length_line() {
        let line = element(Geometry::Line {
            start: Point2::new(1.0, 1.0),
            end: Point2::new(1.0, 1.0),
        });
        let (style, materials) = paint(None, Some(Rgba::BLACK));
        assert_eq!(build(&line, &style, &materials), Err(GeometryError::ZeroLength));
    }

    #[test]
    fn test_text_objects() {
        let text = element(Geometry::Text {
            anchor: Point2::new(1.0, 2.0),
            font_size: 12.0,
            content: "Hi".into(),
        });
        let (style, materials) = paint(Some(Rgba::BLACK), None);
        let object = build(&text, &style, &materials).unwrap().unwrap();
        assert_eq!(object.shape, ObjectShape::Text);
        assert!(object.outline.is_empty());
        assert_eq!(object.text.as_ref().map(|t| t.content.as_str()), Some("Hi"));

        let empty = element(Geometry::Text {
            anchor: Point2::origin(),
            font_size: 12.0,
            content: String::new(),
        });
        assert!(matches!(build(&empty, &style, &materials), Err(GeometryError::Empty(_))));
    }

    #[test]
    fn test_materials_follow_painted_roles() {
        let tessellator = Tessellator::default();
        let extruder = Extruder::new(&tessellator, 0.1, 0.01);
        let line = element(Geometry::Polyline(vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 5.0),
        ]));
        let style = ResolvedStyle {
            fill: Some(Rgba::from_rgb8(0, 255, 0)),
            stroke: Some(Rgba::BLACK),
            stroke_width: 1.0,
        };

        let profile = extruder.profile(&line).unwrap();
        let painted = extruder.painted(&line, &profile, &style).unwrap();
        assert!(painted.fill.is_none());

        let resolver = MaterialResolver::new();
        let object = extruder
            .finish(&line, profile, &painted, resolver.resolve(&painted))
            .unwrap();
        assert_eq!(object.shape, ObjectShape::Shell);
        assert_eq!(resolver.len(), 1);
        let stroke = object.stroke_material.as_ref().unwrap();
        assert!(std::sync::Arc::ptr_eq(stroke, &resolver.materials()[0]));
    }
}
