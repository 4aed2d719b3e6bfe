//! Outline flattening
//!
//! Curves become polylines: Béziers with a segment count from Wang's
//! formula, arcs by angular subdivision of their center parameterization.
//! Both use the same tolerance and the same `[min, max]` segment clamp.

use crate::converter::PathBuilder;
use crate::error::GeometryError;
use crate::model::document::{Element, Geometry};
use crate::model::geometry::{EPSILON, Point2, approx_eq};
use crate::model::path::{ArcSegment, PathSegment};
use crate::model::scene::Contour;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Curve flattening parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlattenOptions {
    /// Maximum distance between a curve and its polyline, in user units
    pub tolerance: f64,
    /// Fewest segments per curve
    pub min_segments: usize,
    /// Most segments per curve
    pub max_segments: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.25,
            min_segments: 4,
            max_segments: 64,
        }
    }
}

impl FlattenOptions {
    fn clamp(&self, n: f64) -> usize {
        let n = if n.is_finite() { n.ceil().max(0.0) as usize } else { self.max_segments };
        n.clamp(self.min_segments.max(1), self.max_segments.max(1))
    }

    /// Segment count for a cubic Bézier (Wang's formula)
    pub fn cubic_segments(&self, p0: &Point2, c1: &Point2, c2: &Point2, p1: &Point2) -> usize {
        let d1 = (p0 - 2.0 * c1.coords + c2.coords).coords.norm();
        let d2 = (c1 - 2.0 * c2.coords + p1.coords).coords.norm();
        self.clamp((0.75 * d1.max(d2) / self.tolerance).sqrt())
    }

    /// Segment count for a quadratic Bézier (Wang's formula)
    pub fn quadratic_segments(&self, p0: &Point2, c: &Point2, p1: &Point2) -> usize {
        let d = (p0 - 2.0 * c.coords + p1.coords).coords.norm();
        self.clamp((0.25 * d / self.tolerance).sqrt())
    }

    /// Segment count for an arc of `sweep` radians on a radius `radius`
    pub fn arc_segments(&self, radius: f64, sweep: f64) -> usize {
        let step = if self.tolerance < radius {
            2.0 * (1.0 - self.tolerance / radius).acos()
        } else {
            FRAC_PI_2
        };
        self.clamp(sweep.abs() / step)
    }
}

/// Points along a cubic Bézier, excluding `p0` and ending exactly at `p1`
pub fn flatten_cubic(
    p0: &Point2,
    c1: &Point2,
    c2: &Point2,
    p1: &Point2,
    options: &FlattenOptions,
) -> Vec<Point2> {
    let n = options.cubic_segments(p0, c1, c2, p1);
    let mut points: Vec<Point2> = (1..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            Point2::from(a * p0.coords + b * c1.coords + c * c2.coords + d * p1.coords)
        })
        .collect();
    points.push(*p1);
    points
}

/// Points along a quadratic Bézier, excluding `p0` and ending exactly at `p1`
pub fn flatten_quadratic(
    p0: &Point2,
    c: &Point2,
    p1: &Point2,
    options: &FlattenOptions,
) -> Vec<Point2> {
    let n = options.quadratic_segments(p0, c, p1);
    let mut points: Vec<Point2> = (1..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let mt = 1.0 - t;
            Point2::from(mt * mt * p0.coords + 2.0 * mt * t * c.coords + t * t * p1.coords)
        })
        .collect();
    points.push(*p1);
    points
}

/// Points along an arc, excluding the start and ending exactly at the end
pub fn flatten_arc(arc: &ArcSegment, options: &FlattenOptions) -> Vec<Point2> {
    if arc.is_degenerate() {
        return vec![arc.end];
    }
    let center = arc.to_center();
    let n = options.arc_segments(center.rx.max(center.ry), center.sweep_angle);
    let mut points: Vec<Point2> = (1..n)
        .map(|i| center.point_at(center.start_angle + center.sweep_angle * i as f64 / n as f64))
        .collect();
    points.push(arc.end);
    points
}

/// Split path segments into flattened contours, one per subpath
///
/// Subpaths with fewer than two distinct points are dropped.
pub fn path_contours(segments: &[PathSegment], options: &FlattenOptions) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut points: Vec<Point2> = Vec::new();

    for segment in segments {
        match segment {
            PathSegment::MoveTo(p) => {
                finish_contour(&mut contours, std::mem::take(&mut points), false);
                points.push(*p);
            }
            PathSegment::LineTo(p) => points.push(*p),
            PathSegment::CubicBezier { p0, c1, c2, p1 } => {
                points.extend(flatten_cubic(p0, c1, c2, p1, options));
            }
            PathSegment::QuadraticBezier { p0, c, p1 } => {
                points.extend(flatten_quadratic(p0, c, p1, options));
            }
            PathSegment::Arc(arc) => points.extend(flatten_arc(arc, options)),
            PathSegment::ClosePath => {
                finish_contour(&mut contours, std::mem::take(&mut points), true);
            }
        }
    }
    finish_contour(&mut contours, points, false);
    contours
}

fn finish_contour(contours: &mut Vec<Contour>, mut points: Vec<Point2>, closed: bool) {
    points.dedup_by(|a, b| approx_eq(a, b));
    if closed && points.len() > 1 && approx_eq(&points[0], &points[points.len() - 1]) {
        points.pop();
    }
    if points.len() >= 2 {
        contours.push(Contour::new(points, closed));
    }
}

/// Closed outline of an axis-aligned ellipse
pub fn ellipse_outline(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    options: &FlattenOptions,
) -> Result<Contour, GeometryError> {
    if rx <= EPSILON || ry <= EPSILON {
        return Err(GeometryError::CollapsedArc { rx, ry });
    }
    let n = 4 * options.arc_segments(rx.max(ry), FRAC_PI_2);
    let points = (0..n)
        .map(|i| {
            let t = TAU * i as f64 / n as f64;
            Point2::new(cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect();
    Ok(Contour::new(points, true))
}

/// Closed outline of a rectangle, with elliptical corners when `rx`/`ry` > 0
pub fn rect_outline(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rx: f64,
    ry: f64,
    options: &FlattenOptions,
) -> Result<Contour, GeometryError> {
    if width <= EPSILON || height <= EPSILON {
        return Err(GeometryError::ZeroArea);
    }
    if rx <= EPSILON || ry <= EPSILON {
        return Ok(Contour::new(
            vec![
                Point2::new(x, y),
                Point2::new(x + width, y),
                Point2::new(x + width, y + height),
                Point2::new(x, y + height),
            ],
            true,
        ));
    }

    let n = options.arc_segments(rx.max(ry), FRAC_PI_2);
    // Corner centers clockwise from top-right, each with its start angle
    let corners = [
        (x + width - rx, y + ry, -FRAC_PI_2),
        (x + width - rx, y + height - ry, 0.0),
        (x + rx, y + height - ry, FRAC_PI_2),
        (x + rx, y + ry, PI),
    ];
    let mut points = Vec::with_capacity(4 * (n + 1));
    for (ccx, ccy, start) in corners {
        for i in 0..=n {
            let t = start + FRAC_PI_2 * i as f64 / n as f64;
            points.push(Point2::new(ccx + rx * t.cos(), ccy + ry * t.sin()));
        }
    }
    points.dedup_by(|a, b| approx_eq(a, b));
    if points.len() > 1 && approx_eq(&points[0], &points[points.len() - 1]) {
        points.pop();
    }
    Ok(Contour::new(points, true))
}

/// Flattens element geometry into contours
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tessellator {
    /// Flattening parameters
    pub options: FlattenOptions,
}

impl Tessellator {
    /// Create a tessellator
    pub fn new(options: FlattenOptions) -> Self {
        Self { options }
    }
}

impl PathBuilder for Tessellator {
    fn outline(&self, element: &Element) -> Result<Vec<Contour>, GeometryError> {
        let options = &self.options;
        let contours = match &element.geometry {
            Geometry::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => vec![rect_outline(*x, *y, *width, *height, *rx, *ry, options)?],
            Geometry::Circle { cx, cy, r } => vec![ellipse_outline(*cx, *cy, *r, *r, options)?],
            Geometry::Ellipse { cx, cy, rx, ry } => {
                vec![ellipse_outline(*cx, *cy, *rx, *ry, options)?]
            }
            Geometry::Line { start, end } => {
                if approx_eq(start, end) {
                    return Err(GeometryError::ZeroLength);
                }
                vec![Contour::new(vec![*start, *end], false)]
            }
            Geometry::Polyline(points) | Geometry::Polygon(points) => {
                let closed = matches!(element.geometry, Geometry::Polygon(_));
                let mut contours = Vec::new();
                finish_contour(&mut contours, points.clone(), closed);
                if contours.is_empty() {
                    return Err(GeometryError::Empty(format!(
                        "{} needs at least two distinct points",
                        element.kind().tag()
                    )));
                }
                contours
            }
            Geometry::Path(segments) => {
                let contours = path_contours(segments, options);
                if contours.is_empty() {
                    return Err(GeometryError::Empty("path has no drawable subpath".into()));
                }
                contours
            }
            Geometry::Text { .. } | Geometry::Group => Vec::new(),
        };

        let finite = contours
            .iter()
            .flat_map(|c| c.points.iter())
            .all(|p| p.x.is_finite() && p.y.is_finite());
        if !finite {
            return Err(GeometryError::NonFinite);
        }
        Ok(contours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_path;

    fn options() -> FlattenOptions {
        FlattenOptions::default()
    }

    #[test]
    fn test_segment_counts_are_clamped() {
        let o = options();
        let flat = Point2::new(0.0, 0.0);
        // A straight "curve" still gets the minimum
        assert_eq!(o.cubic_segments(&flat, &flat, &flat, &Point2::new(1.0, 0.0)), 4);
        let far = Point2::new(1e6, 1e6);
        assert_eq!(o.quadratic_segments(&flat, &far, &Point2::new(2e6, 0.0)), 64);
    }

    #[test]
    fn test_tighter_tolerance_means_more_segments() {
        let coarse = FlattenOptions {
            tolerance: 1.0,
            ..options()
        };
        let fine = FlattenOptions {
            tolerance: 0.01,
            ..options()
        };
        let (p0, c1, c2, p1) = (
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 100.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 0.0),
        );
        assert!(fine.cubic_segments(&p0, &c1, &c2, &p1) > coarse.cubic_segments(&p0, &c1, &c2, &p1));
    }

    #[test]
    fn test_flatten_cubic_stays_near_curve() {
        let (p0, c1, c2, p1) = (
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
        );
        let points = flatten_cubic(&p0, &c1, &c2, &p1, &options());
        assert_eq!(*points.last().unwrap(), p1);
        // Symmetric curve peaks at y = 7.5
        let peak = points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!(peak <= 7.5 + 1e-9 && peak > 7.0);
    }

    #[test]
    fn test_flatten_arc_stays_on_circle() {
        let arc = ArcSegment::new(
            Point2::new(10.0, 0.0),
            Point2::new(-10.0, 0.0),
            10.0,
            10.0,
            0.0,
            false,
            true,
        );
        let points = flatten_arc(&arc, &options());
        assert!(points.len() >= 4);
        for p in &points {
            assert!((p.coords.norm() - 10.0).abs() < 1e-9);
        }
        // Positive sweep in y-down space passes through +y
        assert!(points.iter().any(|p| p.y > 9.0));
    }

    #[test]
    fn test_path_contours_split_subpaths() {
        let segments = parse_path("M0 0 L10 0 L10 10 Z M20 20 L30 20").unwrap();
        let contours = path_contours(&segments, &options());
        assert_eq!(contours.len(), 2);
        assert!(contours[0].closed);
        assert_eq!(contours[0].points.len(), 3);
        assert!(!contours[1].closed);
    }

    #[test]
    fn test_lone_moveto_is_dropped() {
        let segments = parse_path("M0 0 M5 5 L6 6").unwrap();
        let contours = path_contours(&segments, &options());
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn test_rect_outlines() {
        let plain = rect_outline(0.0, 0.0, 10.0, 5.0, 0.0, 0.0, &options()).unwrap();
        assert_eq!(plain.points.len(), 4);
        assert!((plain.signed_area().abs() - 50.0).abs() < 1e-9);

        let rounded = rect_outline(0.0, 0.0, 10.0, 10.0, 2.0, 2.0, &options()).unwrap();
        let area = rounded.signed_area().abs();
        let exact = 100.0 - (4.0 - PI) * 4.0;
        assert!(area < 100.0 && (area - exact).abs() < 0.5);

        assert_eq!(
            rect_outline(0.0, 0.0, 0.0, 5.0, 0.0, 0.0, &options()),
            Err(GeometryError::ZeroArea)
        );
    }

    #[test]
    fn test_ellipse_outline() {
        let circle = ellipse_outline(0.0, 0.0, 5.0, 5.0, &options()).unwrap();
        assert!(circle.closed);
        assert_eq!(circle.points.len() % 4, 0);
        let area = circle.signed_area().abs();
        assert!((area - PI * 25.0).abs() / (PI * 25.0) < 0.05);
        assert!(matches!(
            ellipse_outline(0.0, 0.0, 0.0, 5.0, &options()),
            Err(GeometryError::CollapsedArc { .. })
        ));
    }
}
