//! Path segments in absolute coordinates

use super::geometry::{EPSILON, Point2, approx_eq};
use serde::Serialize;
use std::f64::consts::TAU;
use std::fmt::Write;

/// One drawing instruction of a path, all coordinates absolute
///
/// Every subpath starts with [`PathSegment::MoveTo`]; [`PathSegment::ClosePath`]
/// returns to the point of the most recent `MoveTo`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathSegment {
    /// Start a new subpath
    MoveTo(Point2),
    /// Straight line from the current point
    LineTo(Point2),
    /// Cubic Bézier curve
    CubicBezier {
        /// Start point (the current point)
        p0: Point2,
        /// First control point
        c1: Point2,
        /// Second control point
        c2: Point2,
        /// End point
        p1: Point2,
    },
    /// Quadratic Bézier curve
    QuadraticBezier {
        /// Start point (the current point)
        p0: Point2,
        /// Control point
        c: Point2,
        /// End point
        p1: Point2,
    },
    /// Elliptical arc
    Arc(ArcSegment),
    /// Close the current subpath
    ClosePath,
}

impl PathSegment {
    /// Point the pen rests on after this segment, `None` for ClosePath
    pub fn end_point(&self) -> Option<Point2> {
        match self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(*p),
            PathSegment::CubicBezier { p1, .. } | PathSegment::QuadraticBezier { p1, .. } => {
                Some(*p1)
            }
            PathSegment::Arc(arc) => Some(arc.end),
            PathSegment::ClosePath => None,
        }
    }

    /// Structural equality with coordinates compared within `tolerance`
    pub fn approx_eq(&self, other: &PathSegment, tolerance: f64) -> bool {
        let close = |a: &Point2, b: &Point2| {
            (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
        };
        let near = |a: f64, b: f64| (a - b).abs() <= tolerance;
        match (self, other) {
            (PathSegment::MoveTo(a), PathSegment::MoveTo(b))
            | (PathSegment::LineTo(a), PathSegment::LineTo(b)) => close(a, b),
            (
                PathSegment::CubicBezier { p0, c1, c2, p1 },
                PathSegment::CubicBezier {
                    p0: q0,
                    c1: d1,
                    c2: d2,
                    p1: q1,
                },
            ) => close(p0, q0) && close(c1, d1) && close(c2, d2) && close(p1, q1),
            (
                PathSegment::QuadraticBezier { p0, c, p1 },
                PathSegment::QuadraticBezier {
                    p0: q0,
                    c: d,
                    p1: q1,
                },
            ) => close(p0, q0) && close(c, d) && close(p1, q1),
            (PathSegment::Arc(a), PathSegment::Arc(b)) => {
                close(&a.start, &b.start)
                    && close(&a.end, &b.end)
                    && near(a.rx, b.rx)
                    && near(a.ry, b.ry)
                    && near(a.x_axis_rotation, b.x_axis_rotation)
                    && a.large_arc == b.large_arc
                    && a.sweep == b.sweep
            }
            (PathSegment::ClosePath, PathSegment::ClosePath) => true,
            _ => false,
        }
    }
}

/// Elliptical arc in endpoint parameterization
///
/// Radii are always positive and large enough to span the chord; the
/// constructor applies the out-of-range radii correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcSegment {
    /// Start point
    pub start: Point2,
    /// End point
    pub end: Point2,
    /// Radius along the ellipse's x axis
    pub rx: f64,
    /// Radius along the ellipse's y axis
    pub ry: f64,
    /// Rotation of the ellipse's x axis, in degrees
    pub x_axis_rotation: f64,
    /// Take the arc spanning more than 180 degrees
    pub large_arc: bool,
    /// Travel in the positive-angle direction
    pub sweep: bool,
}

/// Center parameterization of an arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCenter {
    /// Ellipse center
    pub center: Point2,
    /// Corrected x radius
    pub rx: f64,
    /// Corrected y radius
    pub ry: f64,
    /// Ellipse rotation in radians
    pub phi: f64,
    /// Start angle in radians
    pub start_angle: f64,
    /// Signed sweep in radians, within `(-2π, 2π)`
    pub sweep_angle: f64,
}

impl ArcSegment {
    /// Build an arc, taking absolute radii and scaling them up by √Λ when
    /// they are too small to reach from `start` to `end`
    pub fn new(
        start: Point2,
        end: Point2,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
    ) -> Self {
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        let (x1p, y1p) = rotated_half_chord(&start, &end, x_axis_rotation.to_radians());
        if rx > 0.0 && ry > 0.0 {
            let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
            if lambda > 1.0 {
                let s = lambda.sqrt();
                rx *= s;
                ry *= s;
            }
        }
        Self {
            start,
            end,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
        }
    }

    /// Whether the arc draws nothing (coincident endpoints or a zero radius)
    pub fn is_degenerate(&self) -> bool {
        approx_eq(&self.start, &self.end) || self.rx <= EPSILON || self.ry <= EPSILON
    }

    /// Convert to center parameterization
    pub fn to_center(&self) -> ArcCenter {
        let phi = self.x_axis_rotation.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (x1p, y1p) = rotated_half_chord(&self.start, &self.end, phi);
        let (rx, ry) = (self.rx, self.ry);

        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
        let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
        let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
        if self.large_arc == self.sweep {
            coef = -coef;
        }
        let cxp = coef * (rx * y1p / ry);
        let cyp = coef * (-ry * x1p / rx);

        let mid_x = (self.start.x + self.end.x) / 2.0;
        let mid_y = (self.start.y + self.end.y) / 2.0;
        let center = Point2::new(
            cos_phi * cxp - sin_phi * cyp + mid_x,
            sin_phi * cxp + cos_phi * cyp + mid_y,
        );

        let ux = (x1p - cxp) / rx;
        let uy = (y1p - cyp) / ry;
        let vx = (-x1p - cxp) / rx;
        let vy = (-y1p - cyp) / ry;

        let start_angle = vector_angle(1.0, 0.0, ux, uy);
        let mut sweep_angle = vector_angle(ux, uy, vx, vy) % TAU;
        if !self.sweep && sweep_angle > 0.0 {
            sweep_angle -= TAU;
        } else if self.sweep && sweep_angle < 0.0 {
            sweep_angle += TAU;
        }

        ArcCenter {
            center,
            rx,
            ry,
            phi,
            start_angle,
            sweep_angle,
        }
    }
}

impl ArcCenter {
    /// Point on the ellipse at parameter `theta`
    pub fn point_at(&self, theta: f64) -> Point2 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();
        Point2::new(
            self.center.x + self.rx * cos_phi * cos_t - self.ry * sin_phi * sin_t,
            self.center.y + self.rx * sin_phi * cos_t + self.ry * cos_phi * sin_t,
        )
    }
}

/// Half chord rotated into the ellipse's frame (x1', y1')
fn rotated_half_chord(start: &Point2, end: &Point2, phi: f64) -> (f64, f64) {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let dx = (start.x - end.x) / 2.0;
    let dy = (start.y - end.y) / 2.0;
    (cos_phi * dx + sin_phi * dy, -sin_phi * dx + cos_phi * dy)
}

/// Signed angle from vector u to vector v
fn vector_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    (ux * vy - uy * vx).atan2(ux * vx + uy * vy)
}

/// Serialize segments back into path data using absolute commands
///
/// Re-parsing the result yields an equivalent segment list.
pub fn to_path_data(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if !out.is_empty() {
            out.push(' ');
        }
        // Writing into a String cannot fail
        let _ = match segment {
            PathSegment::MoveTo(p) => write!(out, "M{} {}", p.x, p.y),
            PathSegment::LineTo(p) => write!(out, "L{} {}", p.x, p.y),
            PathSegment::CubicBezier { c1, c2, p1, .. } => write!(
                out,
                "C{} {} {} {} {} {}",
                c1.x, c1.y, c2.x, c2.y, p1.x, p1.y
            ),
            PathSegment::QuadraticBezier { c, p1, .. } => {
                write!(out, "Q{} {} {} {}", c.x, c.y, p1.x, p1.y)
            }
            PathSegment::Arc(arc) => write!(
                out,
                "A{} {} {} {} {} {} {}",
                arc.rx,
                arc.ry,
                arc.x_axis_rotation,
                u8::from(arc.large_arc),
                u8::from(arc.sweep),
                arc.end.x,
                arc.end.y
            ),
            PathSegment::ClosePath => write!(out, "Z"),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_small_radii_are_scaled_to_span_chord() {
        let arc = ArcSegment::new(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            1.0,
            1.0,
            0.0,
            false,
            true,
        );
        assert!((arc.rx - 5.0).abs() < 1e-9);
        assert!((arc.ry - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_radii_use_absolute_value() {
        let arc = ArcSegment::new(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            -3.0,
            -4.0,
            0.0,
            false,
            false,
        );
        assert_eq!((arc.rx, arc.ry), (3.0, 4.0));
    }

    #[test]
    fn test_half_circle_center() {
        let arc = ArcSegment::new(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            5.0,
            5.0,
            0.0,
            false,
            true,
        );
        let c = arc.to_center();
        assert!((c.center.x - 5.0).abs() < 1e-9);
        assert!(c.center.y.abs() < 1e-9);
        assert!((c.sweep_angle.abs() - PI).abs() < 1e-9);
        let end = c.point_at(c.start_angle + c.sweep_angle);
        assert!((end.x - 10.0).abs() < 1e-9 && end.y.abs() < 1e-9);
    }

    #[test]
    fn test_sweep_flag_sets_direction() {
        let make = |sweep| {
            ArcSegment::new(
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 1.0),
                1.0,
                1.0,
                0.0,
                false,
                sweep,
            )
            .to_center()
        };
        assert!(make(true).sweep_angle > 0.0);
        assert!(make(false).sweep_angle < 0.0);
    }

    #[test]
    fn test_large_arc_sweeps_more_than_half() {
        let arc = ArcSegment::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            1.0,
            1.0,
            0.0,
            true,
            true,
        );
        assert!(arc.to_center().sweep_angle > PI);
    }

    #[test]
    fn test_to_path_data() {
        let segments = vec![
            PathSegment::MoveTo(Point2::new(0.0, 0.0)),
            PathSegment::LineTo(Point2::new(10.0, -2.5)),
            PathSegment::ClosePath,
        ];
        assert_eq!(to_path_data(&segments), "M0 0 L10 -2.5 Z");
    }

    #[test]
    fn test_end_point() {
        assert_eq!(PathSegment::ClosePath.end_point(), None);
        let q = PathSegment::QuadraticBezier {
            p0: Point2::new(0.0, 0.0),
            c: Point2::new(1.0, 1.0),
            p1: Point2::new(2.0, 0.0),
        };
        assert_eq!(q.end_point(), Some(Point2::new(2.0, 0.0)));
    }
}
