//! Geometry primitives shared by every stage
//!
//! 2D affine transforms are homogeneous 3x3 matrices laid out the way SVG
//! writes them: `matrix(a,b,c,d,e,f)` is
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```

use serde::{Deserialize, Serialize};

/// A point in 2D user space
pub type Point2 = nalgebra::Point2<f64>;
/// A 2D displacement
pub type Vector2 = nalgebra::Vector2<f64>;
/// A point in 3D world space
pub type Point3 = nalgebra::Point3<f64>;
/// 2D affine transform in homogeneous form
pub type Matrix3 = nalgebra::Matrix3<f64>;
/// 3D affine transform in homogeneous form
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Tolerance used for coordinate comparisons and degeneracy checks
pub const EPSILON: f64 = 1e-9;

/// Translation by `(tx, ty)`
pub fn translation(tx: f64, ty: f64) -> Matrix3 {
    Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0)
}

/// Non-uniform scale about the origin
pub fn scaling(sx: f64, sy: f64) -> Matrix3 {
    Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0)
}

/// Rotation about the origin, angle in degrees (positive turns +x towards +y)
pub fn rotation(degrees: f64) -> Matrix3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0)
}

/// Horizontal skew, angle in degrees
pub fn skew_x(degrees: f64) -> Matrix3 {
    Matrix3::new(1.0, degrees.to_radians().tan(), 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
}

/// Vertical skew, angle in degrees
pub fn skew_y(degrees: f64) -> Matrix3 {
    Matrix3::new(1.0, 0.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0, 0.0, 1.0)
}

/// Matrix from the six SVG `matrix(a,b,c,d,e,f)` coefficients
pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Matrix3 {
    Matrix3::new(a, c, e, b, d, f, 0.0, 0.0, 1.0)
}

/// Lift a 2D affine transform into 3D, leaving Z untouched
pub fn embed(m: &Matrix3) -> Matrix4 {
    Matrix4::new(
        m[(0, 0)],
        m[(0, 1)],
        0.0,
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        0.0,
        m[(1, 2)],
        0.0,
        0.0,
        1.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
    )
}

/// Whether two points coincide within [`EPSILON`]
pub fn approx_eq(a: &Point2, b: &Point2) -> bool {
    (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}

/// RGBA color with every channel in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
    /// Alpha (final opacity)
    pub a: f64,
}

impl Rgba {
    /// Substitute for colors that cannot be read
    pub const DEFAULT_GRAY: Rgba = Rgba {
        r: 0.8,
        g: 0.8,
        b: 0.8,
        a: 1.0,
    };

    /// Opaque black, the SVG painting default for `fill`
    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Create a color, clamping every channel into `[0, 1]`
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
            a: clamp_unit(a),
        }
    }

    /// Opaque color from 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: 1.0,
        }
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: clamp_unit(a),
            ..self
        }
    }

    /// Color channels quantized to 8 bits
    pub fn to_rgb8(&self) -> [u8; 3] {
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// `#rrggbb` form of the color channels (alpha is not encoded)
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn quantize(v: f64) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}
