//! Transform list (`transform` attribute) resolver

use super::number::number_list;
use crate::error::ParseError;
use crate::model::geometry::{
    Matrix3, from_coefficients, rotation, scaling, skew_x, skew_y, translation,
};
use tracing::debug;

/// A parsed transform list
#[derive(Debug, Clone, PartialEq)]
pub struct TransformList {
    /// Product of every function that could be applied, in written order
    pub matrix: Matrix3,
    /// Functions that were skipped
    pub skipped: Vec<ParseError>,
}

/// Parse a transform list into one matrix, skipping functions it cannot read
///
/// # Example
///
/// ```
/// use svg3d::parser::parse_transform;
/// use svg3d::model::Point2;
///
/// let m = parse_transform("translate(10,0) rotate(90)");
/// let p = m.transform_point(&Point2::new(1.0, 0.0));
/// assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
/// ```
pub fn parse_transform(s: &str) -> Matrix3 {
    parse_transform_list(s).matrix
}

/// Parse a transform list, reporting every skipped function
pub fn parse_transform_list(s: &str) -> TransformList {
    let mut matrix = Matrix3::identity();
    let mut skipped = Vec::new();
    let mut rest = s;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        // One function runs up to and including its closing parenthesis
        let (function, remainder) = match rest.find(')') {
            Some(end) => rest.split_at(end + 1),
            None => (rest, ""),
        };
        rest = remainder;

        match parse_function(function) {
            Ok(m) => matrix *= m,
            Err(err) => {
                debug!(function = function.trim(), "skipping transform function");
                skipped.push(err);
            }
        }
    }

    TransformList { matrix, skipped }
}

fn parse_function(function: &str) -> Result<Matrix3, ParseError> {
    let invalid = || ParseError::InvalidTransform(function.trim().to_string());

    let (name, args) = function.split_once('(').ok_or_else(invalid)?;
    let args = args.strip_suffix(')').ok_or_else(invalid)?;
    let (values, err) = number_list(args);
    if err.is_some() {
        return Err(invalid());
    }

    let m = match (name.trim(), values.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => from_coefficients(a, b, c, d, e, f),
        ("translate", &[tx]) => translation(tx, 0.0),
        ("translate", &[tx, ty]) => translation(tx, ty),
        ("scale", &[s]) => scaling(s, s),
        ("scale", &[sx, sy]) => scaling(sx, sy),
        ("rotate", &[angle]) => rotation(angle),
        ("rotate", &[angle, cx, cy]) => {
            translation(cx, cy) * rotation(angle) * translation(-cx, -cy)
        }
        ("skewX", &[angle]) => skew_x(angle),
        ("skewY", &[angle]) => skew_y(angle),
        _ => return Err(invalid()),
    };
    Ok(m)
}
