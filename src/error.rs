//! Error types for SVG-to-3D conversion
//!
//! Every failure carries a stable error code so hosts can filter and report
//! problems without matching on message text.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: Document markup errors (fatal, abort the conversion)
//! - **E2xxx**: Path data and transform syntax errors (element is skipped)
//! - **E3xxx**: Degenerate geometry (element is skipped)
//! - **E4xxx**: Paint and material problems (a default is substituted)
//! - **E5xxx**: Configuration errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: XML parsing error
//! - `E1004`: Missing `<svg>` root element
//! - `E1007`: DTD declaration rejected
//! - `E2001`: Invalid number in path data
//! - `E2002`: Unknown path command
//! - `E2006`: Invalid transform function
//! - `E2007`: Invalid attribute value
//! - `E3001`: Zero-area outline
//! - `E4001`: Unrecognized color

use crate::model::scene::MaterialRole;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for document-level operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Fatal errors raised while reading the root document
///
/// Only a document that cannot be read at all produces one of these. Problems
/// scoped to a single element are reported as [`Warning`]s instead.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// XML parsing error
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Mismatched closing tags
    #[error("[E1001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Duplicate attribute on one element
    /// - Unquoted attribute value
    #[error("[E1002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Markup is not valid UTF-8
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Invalid UTF-8 in markup: {0}")]
    InvalidUtf8(String),

    /// The document contains no `<svg>` element
    ///
    /// **Error Code**: E1004
    ///
    /// **Suggestions**:
    /// - Check that the input is an SVG document and not an HTML page
    #[error("[E1004] Missing root <svg> element")]
    MissingRoot,

    /// The first element of the document is not `<svg>`
    ///
    /// **Error Code**: E1005
    #[error("[E1005] Unexpected root element <{0}>, expected <svg>")]
    UnexpectedRoot(String),

    /// Unclosed or unbalanced elements at end of input
    ///
    /// **Error Code**: E1006
    ///
    /// **Common Causes**:
    /// - Truncated file
    /// - Missing `</g>` or `</svg>`
    #[error("[E1006] Unbalanced markup: {0}")]
    Unbalanced(String),

    /// DTD declarations are rejected so that entity expansion never happens
    ///
    /// **Error Code**: E1007
    ///
    /// **Suggestions**:
    /// - Remove the `<!DOCTYPE ...>` block; SVG does not need it
    #[error("[E1007] DTD declarations are not allowed in SVG input")]
    DtdNotAllowed,
}

impl From<quick_xml::events::attributes::AttrError> for DocumentError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocumentError::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl From<std::str::Utf8Error> for DocumentError {
    fn from(err: std::str::Utf8Error) -> Self {
        DocumentError::InvalidUtf8(err.to_string())
    }
}

impl DocumentError {
    /// Create an Unbalanced error naming the element left open
    ///
    /// # Example
    /// ```ignore
    /// DocumentError::unclosed("g")
    /// ```
    pub fn unclosed(element: &str) -> Self {
        DocumentError::Unbalanced(format!(
            "Element '<{}>' is never closed before end of input",
            element
        ))
    }
}

/// Syntax errors in path data, transform lists and numeric attributes
///
/// Positions are byte offsets into the attribute value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A token that should be a number is not one
    ///
    /// **Error Code**: E2001
    #[error("[E2001] Invalid number at byte {position}: '{token}'")]
    InvalidNumber {
        /// Byte offset of the token
        position: usize,
        /// Offending text
        token: String,
    },

    /// A letter that is not a path command
    ///
    /// **Error Code**: E2002
    #[error("[E2002] Unknown path command '{command}' at byte {position}")]
    UnknownCommand {
        /// Byte offset of the letter
        position: usize,
        /// The letter itself
        command: char,
    },

    /// A command ran out of arguments
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Truncated path data
    /// - A curve command with too few coordinates
    #[error("[E2003] Command '{command}' at byte {position} expects {expected} arguments")]
    MissingArgument {
        /// Byte offset where the next argument was expected
        position: usize,
        /// Command whose argument list is incomplete
        command: char,
        /// Size of one full argument group
        expected: usize,
    },

    /// Path data that does not begin with a moveto
    ///
    /// **Error Code**: E2004
    #[error("[E2004] Path data must begin with a moveto, found '{found}' at byte {position}")]
    MissingMoveTo {
        /// Byte offset of the offending token
        position: usize,
        /// Text that was found instead
        found: String,
    },

    /// Arc flags must be exactly `0` or `1`
    ///
    /// **Error Code**: E2005
    #[error("[E2005] Invalid arc flag at byte {position}: '{found}'")]
    InvalidFlag {
        /// Byte offset of the flag
        position: usize,
        /// Character found instead
        found: char,
    },

    /// A transform function that could not be applied
    ///
    /// **Error Code**: E2006
    #[error("[E2006] Invalid transform function: '{0}'")]
    InvalidTransform(String),

    /// A numeric attribute that could not be read
    ///
    /// **Error Code**: E2007
    #[error("[E2007] Invalid value for attribute '{attribute}': '{value}'")]
    InvalidAttribute {
        /// Attribute name
        attribute: String,
        /// Raw attribute value
        value: String,
    },
}

impl ParseError {
    /// Byte offset of the error inside its source string, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::InvalidNumber { position, .. }
            | ParseError::UnknownCommand { position, .. }
            | ParseError::MissingArgument { position, .. }
            | ParseError::MissingMoveTo { position, .. }
            | ParseError::InvalidFlag { position, .. } => Some(*position),
            ParseError::InvalidTransform(_) | ParseError::InvalidAttribute { .. } => None,
        }
    }

    /// Create an InvalidAttribute error
    pub fn invalid_attribute(attribute: &str, value: &str) -> Self {
        ParseError::InvalidAttribute {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

/// Degenerate geometry that cannot become a 3D object
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Closed outline used for fill encloses no area
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - `width` or `height` of zero
    /// - Polygon whose points are collinear
    #[error("[E3001] Outline encloses no area")]
    ZeroArea,

    /// Stroked outline has no length
    ///
    /// **Error Code**: E3002
    #[error("[E3002] Stroked outline has zero length")]
    ZeroLength,

    /// Circle or ellipse with a zero radius
    ///
    /// **Error Code**: E3003
    #[error("[E3003] Collapsed arc: radius {rx} x {ry}")]
    CollapsedArc {
        /// Horizontal radius
        rx: f64,
        /// Vertical radius
        ry: f64,
    },

    /// Element carries nothing to draw
    ///
    /// **Error Code**: E3004
    ///
    /// **Common Causes**:
    /// - Empty `d` attribute
    /// - `<text>` without content
    #[error("[E3004] Nothing to draw: {0}")]
    Empty(String),

    /// NaN or infinite coordinates after transformation
    ///
    /// **Error Code**: E3005
    #[error("[E3005] Non-finite coordinate in outline")]
    NonFinite,

    /// Cap triangulation failed
    ///
    /// **Error Code**: E3006
    #[error("[E3006] Triangulation failed: {0}")]
    Triangulation(String),
}

/// Paint problems; the conversion continues with a substitute
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialWarning {
    /// Color token that is neither `#rgb`, `#rrggbb` nor `none`
    ///
    /// **Error Code**: E4001
    ///
    /// **Suggestions**:
    /// - Named colors and `rgb()` are not supported; use hex notation
    #[error("[E4001] Unrecognized {role} color '{token}', using default gray")]
    UnknownColor {
        /// Raw paint token
        token: String,
        /// Role the token was given for
        role: MaterialRole,
    },

    /// Element resolves to neither a fill nor a stroke
    ///
    /// **Error Code**: E4002
    #[error("[E4002] Element has neither fill nor stroke")]
    NoPaint,
}

/// Invalid conversion settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A setting that must be a positive, finite number
    ///
    /// **Error Code**: E5001
    #[error("[E5001] {field} must be positive and finite, got {value}")]
    NonPositive {
        /// Setting name
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Minimum segment count above the maximum
    ///
    /// **Error Code**: E5002
    #[error("[E5002] Segment bounds are inverted: min {min} > max {max}")]
    InvertedSegmentBounds {
        /// Requested minimum
        min: usize,
        /// Requested maximum
        max: usize,
    },

    /// Minimum segment count of zero
    ///
    /// **Error Code**: E5003
    #[error("[E5003] Curves need at least one segment")]
    ZeroSegments,
}

/// Any error a conversion entry point can return
#[derive(Error, Debug)]
pub enum Error {
    /// The markup could not be read
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The configuration was rejected before conversion started
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Category of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WarningKind {
    /// Path data or numeric attribute syntax
    Parse,
    /// Skipped transform function
    Transform,
    /// Degenerate geometry
    Geometry,
    /// Paint or material substitution
    Material,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::Parse => "parse",
            WarningKind::Transform => "transform",
            WarningKind::Geometry => "geometry",
            WarningKind::Material => "material",
        };
        f.write_str(name)
    }
}

/// A recoverable problem recorded in the scene summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Stable error code such as `E2001`
    pub code: String,
    /// Problem category
    pub kind: WarningKind,
    /// Label of the element concerned (`rect[3]`, `path#logo`)
    pub element: Option<String>,
    /// Document-order index of the element concerned; `None` for the root
    pub index: Option<usize>,
    /// Human-readable message without the code prefix
    pub message: String,
}

impl Warning {
    /// Build a warning from any code-prefixed error
    pub fn new(kind: WarningKind, element: Option<&str>, err: &impl fmt::Display) -> Self {
        let text = err.to_string();
        let (code, message) = split_code(&text);
        Self {
            code: code.to_string(),
            kind,
            element: element.map(str::to_string),
            index: None,
            message: message.to_string(),
        }
    }

    /// Attach the document-order index of the element concerned
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Warning for a path or attribute syntax error
    pub fn parse(element: &str, err: &ParseError) -> Self {
        let kind = match err {
            ParseError::InvalidTransform(_) => WarningKind::Transform,
            _ => WarningKind::Parse,
        };
        Self::new(kind, Some(element), err)
    }

    /// Warning for degenerate geometry
    pub fn geometry(element: &str, err: &GeometryError) -> Self {
        Self::new(WarningKind::Geometry, Some(element), err)
    }

    /// Warning for a paint substitution
    pub fn material(element: &str, warning: &MaterialWarning) -> Self {
        Self::new(WarningKind::Material, Some(element), warning)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "[{}] {}: {}", self.code, element, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Split `"[E2001] message"` into `("E2001", "message")`
fn split_code(text: &str) -> (&str, &str) {
    text.strip_prefix('[')
        .and_then(|rest| rest.split_once("] "))
        .unwrap_or(("E0000", text))
}
