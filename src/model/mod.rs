//! Data structures for documents and scenes

// Declare all submodules
pub mod document;
pub mod geometry;
pub mod path;
pub mod scene;
pub mod style;

// Re-export all public types from document module
pub use document::{Descendants, Document, Element, ElementKind, Geometry, ViewBox};

// Re-export all public types from geometry module
pub use geometry::{Matrix3, Matrix4, Point2, Point3, Rgba, Vector2};

// Re-export all public types from path module
pub use path::{ArcCenter, ArcSegment, PathSegment, to_path_data};

// Re-export all public types from scene module
pub use scene::{
    Camera, Contour, GroupNode, Light, LightKind, Material, MaterialId, MaterialKey, MaterialRef,
    MaterialRole, Object3D, ObjectShape, Scene, Summary, TextBody,
};

// Re-export all public types from style module
pub use style::{ResolvedStyle, Style};
