//! # svg3d
//!
//! A pure Rust engine that turns 2D SVG drawings into 3D scene descriptions.
//!
//! The engine parses a subset of SVG (shapes, paths, text and nested groups),
//! resolves inherited styles into de-duplicated materials, flattens every
//! outline into polylines and describes each element as an extrudable
//! [`Object3D`]. The resulting [`Scene`] is host-agnostic: a 3D authoring
//! tool realizes it through the [`host::SceneHost`] trait or consumes it as
//! JSON.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Full SVG path mini-language, including elliptical arcs
//! - Transform lists composed through nested groups
//! - Fill, stroke and opacity resolved into shared materials
//! - Recoverable problems reported as coded warnings instead of failures
//! - Optional parallel tessellation (`parallel` feature)
//! - Optional triangle meshes for extruded objects (`mesh-ops` feature)
//!
//! ## Example
//!
//! ```
//! use svg3d::{ConvertConfig, ObjectShape};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let markup = r##"<svg width="100" height="100">
//!     <rect x="10" y="10" width="30" height="30" fill="#ff0000"/>
//!     <circle cx="70" cy="70" r="20" fill="none" stroke="#00ff00" stroke-width="2"/>
//! </svg>"##;
//!
//! let config = ConvertConfig::new().with_extrude_depth(0.2);
//! let scene = svg3d::convert_with_config(markup, &config)?;
//!
//! assert_eq!(scene.objects.len(), 2);
//! assert_eq!(scene.objects[0].name, "Rect_1");
//! assert_eq!(scene.objects[1].shape, ObjectShape::Shell);
//! println!("{} materials", scene.materials.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assemble;
pub mod config;
pub mod converter;
pub mod error;
pub mod extrude;
pub mod host;
pub mod material;
#[cfg(feature = "mesh-ops")]
pub mod mesh_ops;
pub mod model;
pub mod parser;
pub mod tessellate;

pub use assemble::{NameRegistry, SceneAssembler, assemble};
pub use config::ConvertConfig;
pub use converter::{Converter, convert, convert_with_config};
pub use error::{
    ConfigError, DocumentError, Error, GeometryError, MaterialWarning, ParseError, Result, Warning,
    WarningKind,
};
pub use material::{MaterialResolver, ResolvedMaterials, hex_to_rgba};
#[cfg(feature = "mesh-ops")]
pub use mesh_ops::Mesh;
pub use model::{
    Camera, Contour, Document, Element, ElementKind, Geometry, GroupNode, Light, LightKind,
    Material, MaterialId, MaterialKey, MaterialRef, MaterialRole, Matrix3, Matrix4, Object3D,
    ObjectShape, PathSegment, Point2, Point3, Rgba, Scene, Style, Summary, TextBody,
};
pub use parser::{parse, parse_path, parse_transform};
pub use tessellate::FlattenOptions;
