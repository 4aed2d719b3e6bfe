//! Paint parsing and the shared material cache
//!
//! Every distinct (role, color, opacity) combination becomes exactly one
//! [`Material`] per conversion run. Objects hold `Arc` handles to the cached
//! entry, so identical paints are shared by reference.

use crate::converter::MaterialApplier;
use crate::error::MaterialWarning;
use crate::model::geometry::Rgba;
use crate::model::scene::{Material, MaterialId, MaterialKey, MaterialRef, MaterialRole};
use crate::model::style::ResolvedStyle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// A readable paint token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    /// `none`: the role is not painted
    None,
    /// A solid color
    Color(Rgba),
}

/// Parse a paint token (`#rgb`, `#rrggbb` or `none`)
///
/// Anything else is reported as a [`MaterialWarning`]; callers substitute
/// [`Rgba::DEFAULT_GRAY`].
pub fn parse_paint(token: &str, role: MaterialRole) -> Result<Paint, MaterialWarning> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("none") {
        return Ok(Paint::None);
    }
    hex_to_rgba(token)
        .map(Paint::Color)
        .ok_or_else(|| MaterialWarning::UnknownColor {
            token: token.to_string(),
            role,
        })
}

/// Parse `#rgb` or `#rrggbb` into an opaque color
///
/// # Example
///
/// ```
/// use svg3d::material::hex_to_rgba;
///
/// let red = hex_to_rgba("#f00").unwrap();
/// assert_eq!(red.to_hex(), "#ff0000");
/// assert!(hex_to_rgba("red").is_none());
/// ```
pub fn hex_to_rgba(hex: &str) -> Option<Rgba> {
    let digits = hex.trim().strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            // #rgb expands each digit: f -> ff
            let r = channel(&digits[0..1])? * 17;
            let g = channel(&digits[1..2])? * 17;
            let b = channel(&digits[2..3])? * 17;
            Some(Rgba::from_rgb8(r, g, b))
        }
        6 => {
            let r = channel(&digits[0..2])?;
            let g = channel(&digits[2..4])?;
            let b = channel(&digits[4..6])?;
            Some(Rgba::from_rgb8(r, g, b))
        }
        _ => None,
    }
}

/// Materials assigned to one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMaterials {
    /// Fill material, absent when the element is not filled
    pub fill: Option<MaterialRef>,
    /// Stroke material, absent when the element is not stroked
    pub stroke: Option<MaterialRef>,
}

impl ResolvedMaterials {
    /// Whether neither role is painted
    pub fn is_empty(&self) -> bool {
        self.fill.is_none() && self.stroke.is_none()
    }
}

#[derive(Default)]
struct MaterialCache {
    by_key: HashMap<MaterialKey, MaterialRef>,
    ordered: Vec<MaterialRef>,
}

/// Per-run material cache
///
/// Safe to share between worker threads; lookups and insertions go through
/// one mutex.
#[derive(Default)]
pub struct MaterialResolver {
    cache: Mutex<MaterialCache>,
}

impl MaterialResolver {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared material for a role painted with `rgba`
    pub fn material(&self, role: MaterialRole, rgba: &Rgba) -> MaterialRef {
        let key = MaterialKey::new(role, rgba);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = cache.by_key.get(&key) {
            return Arc::clone(existing);
        }

        let [r, g, b] = rgba.to_rgb8();
        let material = Arc::new(Material {
            id: MaterialId(cache.ordered.len()),
            rgba: Rgba::from_rgb8(r, g, b).with_alpha(f64::from(key.opacity) / 100.0),
            name: key.name(),
            key: key.clone(),
        });
        trace!(name = %material.name, id = material.id.0, "created material");
        cache.ordered.push(Arc::clone(&material));
        cache.by_key.insert(key, Arc::clone(&material));
        material
    }

    /// Materials for the painted roles of a resolved style
    pub fn resolve(&self, style: &ResolvedStyle) -> ResolvedMaterials {
        ResolvedMaterials {
            fill: style.fill.map(|c| self.material(MaterialRole::Fill, &c)),
            stroke: style.stroke.map(|c| self.material(MaterialRole::Stroke, &c)),
        }
    }

    /// Every material created so far, in id order
    pub fn materials(&self) -> Vec<MaterialRef> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .clone()
    }

    /// Number of distinct materials
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .len()
    }

    /// Whether no material has been created
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MaterialApplier for MaterialResolver {
    fn apply(&self, style: &ResolvedStyle) -> ResolvedMaterials {
        self.resolve(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(hex_to_rgba("#ff0000"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(hex_to_rgba("#0F0"), Some(Rgba::new(0.0, 1.0, 0.0, 1.0)));
        assert_eq!(hex_to_rgba(" #000000 "), Some(Rgba::BLACK));
        assert_eq!(hex_to_rgba("ff0000"), None);
        assert_eq!(hex_to_rgba("#ff00"), None);
        assert_eq!(hex_to_rgba("#+f0"), None);
        assert_eq!(hex_to_rgba("#gg0000"), None);
    }

    #[test]
    fn test_parse_paint() {
        assert_eq!(parse_paint("none", MaterialRole::Fill), Ok(Paint::None));
        assert_eq!(parse_paint(" NONE ", MaterialRole::Fill), Ok(Paint::None));
        assert_eq!(
            parse_paint("#00f", MaterialRole::Stroke),
            Ok(Paint::Color(Rgba::new(0.0, 0.0, 1.0, 1.0)))
        );
        let err = parse_paint("url(#grad)", MaterialRole::Fill).unwrap_err();
        assert!(err.to_string().contains("[E4001]"));
        assert!(err.to_string().contains("fill"));
    }

    #[test]
    fn test_identical_keys_share_material() {
        let resolver = MaterialResolver::new();
        let a = resolver.material(MaterialRole::Fill, &Rgba::new(0.0, 0.0, 1.0, 1.0));
        let b = resolver.material(MaterialRole::Fill, &Rgba::new(0.0, 0.0, 1.0, 0.999));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_role_and_opacity_split_materials() {
        let resolver = MaterialResolver::new();
        let blue = Rgba::new(0.0, 0.0, 1.0, 1.0);
        let fill = resolver.material(MaterialRole::Fill, &blue);
        let stroke = resolver.material(MaterialRole::Stroke, &blue);
        let faded = resolver.material(MaterialRole::Fill, &blue.with_alpha(0.5));
        assert_eq!(fill.id, MaterialId(0));
        assert_eq!(stroke.id, MaterialId(1));
        assert_eq!(faded.id, MaterialId(2));
        assert_eq!(faded.name, "Fill_0000ff_50");
        assert_eq!(resolver.materials().len(), 3);
    }

    #[test]
    fn test_resolve_absent_roles() {
        let resolver = MaterialResolver::new();
        let style = ResolvedStyle {
            fill: None,
            stroke: Some(Rgba::BLACK),
            stroke_width: 2.0,
        };
        let materials = resolver.resolve(&style);
        assert!(materials.fill.is_none());
        assert_eq!(materials.stroke.as_ref().map(|m| m.role()), Some(MaterialRole::Stroke));
        assert!(!materials.is_empty());
    }

    #[test]
    fn test_cache_is_shared_across_threads() {
        let resolver = MaterialResolver::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| resolver.material(MaterialRole::Fill, &Rgba::BLACK));
            }
        });
        assert_eq!(resolver.len(), 1);
    }
}
