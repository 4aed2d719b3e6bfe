//! Adapter seam between a [`Scene`] and a 3D authoring host
//!
//! The engine never links against a host runtime. A host implements
//! [`SceneHost`] and [`Scene::realize`] drives it: every material is
//! registered once, then objects are instantiated in scene order with the
//! handles of their materials.
//!
//! # Example
//!
//! ```
//! use svg3d::host::{MaterialSlots, SceneHost};
//! use svg3d::{Material, Object3D};
//!
//! #[derive(Default)]
//! struct Outline(Vec<String>);
//!
//! impl SceneHost for Outline {
//!     type Handle = usize;
//!     type MaterialHandle = String;
//!     type Error = std::convert::Infallible;
//!
//!     fn register_material(&mut self, material: &Material) -> Result<String, Self::Error> {
//!         Ok(material.name.clone())
//!     }
//!
//!     fn instantiate(
//!         &mut self,
//!         object: &Object3D,
//!         slots: MaterialSlots<String>,
//!     ) -> Result<usize, Self::Error> {
//!         self.0.push(format!("{} {:?}", object.name, slots.fill));
//!         Ok(self.0.len() - 1)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scene = svg3d::convert(r##"<svg><rect width="2" height="2" fill="#f00"/></svg>"##)?;
//! let mut host = Outline::default();
//! let realized = scene.realize(&mut host).unwrap();
//! assert_eq!(realized.objects, vec![0]);
//! assert_eq!(host.0[0], "Rect_1 Some(\"Fill_ff0000_100\")");
//! # Ok(())
//! # }
//! ```

use crate::model::scene::{Camera, Light, Material, MaterialRef, Object3D, Scene};
use tracing::debug;

/// Material handles for the two painted roles of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSlots<M> {
    /// Fill slot
    pub fill: Option<M>,
    /// Stroke slot
    pub stroke: Option<M>,
}

/// A 3D host that can realize scene objects
pub trait SceneHost {
    /// Host object handle
    type Handle;
    /// Host material handle
    type MaterialHandle: Clone;
    /// Host failure
    type Error;

    /// Create the host material for `material`
    fn register_material(&mut self, material: &Material) -> Result<Self::MaterialHandle, Self::Error>;

    /// Create the host object for `object`
    fn instantiate(
        &mut self,
        object: &Object3D,
        materials: MaterialSlots<Self::MaterialHandle>,
    ) -> Result<Self::Handle, Self::Error>;

    /// Place the camera and lights; does nothing unless overridden
    fn configure(&mut self, _camera: &Camera, _lights: &[Light]) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Handles produced by [`Scene::realize`]
pub struct Realized<H: SceneHost + ?Sized> {
    /// Object handles in scene order
    pub objects: Vec<H::Handle>,
    /// Material handles indexed by [`MaterialId`](crate::MaterialId)
    pub materials: Vec<H::MaterialHandle>,
}

impl Scene {
    /// Hand the scene to a host
    ///
    /// Stops at the first host error.
    pub fn realize<H: SceneHost>(&self, host: &mut H) -> Result<Realized<H>, H::Error> {
        let materials = self
            .materials
            .iter()
            .map(|material| host.register_material(material))
            .collect::<Result<Vec<_>, _>>()?;

        let slot = |material: &Option<MaterialRef>| {
            material
                .as_ref()
                .and_then(|m| materials.get(m.id.0))
                .cloned()
        };

        let mut objects = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let slots = MaterialSlots {
                fill: slot(&object.fill_material),
                stroke: slot(&object.stroke_material),
            };
            objects.push(host.instantiate(object, slots)?);
        }
        host.configure(&self.camera, &self.lights)?;

        debug!(
            objects = objects.len(),
            materials = materials.len(),
            "realized scene"
        );
        Ok(Realized { objects, materials })
    }
}
