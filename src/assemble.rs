//! Scene assembly: naming, hierarchy and world placement

use crate::config::ConvertConfig;
use crate::converter::{GroupBuilder, SceneSetup, TreeWalker};
use crate::error::Warning;
use crate::model::document::Document;
use crate::model::geometry::{EPSILON, Matrix4, Point3, embed};
use crate::model::scene::{
    Camera, GroupNode, Light, LightKind, Material, MaterialId, MaterialKey, MaterialRef, Object3D,
    Scene, Summary,
};
use nalgebra::Vector3;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Hands out collision-free names for one run
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl NameRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Next numbered name for `base`: `Rect_1`, `Rect_2`, ...
    pub fn claim_numbered(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let name = format!("{}_{}", base, counter);
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }

    /// `name` itself, or `name_2`, `name_3`, ... once it is taken
    pub fn claim(&mut self, name: &str) -> String {
        if self.used.insert(name.to_string()) {
            return name.to_string();
        }
        let mut n = 1;
        loop {
            n += 1;
            let candidate = format!("{}_{}", name, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Default camera and lighting: an orthographic camera straight above the
/// world origin and a single sun
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSceneSetup;

impl DefaultSceneSetup {
    /// Camera height above the document plane
    fn distance(document: &Document, scale: f64) -> f64 {
        (document.width.max(document.height) * scale).max(EPSILON) * 2.0
    }
}

impl SceneSetup for DefaultSceneSetup {
    fn world_mapping(&self, document: &Document, scale: f64) -> Matrix4 {
        let flip = Matrix4::new_nonuniform_scaling(&Vector3::new(scale, -scale, 1.0));
        let center = Matrix4::new_translation(&Vector3::new(
            -document.width / 2.0,
            -document.height / 2.0,
            0.0,
        ));
        flip * center * embed(&document.viewport_transform())
    }

    fn camera(&self, document: &Document, scale: f64) -> Camera {
        let distance = Self::distance(document, scale);
        Camera {
            location: Point3::new(0.0, 0.0, distance),
            target: Point3::origin(),
            // A little margin around the document
            ortho_scale: document.width.max(document.height) * scale * 1.1,
            clip_end: distance * 10.0,
        }
    }

    fn lights(&self, document: &Document, scale: f64) -> Vec<Light> {
        vec![Light {
            kind: LightKind::Sun,
            location: Point3::new(0.0, 0.0, Self::distance(document, scale)),
            energy: 3.0,
        }]
    }
}

/// Final sequential pass of a conversion
pub struct SceneAssembler<'a> {
    scale: f64,
    setup: &'a dyn SceneSetup,
    groups: &'a dyn GroupBuilder,
}

impl<'a> SceneAssembler<'a> {
    /// Create an assembler for world scale `scale`
    pub fn new(scale: f64, setup: &'a dyn SceneSetup, groups: &'a dyn GroupBuilder) -> Self {
        Self {
            scale,
            setup,
            groups,
        }
    }

    /// Compose built objects into a scene
    ///
    /// `objects` must be in document order. `warnings` are merged with the
    /// document's own diagnostics by element index; warnings of one element
    /// keep parse diagnostics first.
    pub fn assemble(
        &self,
        mut objects: Vec<Object3D>,
        document: &Document,
        warnings: Vec<Warning>,
    ) -> Scene {
        let mapping = self.setup.world_mapping(document, self.scale);
        let mut names = NameRegistry::new();
        let mut group_names: HashMap<usize, String> = HashMap::new();
        let mut groups = Vec::new();
        let mut parents: HashMap<usize, Option<usize>> = HashMap::new();

        let positions: HashMap<usize, usize> = objects
            .iter()
            .enumerate()
            .map(|(pos, object)| (object.source_index, pos))
            .collect();

        // Groups and objects share one namespace, claimed in document order
        for item in self.groups.work_list(document) {
            let element = item.element;
            parents.insert(element.index, item.parent);
            if element.is_group() {
                let name = match element.id.as_deref() {
                    Some(id) => names.claim(id),
                    None => names.claim_numbered(element.kind().name()),
                };
                groups.push(GroupNode {
                    name: name.clone(),
                    parent: item.parent.and_then(|p| group_names.get(&p).cloned()),
                    source_index: element.index,
                    world_transform: mapping * embed(&element.resolved_transform),
                });
                group_names.insert(element.index, name);
            } else if let Some(&pos) = positions.get(&element.index) {
                let object = &mut objects[pos];
                object.name = match object.source_id.as_deref() {
                    Some(id) => names.claim(id),
                    None => names.claim_numbered(object.kind.name()),
                };
            }
        }

        for object in &mut objects {
            object.world_transform = mapping * object.world_transform;
            object.parent = parents
                .get(&object.source_index)
                .copied()
                .flatten()
                .and_then(|p| group_names.get(&p).cloned());
        }

        let materials = renumber_materials(&mut objects);
        let elements_total = document.elements_seen;
        let objects_created = objects.len();
        let mut all_warnings = document.diagnostics.clone();
        all_warnings.extend(warnings);
        // Stable; root diagnostics (no index) sort first
        all_warnings.sort_by_key(|warning| warning.index);

        debug!(
            objects = objects_created,
            groups = groups.len(),
            materials = materials.len(),
            warnings = all_warnings.len(),
            "assembled scene"
        );

        Scene {
            objects,
            materials,
            groups,
            camera: self.setup.camera(document, self.scale),
            lights: self.setup.lights(document, self.scale),
            summary: Summary {
                elements_total,
                objects_created,
                elements_skipped: elements_total.saturating_sub(objects_created),
                warnings: all_warnings,
            },
            scale: self.scale,
        }
    }
}

/// Build the material table in first-use order and point every object at it
///
/// Materials from a conversion run already carry first-use ids and are
/// reused as they are. Others get a renumbered copy; objects that shared an
/// `Arc` before still share one afterwards.
fn renumber_materials(objects: &mut [Object3D]) -> Vec<MaterialRef> {
    let mut table: Vec<MaterialRef> = Vec::new();
    let mut by_key: HashMap<MaterialKey, MaterialRef> = HashMap::new();

    for object in objects.iter_mut() {
        for slot in [&mut object.fill_material, &mut object.stroke_material] {
            let Some(material) = slot.as_ref() else {
                continue;
            };
            let shared = match by_key.get(&material.key) {
                Some(existing) => Arc::clone(existing),
                None => {
                    let id = MaterialId(table.len());
                    let entry = if material.id == id {
                        Arc::clone(material)
                    } else {
                        Arc::new(Material {
                            id,
                            ..Material::clone(material)
                        })
                    };
                    table.push(Arc::clone(&entry));
                    by_key.insert(entry.key.clone(), Arc::clone(&entry));
                    entry
                }
            };
            *slot = Some(shared);
        }
    }
    table
}

/// Assemble objects built for `document` with the default world scale,
/// camera and lights
pub fn assemble(objects: Vec<Object3D>, document: &Document) -> Scene {
    let scale = ConvertConfig::default().world_scale(document.width, document.height);
    SceneAssembler::new(scale, &DefaultSceneSetup, &TreeWalker).assemble(
        objects,
        document,
        Vec::new(),
    )
}
