//! Conversion pipeline
//!
//! A conversion runs in three passes over the document:
//!
//! 1. Inherited styles are resolved into concrete paint and paint warnings.
//! 2. Outlines are flattened, on the rayon pool when
//!    [`ConvertConfig::parallel`] is set and the `parallel` feature is on.
//! 3. Sequentially and in document order, materials are attached to the
//!    profiles that survived, so material ids follow first use. The
//!    [`SceneAssembler`] then names objects and groups and maps them into
//!    world space.
//!
//! Each pass talks to its collaborator through a capability trait, so a host
//! can swap any of them out.

use crate::assemble::{DefaultSceneSetup, SceneAssembler};
use crate::config::ConvertConfig;
use crate::error::{ConfigError, DocumentError, Error, GeometryError, MaterialWarning, Warning};
use crate::extrude::Extruder;
use crate::material::{MaterialResolver, ResolvedMaterials};
use crate::model::document::{Document, Element};
use crate::model::geometry::Matrix4;
use crate::model::scene::{Camera, Contour, Light, Scene};
use crate::model::style::ResolvedStyle;
use crate::tessellate::Tessellator;
use tracing::{debug, info_span, warn};

/// Turns an element's geometry into flattened contours
pub trait PathBuilder {
    /// Outline of `element` in its own user space
    ///
    /// Text and group elements have no outline and yield an empty list.
    fn outline(&self, element: &Element) -> Result<Vec<Contour>, GeometryError>;
}

/// Turns concrete paint into shared materials
pub trait MaterialApplier {
    /// Materials for the painted roles of `style`
    fn apply(&self, style: &ResolvedStyle) -> ResolvedMaterials;
}

/// One element scheduled for conversion
#[derive(Debug, Clone, Copy)]
pub struct WorkItem<'a> {
    /// The element
    pub element: &'a Element,
    /// Document-order index of the enclosing group, if any
    pub parent: Option<usize>,
}

/// Flattens the document tree into an ordered work list
pub trait GroupBuilder {
    /// Every element in document order with its enclosing group
    fn work_list<'a>(&self, document: &'a Document) -> Vec<WorkItem<'a>>;

    /// Leaf elements only
    fn shapes<'a>(&self, document: &'a Document) -> Vec<WorkItem<'a>> {
        self.work_list(document)
            .into_iter()
            .filter(|item| !item.element.is_group())
            .collect()
    }

    /// Group elements only
    fn groups<'a>(&self, document: &'a Document) -> Vec<WorkItem<'a>> {
        self.work_list(document)
            .into_iter()
            .filter(|item| item.element.is_group())
            .collect()
    }
}

/// Pre-order walk of the `<g>` hierarchy
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker;

impl GroupBuilder for TreeWalker {
    fn work_list<'a>(&self, document: &'a Document) -> Vec<WorkItem<'a>> {
        let mut items = Vec::new();
        let mut stack: Vec<WorkItem<'a>> = document
            .elements
            .iter()
            .rev()
            .map(|element| WorkItem {
                element,
                parent: None,
            })
            .collect();
        while let Some(item) = stack.pop() {
            stack.extend(item.element.children.iter().rev().map(|child| WorkItem {
                element: child,
                parent: Some(item.element.index),
            }));
            items.push(item);
        }
        items
    }
}

/// World placement and scene furniture
pub trait SceneSetup {
    /// World units per user unit
    fn world_scale(&self, config: &ConvertConfig, document: &Document) -> f64 {
        config.world_scale(document.width, document.height)
    }

    /// Transform from user space into world space
    fn world_mapping(&self, document: &Document, scale: f64) -> Matrix4;

    /// Camera framing the document
    fn camera(&self, document: &Document, scale: f64) -> Camera;

    /// Lights for the scene
    fn lights(&self, document: &Document, scale: f64) -> Vec<Light>;
}

/// State of one conversion run, dropped when the run ends
pub struct ConversionContext<'a> {
    /// Settings for this run
    pub config: &'a ConvertConfig,
    /// World units per user unit
    pub scale: f64,
    /// Material cache for this run
    pub materials: MaterialResolver,
}

impl<'a> ConversionContext<'a> {
    /// Fresh context for converting `document`
    pub fn new(config: &'a ConvertConfig, setup: &dyn SceneSetup, document: &Document) -> Self {
        Self {
            config,
            scale: setup.world_scale(config, document),
            materials: MaterialResolver::new(),
        }
    }
}

/// A painted leaf element waiting for its profile
struct Job<'a> {
    item: WorkItem<'a>,
    label: String,
    style: ResolvedStyle,
}

/// Converts parsed documents into scenes
///
/// # Example
///
/// ```
/// use svg3d::{ConvertConfig, Converter, Document};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::new(ConvertConfig::new().with_extrude_depth(0.5))?;
/// let doc = Document::parse(r##"<svg><circle r="5" fill="#00f"/></svg>"##)?;
/// let scene = converter.convert_document(&doc);
/// assert_eq!(scene.objects[0].name, "Circle_1");
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    config: ConvertConfig,
    tessellator: Tessellator,
    walker: TreeWalker,
    setup: DefaultSceneSetup,
}

impl Default for Converter {
    fn default() -> Self {
        Self::from_valid(ConvertConfig::default())
    }
}

impl Converter {
    /// Create a converter, rejecting unusable settings
    pub fn new(config: ConvertConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ConvertConfig) -> Self {
        Self {
            tessellator: Tessellator::new(config.flatten_options()),
            walker: TreeWalker,
            setup: DefaultSceneSetup,
            config,
        }
    }

    /// Settings in use
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert a parsed document
    ///
    /// Never fails: problems with individual elements are recorded in the
    /// scene summary and the element is skipped.
    pub fn convert_document(&self, document: &Document) -> Scene {
        let _span = info_span!("convert", elements = document.elements_seen).entered();
        let context = ConversionContext::new(&self.config, &self.setup, document);
        let mut warnings = Vec::new();

        let jobs = self.resolve_paint(document, &mut warnings);
        debug!(jobs = jobs.len(), "resolved paint");

        let extruder = Extruder::new(&self.tessellator, self.config.extrude_depth, context.scale);
        let profiles = build_jobs(&jobs, self.config.parallel, |job| {
            extruder.profile(job.item.element)
        });

        let mut objects = Vec::with_capacity(jobs.len());
        for (job, profile) in jobs.iter().zip(profiles) {
            let element = job.item.element;
            let built = profile.and_then(|profile| {
                let painted = extruder.painted(element, &profile, &job.style)?;
                let materials = context.materials.apply(&painted);
                Ok(extruder.finish(element, profile, &painted, materials))
            });
            match built {
                Ok(Some(object)) => objects.push(object),
                Ok(None) => {}
                Err(err) => {
                    warn!(element = %job.label, code = "geometry", "{}", err);
                    warnings.push(Warning::geometry(&job.label, &err).at(element.index));
                }
            }
        }
        debug!(
            objects = objects.len(),
            materials = context.materials.len(),
            "built objects"
        );

        SceneAssembler::new(context.scale, &self.setup, &self.walker).assemble(
            objects,
            document,
            warnings,
        )
    }

    fn resolve_paint<'d>(
        &self,
        document: &'d Document,
        warnings: &mut Vec<Warning>,
    ) -> Vec<Job<'d>> {
        let default_fill = self.config.default_fill.as_deref();
        let mut jobs = Vec::new();
        for item in self.walker.shapes(document) {
            let element = item.element;
            let label = element.label();
            let (style, paint_warnings) = element.style.resolve(default_fill);
            for warning in &paint_warnings {
                warn!(element = %label, code = "material", "{}", warning);
                warnings.push(Warning::material(&label, warning).at(element.index));
            }
            if style.fill.is_none() && style.stroke.is_none() {
                debug!(element = %label, kind = %element.kind(), "no fill or stroke, skipping");
                warnings
                    .push(Warning::material(&label, &MaterialWarning::NoPaint).at(element.index));
                continue;
            }
            jobs.push(Job { item, label, style });
        }
        jobs
    }
}

/// Parse and convert markup with the default settings
///
/// Only malformed markup is an error; everything else ends up in
/// [`Summary::warnings`](crate::Summary::warnings).
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let scene = svg3d::convert(r##"<svg><rect width="10" height="10" fill="#ff0000"/></svg>"##)?;
/// assert_eq!(scene.objects.len(), 1);
/// assert_eq!(scene.materials[0].name, "Fill_ff0000_100");
/// # Ok(())
/// # }
/// ```
pub fn convert(markup: &str) -> Result<Scene, DocumentError> {
    let document = Document::parse(markup)?;
    Ok(Converter::default().convert_document(&document))
}

/// Parse and convert markup with custom settings
pub fn convert_with_config(markup: &str, config: &ConvertConfig) -> Result<Scene, Error> {
    let converter = Converter::new(config.clone())?;
    let document = Document::parse(markup)?;
    Ok(converter.convert_document(&document))
}

#[cfg(feature = "parallel")]
fn build_jobs<R, F>(jobs: &[Job<'_>], parallel: bool, build: F) -> Vec<R>
where
    R: Send,
    F: Fn(&Job<'_>) -> R + Sync + Send,
{
    use rayon::prelude::*;

    if parallel {
        jobs.par_iter().map(build).collect()
    } else {
        jobs.iter().map(build).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn build_jobs<R, F>(jobs: &[Job<'_>], parallel: bool, build: F) -> Vec<R>
where
    F: Fn(&Job<'_>) -> R,
{
    if parallel {
        debug!("built without the `parallel` feature, building sequentially");
    }
    jobs.iter().map(build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scene::ObjectShape;
    use std::sync::Arc;

    const NESTED: &str = r##"<svg width="100" height="100">
        <g id="outer" fill="#0000ff">
            <rect width="10" height="10"/>
            <g transform="translate(5,5)">
                <circle r="3"/>
            </g>
        </g>
        <path d="M0 0 L10 10" stroke="#000"/>
    </svg>"##;

    #[test]
    fn test_work_list_is_preorder_with_parents() {
        let doc = Document::parse(NESTED).unwrap();
        let items = TreeWalker.work_list(&doc);
        let kinds: Vec<_> = items.iter().map(|i| i.element.kind().tag()).collect();
        assert_eq!(kinds, ["g", "rect", "g", "circle", "path"]);
        assert_eq!(items[0].parent, None);
        assert_eq!(items[1].parent, Some(items[0].element.index));
        assert_eq!(items[3].parent, Some(items[2].element.index));
        assert_eq!(TreeWalker.shapes(&doc).len(), 3);
        assert_eq!(TreeWalker.groups(&doc).len(), 2);
    }

    #[test]
    fn test_convert_nested_document() {
        let scene = convert(NESTED).unwrap();
        let names: Vec<_> = scene.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Rect_1", "Circle_1", "Path_1"]);
        assert_eq!(scene.objects[0].parent.as_deref(), Some("outer"));
        assert_eq!(scene.objects[1].parent.as_deref(), Some("Group_1"));
        assert_eq!(scene.objects[2].parent, None);
        assert_eq!(scene.objects[2].shape, ObjectShape::Shell);

        let fill_a = scene.objects[0].fill_material.as_ref().unwrap();
        let fill_b = scene.objects[1].fill_material.as_ref().unwrap();
        assert!(Arc::ptr_eq(fill_a, fill_b));
        assert_eq!(scene.materials.len(), 2);
    }

    #[test]
    fn test_unpainted_element_is_skipped_with_warning() {
        let scene = convert(r#"<svg><rect width="5" height="5"/></svg>"#).unwrap();
        assert!(scene.objects.is_empty());
        assert_eq!(scene.summary.elements_skipped, 1);
        assert_eq!(scene.summary.warnings[0].code, "E4002");
    }

    #[test]
    fn test_default_fill_paints_unfilled_elements() {
        let config = ConvertConfig::new().with_default_fill("#000000");
        let scene = convert_with_config(r#"<svg><rect width="5" height="5"/></svg>"#, &config)
            .unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.materials[0].name, "Fill_000000_100");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ConvertConfig::new().with_extrude_depth(-1.0);
        assert!(matches!(
            convert_with_config("<svg/>", &config),
            Err(Error::Config(ConfigError::NonPositive { .. }))
        ));
        assert!(Converter::new(config).is_err());
    }

    #[test]
    fn test_warnings_follow_document_order() {
        let scene = convert(
            r##"<svg>
                <line x1="1" y1="1" x2="1" y2="1" stroke="#000"/>
                <rect width="5" height="5" fill="teal"/>
            </svg>"##,
        )
        .unwrap();
        let codes: Vec<_> = scene.summary.warnings.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, ["E3002", "E4001"]);
        assert_eq!(scene.summary.objects_created, 1);
    }
}
