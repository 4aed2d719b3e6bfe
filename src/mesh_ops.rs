//! Triangle meshes for extruded objects
//!
//! Hosts that want ready-made triangles instead of outlines can call
//! [`Object3D::to_mesh`]. Filled regions become closed prisms: a cap at
//! `z = 0`, a cap at `z = extrude_depth` and side walls. Holes are found by
//! containment parity, so a contour inside an odd number of others is cut
//! out of its innermost container.
//!
//! Caps are triangulated with `earcutr`, a port of MapBox's earcut.

use crate::error::GeometryError;
use crate::model::geometry::{Matrix4, Point2, Point3};
use crate::model::scene::{Contour, Object3D, ObjectShape};
use serde::Serialize;

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<Point3>,
    /// Counter-clockwise triangles (seen from outside) as vertex indices
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Signed volume by the divergence theorem
    ///
    /// Positive for a closed mesh whose triangles face outwards. Meaningless
    /// for open shells.
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (v1, v2, v3) = (&self.vertices[a], &self.vertices[b], &self.vertices[c]);
                v1.coords.dot(&v2.coords.cross(&v3.coords))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Point3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Point3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }

    /// Copy of the mesh with `transform` applied
    ///
    /// Mirroring transforms reverse every triangle so faces keep pointing
    /// outwards.
    pub fn transformed(&self, transform: &Matrix4) -> Mesh {
        let mirrored = transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
        Mesh {
            vertices: self
                .vertices
                .iter()
                .map(|v| transform.transform_point(v))
                .collect(),
            triangles: self
                .triangles
                .iter()
                .map(|&[a, b, c]| if mirrored { [a, c, b] } else { [a, b, c] })
                .collect(),
        }
    }

    fn push_vertex(&mut self, p: &Point2, z: f64) -> usize {
        self.vertices.push(Point3::new(p.x, p.y, z));
        self.vertices.len() - 1
    }
}

/// One filled region: an outer ring and the holes cut from it
struct Region<'a> {
    outer: &'a Contour,
    holes: Vec<&'a Contour>,
}

/// Group fillable contours into regions by containment parity
fn regions<'a>(contours: &[&'a Contour]) -> Vec<Region<'a>> {
    let containers = |c: &Contour| -> Vec<usize> {
        let sample = c.points[0];
        contours
            .iter()
            .enumerate()
            .filter(|(_, other)| !std::ptr::eq(**other, c) && other.contains(&sample))
            .map(|(i, _)| i)
            .collect()
    };

    let mut outers: Vec<(usize, Region<'a>)> = Vec::new();
    let mut holes: Vec<(&'a Contour, Vec<usize>)> = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        let inside = containers(contour);
        if inside.len() % 2 == 0 {
            outers.push((
                i,
                Region {
                    outer: *contour,
                    holes: Vec::new(),
                },
            ));
        } else {
            holes.push((*contour, inside));
        }
    }

    for (hole, inside) in holes {
        // Innermost container that is itself an outer ring
        let owner = outers
            .iter_mut()
            .filter(|(i, _)| inside.contains(i))
            .min_by(|(_, a), (_, b)| {
                a.outer
                    .signed_area()
                    .abs()
                    .total_cmp(&b.outer.signed_area().abs())
            });
        if let Some((_, region)) = owner {
            region.holes.push(hole);
        }
    }
    outers.into_iter().map(|(_, region)| region).collect()
}

/// Oriented copy of a ring: counter-clockwise when `ccw`, clockwise otherwise
fn oriented(contour: &Contour, ccw: bool) -> Vec<Point2> {
    if (contour.signed_area() > 0.0) == ccw {
        contour.points.clone()
    } else {
        contour.reversed().points
    }
}

/// Add both caps of a region and return its rings for the side walls
fn add_caps(
    mesh: &mut Mesh,
    region: &Region<'_>,
    depth: f64,
) -> Result<Vec<Vec<Point2>>, GeometryError> {
    let mut rings = vec![oriented(region.outer, true)];
    rings.extend(region.holes.iter().map(|hole| oriented(hole, false)));

    let mut coords = Vec::new();
    let mut hole_indices = Vec::with_capacity(region.holes.len());
    let mut flat: Vec<Point2> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_indices.push(flat.len());
        }
        for p in ring {
            coords.push(p.x);
            coords.push(p.y);
            flat.push(*p);
        }
    }

    let indices = earcutr::earcut(&coords, &hole_indices, 2)
        .map_err(|e| GeometryError::Triangulation(format!("earcut error: {}", e)))?;
    if indices.is_empty() {
        return Err(GeometryError::Triangulation(
            "earcut returned no triangles".to_string(),
        ));
    }

    let bottom: Vec<usize> = flat.iter().map(|p| mesh.push_vertex(p, 0.0)).collect();
    let top: Vec<usize> = flat.iter().map(|p| mesh.push_vertex(p, depth)).collect();
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ccw = cross(&flat[a], &flat[b], &flat[c]) > 0.0;
        let (b, c) = if ccw { (b, c) } else { (c, b) };
        // Top faces +z, bottom faces -z
        mesh.triangles.push([top[a], top[b], top[c]]);
        mesh.triangles.push([bottom[a], bottom[c], bottom[b]]);
    }
    Ok(rings)
}

/// Quads between `z = 0` and `z = depth` along a polyline
fn add_walls(mesh: &mut Mesh, points: &[Point2], closed: bool, depth: f64) {
    let n = points.len();
    let edges = if closed { n } else { n.saturating_sub(1) };
    for i in 0..edges {
        let (p, q) = (&points[i], &points[(i + 1) % n]);
        let (b0, b1) = (mesh.push_vertex(p, 0.0), mesh.push_vertex(q, 0.0));
        let (t0, t1) = (mesh.push_vertex(p, depth), mesh.push_vertex(q, depth));
        mesh.triangles.push([b0, b1, t1]);
        mesh.triangles.push([b0, t1, t0]);
    }
}

fn cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b - a).perp(&(c - a))
}

/// Extrude contours along +z
///
/// # Arguments
///
/// * `contours` - Outline loops in object-local coordinates
/// * `depth` - Extrusion depth
/// * `filled` - Whether contours with area get caps; otherwise every contour
///   only gets side walls
///
/// # Errors
///
/// Returns [`GeometryError::Triangulation`] when a cap cannot be triangulated.
pub fn extrude_contours(
    contours: &[Contour],
    depth: f64,
    filled: bool,
) -> Result<Mesh, GeometryError> {
    let mut mesh = Mesh::default();
    let (fillable, walls_only): (Vec<&Contour>, Vec<&Contour>) = contours
        .iter()
        .partition(|c| filled && c.has_area());

    for region in regions(&fillable) {
        for ring in add_caps(&mut mesh, &region, depth)? {
            add_walls(&mut mesh, &ring, true, depth);
        }
    }
    for contour in walls_only {
        add_walls(&mut mesh, &contour.points, contour.closed, depth);
    }
    Ok(mesh)
}

impl Object3D {
    /// Triangle mesh in object-local coordinates
    ///
    /// Apply [`Object3D::world_transform`] (or use
    /// [`Object3D::to_world_mesh`]) to place it in the scene.
    ///
    /// # Example
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let scene = svg3d::convert(r##"<svg><rect width="10" height="10" fill="#f00"/></svg>"##)?;
    /// let mesh = scene.objects[0].to_mesh()?;
    /// assert_eq!(mesh.triangles.len(), 12);
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_mesh(&self) -> Result<Mesh, GeometryError> {
        let filled = match self.shape {
            ObjectShape::Solid | ObjectShape::SolidWithRim => true,
            ObjectShape::Shell => false,
            ObjectShape::Text => {
                return Err(GeometryError::Empty(
                    "text objects have no outline to mesh".into(),
                ));
            }
        };
        extrude_contours(&self.outline, self.extrude_depth, filled)
    }

    /// Triangle mesh in world coordinates
    pub fn to_world_mesh(&self) -> Result<Mesh, GeometryError> {
        Ok(self.to_mesh()?.transformed(&self.world_transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Contour {
        Contour::new(
            vec![
                Point2::new(x, y),
                Point2::new(x + size, y),
                Point2::new(x + size, y + size),
                Point2::new(x, y + size),
            ],
            true,
        )
    }

    #[test]
    fn test_square_prism() {
        let mesh = extrude_contours(&[square(0.0, 0.0, 10.0)], 0.5, true).unwrap();
        assert_eq!(mesh.triangles.len(), 12);
        assert!((mesh.signed_volume() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_input_still_faces_out() {
        let mesh = extrude_contours(&[square(0.0, 0.0, 2.0).reversed()], 1.0, true).unwrap();
        assert!((mesh.signed_volume() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_is_cut_out() {
        let contours = [square(0.0, 0.0, 10.0), square(3.0, 3.0, 4.0)];
        let mesh = extrude_contours(&contours, 1.0, true).unwrap();
        assert!((mesh.signed_volume() - 84.0).abs() < 1e-9);
    }

    #[test]
    fn test_island_inside_hole_is_solid() {
        let contours = [
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
        ];
        let mesh = extrude_contours(&contours, 1.0, true).unwrap();
        assert!((mesh.signed_volume() - (100.0 - 36.0 + 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_shell_has_walls_only() {
        let mesh = extrude_contours(&[square(0.0, 0.0, 1.0)], 1.0, false).unwrap();
        assert_eq!(mesh.triangles.len(), 8);

        let open = Contour::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)], false);
        let mesh = extrude_contours(&[open], 1.0, true).unwrap();
        assert_eq!(mesh.triangles.len(), 2);
    }

    #[test]
    fn test_mirroring_keeps_volume_positive() {
        let mesh = extrude_contours(&[square(0.0, 0.0, 2.0)], 1.0, true).unwrap();
        let flip = Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(1.0, -1.0, 1.0));
        let mirrored = mesh.transformed(&flip);
        assert!((mirrored.signed_volume() - 4.0).abs() < 1e-9);
        let (lo, hi) = mirrored.bounds().unwrap();
        assert_eq!((lo.y, hi.y), (-2.0, 0.0));
    }
}
