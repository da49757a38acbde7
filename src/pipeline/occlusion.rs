//! Occlusion detection and repair. Boundary-edge chains of a candidate mesh
//! are candidate holes; a hole is classified as sensor occlusion when it is
//! small and the surrounding surface is smooth, and as true object boundary
//! otherwise. Repair fills the occlusion holes by triangulating each loop
//! against its best-fit plane, leaving object boundaries open.
//!
//! Detection and repair are independent operations: which of them run for a
//! pipeline run is selected by the configured
//! [`RepairMode`](crate::pipeline::RepairMode), never by a silently omitted
//! call.

use crate::common::triangulation::Point2;
use crate::common::triangulation::ear_clip::triangulate_polygon;
use crate::geom3::mesh::boundary::{BoundaryLoop, boundary_loops};
use crate::pipeline::config::OcclusionConfig;
use crate::{Mesh, Point3, ReconError, Result, SvdBasis3};
use std::collections::HashSet;

/// The classification of one boundary-edge chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleKind {
    /// Missing sensor coverage, a repair target.
    Occlusion,
    /// A true edge of the object, left open by repair.
    ObjectBoundary,
}

/// A classified boundary-edge chain of a mesh.
#[derive(Debug, Clone)]
pub struct Hole {
    pub boundary: BoundaryLoop,
    pub kind: HoleKind,
    pub perimeter: f64,
}

/// All classified boundary chains of one mesh. A watertight mesh produces an
/// empty map.
#[derive(Debug, Clone)]
pub struct OcclusionMap {
    pub holes: Vec<Hole>,
}

impl OcclusionMap {
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// The number of holes classified as repairable sensor occlusion.
    pub fn occlusion_count(&self) -> usize {
        self.holes
            .iter()
            .filter(|h| h.kind == HoleKind::Occlusion)
            .count()
    }
}

/// Find and classify the boundary chains of a mesh.
///
/// # Arguments
///
/// * `mesh`: the mesh to analyze
/// * `config`: classification thresholds
///
/// returns: OcclusionMap
pub fn detect_occlusion(mesh: &Mesh, config: &OcclusionConfig) -> OcclusionMap {
    let holes = boundary_loops(mesh)
        .into_iter()
        .map(|boundary| {
            let perimeter = boundary.perimeter(mesh);
            let kind = classify(mesh, &boundary, perimeter, config);
            Hole {
                boundary,
                kind,
                perimeter,
            }
        })
        .collect();

    OcclusionMap { holes }
}

fn classify(
    mesh: &Mesh,
    boundary: &BoundaryLoop,
    perimeter: f64,
    config: &OcclusionConfig,
) -> HoleKind {
    // An open chain means the surface itself is inconsistent there; never
    // try to fill it
    if !boundary.closed {
        return HoleKind::ObjectBoundary;
    }

    if perimeter > config.max_hole_perimeter {
        return HoleKind::ObjectBoundary;
    }

    // Curvature continuity around the rim: the faces adjacent along the
    // loop must not fold past the configured angle
    let mut normals = Vec::with_capacity(boundary.edges.len());
    for edge in &boundary.edges {
        match mesh.face_normal(edge.face) {
            Some(n) => normals.push(n),
            None => return HoleKind::ObjectBoundary,
        }
    }

    for i in 0..normals.len() {
        let a = &normals[i];
        let b = &normals[(i + 1) % normals.len()];
        if a.angle(b) > config.max_boundary_angle {
            return HoleKind::ObjectBoundary;
        }
    }

    HoleKind::Occlusion
}

/// Fill the occlusion-classified holes of a mesh, producing a closed or
/// near-closed mesh. Holes classified as object boundary are left open; a
/// map without occlusion holes returns the mesh unchanged.
///
/// Fails with [`ReconError::UnrepairableOcclusion`] when an occlusion hole
/// cannot be triangulated, in which case no partially repaired mesh is
/// produced.
///
/// # Arguments
///
/// * `mesh`: the mesh the map was detected on
/// * `map`: the detected occlusion map
///
/// returns: Result<Mesh, ReconError>
pub fn repair(mesh: &Mesh, map: &OcclusionMap) -> Result<Mesh> {
    let mut fill = Vec::new();
    for hole in map.holes.iter().filter(|h| h.kind == HoleKind::Occlusion) {
        fill.extend(fill_loop(mesh, &hole.boundary)?);
    }

    Ok(mesh.with_added_faces(fill))
}

/// Triangulate one closed boundary loop into fill faces over the existing
/// vertices. The loop is projected onto its best-fit plane and ear-clipped;
/// the resulting faces are wound against the mesh's boundary edge directions
/// so the filled surface stays consistently oriented.
fn fill_loop(mesh: &Mesh, boundary: &BoundaryLoop) -> Result<Vec<[u32; 3]>> {
    let vids = boundary.vertices();
    if vids.len() < 3 {
        return Err(ReconError::UnrepairableOcclusion(format!(
            "hole with {} vertices cannot be filled",
            vids.len()
        )));
    }

    let points: Vec<Point3> = vids
        .iter()
        .map(|&v| mesh.vertices()[v as usize])
        .collect();

    let triangles: Vec<[usize; 3]> = if vids.len() == 3 {
        vec![[0, 1, 2]]
    } else {
        let basis = SvdBasis3::from_points(&points);
        let polygon: Vec<Point2> = points
            .iter()
            .map(|p| {
                let b = basis.point_to_basis(p);
                Point2::new(b.x, b.y)
            })
            .collect();

        triangulate_polygon(&polygon).map_err(|e| {
            ReconError::UnrepairableOcclusion(format!("hole could not be triangulated: {}", e))
        })?
    };

    // The mesh's boundary edges run in face direction; fill faces must
    // traverse them reversed. The ear clip output is consistently wound, so
    // one matching edge decides the flip for the whole fill.
    let loop_dir: HashSet<(u32, u32)> = (0..vids.len())
        .map(|i| (vids[i], vids[(i + 1) % vids.len()]))
        .collect();

    let mut flip = false;
    'decide: for t in &triangles {
        let tri = [vids[t[0]], vids[t[1]], vids[t[2]]];
        for e in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if loop_dir.contains(&e) {
                flip = true;
                break 'decide;
            }
            if loop_dir.contains(&(e.1, e.0)) {
                break 'decide;
            }
        }
    }

    let faces = triangles
        .iter()
        .map(|t| {
            if flip {
                [vids[t[2]], vids[t[1]], vids[t[0]]]
            } else {
                [vids[t[0]], vids[t[1]], vids[t[2]]]
            }
        })
        .collect();

    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3;
    use crate::geom3::mesh::boundary::boundary_loops;
    use std::f64::consts::PI;

    fn config() -> OcclusionConfig {
        OcclusionConfig {
            max_hole_perimeter: 4.0,
            max_boundary_angle: PI / 3.0,
        }
    }

    /// A flat 4x4 vertex grid with one interior triangle removed, leaving a
    /// three-edge hole surrounded by coplanar faces.
    fn holed_grid() -> Mesh {
        let mut vertices = Vec::new();
        for r in 0..4 {
            for c in 0..4 {
                vertices.push(Point3::new(c as f64, r as f64, 0.0));
            }
        }

        let v = |r: u32, c: u32| r * 4 + c;
        let mut faces = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                faces.push([v(r, c), v(r, c + 1), v(r + 1, c + 1)]);
                faces.push([v(r, c), v(r + 1, c + 1), v(r + 1, c)]);
            }
        }
        faces.retain(|f| *f != [5, 6, 10]);

        Mesh::new(vertices, faces, None)
    }

    #[test]
    fn watertight_mesh_has_empty_map() {
        let mesh = Mesh::create_box(1.0, 1.0, 1.0);
        let map = detect_occlusion(&mesh, &config());
        assert!(map.is_empty());
    }

    #[test]
    fn interior_hole_is_occlusion_and_rim_is_boundary() {
        let mesh = holed_grid();
        let map = detect_occlusion(&mesh, &config());

        assert_eq!(map.holes.len(), 2);
        assert_eq!(map.occlusion_count(), 1);

        let occlusion = map
            .holes
            .iter()
            .find(|h| h.kind == HoleKind::Occlusion)
            .unwrap();
        assert_eq!(occlusion.boundary.edge_count(), 3);
        assert!(occlusion.perimeter < 4.0);

        let rim = map
            .holes
            .iter()
            .find(|h| h.kind == HoleKind::ObjectBoundary)
            .unwrap();
        assert_eq!(rim.boundary.edge_count(), 12);
    }

    #[test]
    fn sharp_corner_hole_is_object_boundary() {
        // Remove one triangle of a box: the hole is small, but the faces
        // around it meet at right angles
        let box_mesh = Mesh::create_box(1.0, 1.0, 1.0);
        let faces: Vec<[u32; 3]> = box_mesh.faces()[1..].to_vec();
        let mesh = Mesh::new(box_mesh.vertices().to_vec(), faces, None);

        let map = detect_occlusion(&mesh, &config());
        assert_eq!(map.holes.len(), 1);
        assert_eq!(map.holes[0].kind, HoleKind::ObjectBoundary);
    }

    #[test]
    fn repair_closes_the_occlusion_hole() {
        let mesh = holed_grid();
        let map = detect_occlusion(&mesh, &config());
        let repaired = repair(&mesh, &map).unwrap();

        assert_eq!(repaired.face_count(), mesh.face_count() + 1);

        // Only the outer rim remains open
        let loops = boundary_loops(&repaired);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].edge_count(), 12);
    }

    #[test]
    fn repair_without_occlusion_holes_is_identity() {
        let box_mesh = Mesh::create_box(1.0, 1.0, 1.0);
        let faces: Vec<[u32; 3]> = box_mesh.faces()[1..].to_vec();
        let mesh = Mesh::new(box_mesh.vertices().to_vec(), faces, None);

        let map = detect_occlusion(&mesh, &config());
        let repaired = repair(&mesh, &map).unwrap();
        assert_eq!(repaired.face_count(), mesh.face_count());
    }
}
