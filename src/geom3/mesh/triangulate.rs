//! Greedy triangulation of an unorganized point set. Each point projects its
//! radius-bounded nearest neighbors onto its local tangent plane, orders them
//! by angle, and emits fan triangles between angularly adjacent neighbors.
//! Duplicate triangles found from different fans are merged on their sorted
//! vertex triple, and each face is wound to agree with the local normals.
//!
//! The output is a triangle soup over the original points: no new vertices
//! are introduced, and regions without sufficient neighbor coverage are left
//! open as boundary holes.

use crate::common::kd_tree::KdTree3;
use crate::common::points::dist;
use crate::{Point3, UnitVec3, Vector3};
use std::collections::HashSet;
use std::f64::consts::TAU;
use std::num::NonZero;

#[derive(Debug, Clone, Copy)]
pub struct TriangulateParams {
    /// Number of nearest neighbors considered around each point.
    pub neighbor_count: usize,

    /// Neighbors farther than this factor times the closest neighbor
    /// distance are excluded from the fan.
    pub radius_factor: f64,

    /// Largest angular gap, in radians, between two adjacent fan neighbors
    /// that still produces a triangle.
    pub max_angle_gap: f64,
}

impl Default for TriangulateParams {
    fn default() -> Self {
        Self {
            neighbor_count: 12,
            radius_factor: 2.5,
            max_angle_gap: TAU / 3.0,
        }
    }
}

/// Triangulate a point set with per-point normals into a set of faces. The
/// face indices refer to the input slice; points that never qualify for a
/// triangle simply remain unreferenced.
///
/// # Arguments
///
/// * `points`: the points to triangulate
/// * `normals`: unit normals, one per point, defining the tangent planes
/// * `params`: fan construction parameters
///
/// returns: Vec<[u32; 3]>
pub fn triangulate_greedy(
    points: &[Point3],
    normals: &[UnitVec3],
    params: &TriangulateParams,
) -> Vec<[u32; 3]> {
    debug_assert_eq!(points.len(), normals.len());
    if points.len() < 3 {
        return Vec::new();
    }

    let Some(take) = NonZero::new(params.neighbor_count + 1) else {
        return Vec::new();
    };

    let tree = KdTree3::new(points);
    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    let mut faces = Vec::new();

    for i in 0..points.len() {
        // The query point is its own closest match, drop it
        let mut neighbors = tree.nearest(&points[i], take);
        neighbors.retain(|&(j, _)| j != i);
        if neighbors.len() < 2 {
            continue;
        }

        let d0 = neighbors[0].1;
        if d0 <= 0.0 {
            // Coincident duplicate point, nothing sensible to fan
            continue;
        }
        let radius = params.radius_factor * d0;
        neighbors.retain(|&(_, d)| d <= radius);
        if neighbors.len() < 2 {
            continue;
        }

        let (u, v) = tangent_basis(&normals[i]);
        let mut fan: Vec<(usize, f64)> = neighbors
            .iter()
            .map(|&(j, _)| {
                let rel = points[j] - points[i];
                (j, v.dot(&rel).atan2(u.dot(&rel)))
            })
            .collect();
        fan.sort_by(|a, b| a.1.total_cmp(&b.1));

        let m = fan.len();
        for t in 0..m {
            let (a, ta) = fan[t];
            let (b, tb) = fan[(t + 1) % m];
            let gap = if t + 1 == m { tb + TAU - ta } else { tb - ta };
            if gap > params.max_angle_gap {
                continue;
            }
            if dist(&points[a], &points[b]) > radius {
                continue;
            }

            push_face(i, a, b, points, normals, &mut seen, &mut faces);
        }
    }

    faces
}

/// An orthonormal pair spanning the plane perpendicular to `n`.
fn tangent_basis(n: &UnitVec3) -> (Vector3, Vector3) {
    let pick = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = n.cross(&pick).normalize();
    let v = n.cross(&u);
    (u, v)
}

fn push_face(
    i: usize,
    a: usize,
    b: usize,
    points: &[Point3],
    normals: &[UnitVec3],
    seen: &mut HashSet<[u32; 3]>,
    faces: &mut Vec<[u32; 3]>,
) {
    let mut key = [i as u32, a as u32, b as u32];
    key.sort_unstable();
    if !seen.insert(key) {
        return;
    }

    let va = points[a] - points[i];
    let vb = points[b] - points[i];
    let cross = va.cross(&vb);
    if cross.norm() < 1e-12 {
        return;
    }

    let n_avg =
        normals[i].into_inner() + normals[a].into_inner() + normals[b].into_inner();
    if cross.dot(&n_avg) >= 0.0 {
        faces.push([i as u32, a as u32, b as u32]);
    } else {
        faces.push([i as u32, b as u32, a as u32]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up_normals(n: usize) -> Vec<UnitVec3> {
        vec![UnitVec3::new_normalize(Vector3::z()); n]
    }

    #[test]
    fn planar_grid_triangulates() {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let normals = up_normals(points.len());

        let faces = triangulate_greedy(&points, &normals, &TriangulateParams::default());
        assert!(!faces.is_empty());

        for f in &faces {
            assert!(f.iter().all(|&i| (i as usize) < points.len()));

            // Every face winds to agree with the +z normals
            let a = points[f[0] as usize];
            let b = points[f[1] as usize];
            let c = points[f[2] as usize];
            let n = (b - a).cross(&(c - a));
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn collinear_points_produce_nothing() {
        let points: Vec<Point3> = (0..10).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let normals = up_normals(points.len());

        let faces = triangulate_greedy(&points, &normals, &TriangulateParams::default());
        assert!(faces.is_empty());
    }

    #[test]
    fn tiny_input_is_empty() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let normals = up_normals(2);
        assert!(triangulate_greedy(&points, &normals, &TriangulateParams::default()).is_empty());
    }
}
