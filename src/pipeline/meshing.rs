//! Surface meshing of a single object candidate: estimate per-point normals
//! from local neighborhoods, then triangulate the points with the greedy
//! fan builder.
//!
//! A candidate below the configured minimum point count yields the
//! explicitly empty mesh. That is a designed degenerate case, not a failure;
//! the driver decides what an empty mesh means for the candidate's outcome.

use crate::common::kd_tree::KdTree3;
use crate::geom3::mesh::triangulate::triangulate_greedy;
use crate::pipeline::config::MeshingConfig;
use crate::pipeline::extractor::ObjectCandidate;
use crate::{Mesh, Point3, PointCloudFeatures, SvdBasis3, UnitVec3};
use std::num::NonZero;

/// Estimate a unit normal for every point from the SVD basis of its k
/// nearest neighbors, oriented toward the sensor viewpoint.
///
/// # Arguments
///
/// * `points`: the points to estimate normals for
/// * `k`: neighborhood size (the point itself is always included)
/// * `viewpoint`: sensor position the normals must face
///
/// returns: Vec<Unit<Matrix<f64, Const<3>, Const<1>, ArrayStorage<f64, 3, 1>>>>
pub fn estimate_normals(points: &[Point3], k: usize, viewpoint: &Point3) -> Vec<UnitVec3> {
    let tree = KdTree3::new(points);
    let take = NonZero::new(k.max(2) + 1).expect("neighborhood size is nonzero");

    points
        .iter()
        .map(|p| {
            let neighborhood: Vec<Point3> = tree
                .nearest(p, take)
                .iter()
                .map(|&(j, _)| points[j])
                .collect();

            let toward_sensor = viewpoint - p;
            if neighborhood.len() < 3 {
                // Too sparse for a tangent plane, point straight at the
                // sensor
                return UnitVec3::new_normalize(toward_sensor);
            }

            let normal = SvdBasis3::from_points(&neighborhood).smallest();
            if normal.dot(&toward_sensor) < 0.0 {
                -normal
            } else {
                normal
            }
        })
        .collect()
}

/// Build a surface mesh from one candidate. Candidates below
/// `config.min_points` return [`Mesh::empty`]; otherwise the mesh vertices
/// are exactly the candidate's points, with estimated normals attached.
///
/// # Arguments
///
/// * `candidate`: the candidate to mesh
/// * `config`: meshing parameters
///
/// returns: Mesh
pub fn build_mesh(candidate: &ObjectCandidate, config: &MeshingConfig) -> Mesh {
    let points = candidate.cloud.points();
    if points.len() < config.min_points {
        log::debug!(
            "candidate with {} points is below the {} point minimum, producing empty mesh",
            points.len(),
            config.min_points
        );
        return Mesh::empty();
    }

    let normals = estimate_normals(points, config.neighbors, &config.viewpoint);
    let faces = triangulate_greedy(points, &normals, &config.triangulate_params());

    Mesh::new(points.to_vec(), faces, Some(normals))
}
