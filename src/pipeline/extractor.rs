//! Candidate extraction: strip dominant planar support surfaces from the
//! accumulated cloud with an iterative RANSAC fit, then cluster the residue
//! by euclidean proximity. Each qualifying cluster becomes one object
//! candidate.
//!
//! "No candidates found" is a defined outcome here, not an error: a cloud
//! that is all support surface simply yields an empty candidate sequence.

use crate::common::IndexMask;
use crate::common::kd_tree::KdTree3;
use crate::pipeline::config::ExtractorConfig;
use crate::{Plane3, Point3, PointCloud, PointCloudFeatures, Result, SvdBasis3};
use itertools::Itertools;
use rand::Rng;

/// A segmented subset of the accumulated cloud believed to belong to one
/// distinct object. `source_indices` are sorted indices into the accumulated
/// cloud; candidates produced by one extraction never share an index.
#[derive(Debug, Clone)]
pub struct ObjectCandidate {
    pub cloud: PointCloud,
    pub source_indices: Vec<usize>,
}

impl ObjectCandidate {
    pub fn len(&self) -> usize {
        self.source_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_indices.is_empty()
    }
}

/// One removed planar surface: the fitted plane and the accumulated-cloud
/// indices of its inliers.
#[derive(Debug, Clone)]
pub struct PlaneRemoval {
    pub plane: Plane3,
    pub inliers: Vec<usize>,
}

/// The full result of the extraction stage. The removed planes are kept for
/// the debugging checkpoints and for the disjointness guarantee: no
/// candidate index appears in any removal's inlier set.
#[derive(Debug)]
pub struct Extraction {
    pub candidates: Vec<ObjectCandidate>,
    pub removed_planes: Vec<PlaneRemoval>,
}

/// Remove dominant planes from the cloud and cluster the remainder into
/// object candidates, ordered by descending point count (ties broken by the
/// first source index).
///
/// # Arguments
///
/// * `cloud`: the accumulated cloud
/// * `config`: extraction thresholds
///
/// returns: Result<Extraction, ReconError>
pub fn extract_candidates(cloud: &PointCloud, config: &ExtractorConfig) -> Result<Extraction> {
    let points = cloud.points();
    let mut claimed = IndexMask::new(points.len(), false);
    let mut removed_planes = Vec::new();
    let mut rng = rand::rng();

    for round in 0..config.max_planes_removed {
        let remaining = unclaimed(&claimed);
        if remaining.len() < 3 {
            break;
        }

        let Some((plane, inliers)) = fit_plane_ransac(points, &remaining, config, &mut rng)
        else {
            break;
        };

        let ratio = inliers.len() as f64 / remaining.len() as f64;
        if ratio < config.plane_min_inlier_ratio {
            log::debug!(
                "plane round {}: best inlier ratio {:.3} below minimum, stopping",
                round,
                ratio
            );
            break;
        }

        log::debug!(
            "plane round {}: removing {} inliers ({:.1}% of remaining)",
            round,
            inliers.len(),
            ratio * 100.0
        );
        for &i in &inliers {
            claimed.set(i, true);
        }
        removed_planes.push(PlaneRemoval { plane, inliers });
    }

    let remaining = unclaimed(&claimed);
    let clusters = cluster_euclidean(points, &remaining, config);

    let mut candidates = Vec::with_capacity(clusters.len());
    for source_indices in clusters {
        let cand_cloud = cloud.create_from_indices(&source_indices)?;
        candidates.push(ObjectCandidate {
            cloud: cand_cloud,
            source_indices,
        });
    }

    candidates.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.source_indices[0].cmp(&b.source_indices[0]))
    });

    log::info!(
        "extracted {} candidates after removing {} planar surfaces",
        candidates.len(),
        removed_planes.len()
    );

    Ok(Extraction {
        candidates,
        removed_planes,
    })
}

fn unclaimed(claimed: &IndexMask) -> Vec<usize> {
    let mut free = claimed.clone();
    free.flip();
    free.to_indices()
}

/// RANSAC plane fit over `indices` into `points`: sample triples, keep the
/// plane with the most inliers, then refit it against its inlier set with an
/// SVD basis for a stable final model. Returns `None` when no non-degenerate
/// plane can be found.
fn fit_plane_ransac(
    points: &[Point3],
    indices: &[usize],
    config: &ExtractorConfig,
    rng: &mut impl Rng,
) -> Option<(Plane3, Vec<usize>)> {
    if indices.len() < 3 {
        return None;
    }

    let threshold = config.plane_distance_threshold;
    let mut best: Option<(usize, Plane3)> = None;

    for _ in 0..config.plane_max_iterations {
        let [a, b, c] = sample_distinct(rng, indices.len());
        let Some(plane) = Plane3::from_points(
            &points[indices[a]],
            &points[indices[b]],
            &points[indices[c]],
        ) else {
            continue;
        };

        let count = indices
            .iter()
            .filter(|&&i| plane.distance_to_point(&points[i]) <= threshold)
            .count();

        if best.as_ref().is_none_or(|(bc, _)| count > *bc) {
            best = Some((count, plane));
        }
    }

    let (count, plane) = best?;
    if count < 3 {
        return None;
    }

    // Refit against the consensus set for a model that doesn't depend on the
    // particular sampled triple
    let inlier_points = indices
        .iter()
        .filter(|&&i| plane.distance_to_point(&points[i]) <= threshold)
        .map(|&i| points[i])
        .collect_vec();
    let refit = Plane3::from(&SvdBasis3::from_points(&inlier_points));

    let inliers: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&i| refit.distance_to_point(&points[i]) <= threshold)
        .collect();
    if inliers.len() < 3 {
        return None;
    }

    Some((refit, inliers))
}

fn sample_distinct(rng: &mut impl Rng, n: usize) -> [usize; 3] {
    let a = rng.random_range(0..n);
    let b = loop {
        let x = rng.random_range(0..n);
        if x != a {
            break x;
        }
    };
    let c = loop {
        let x = rng.random_range(0..n);
        if x != a && x != b {
            break x;
        }
    };
    [a, b, c]
}

/// Flood-fill clustering over the kd-tree: two points belong to the same
/// cluster when they are connected by a chain of neighbors closer than the
/// cluster tolerance. Clusters outside the configured size bounds are
/// discarded. The returned index lists are sorted ascending.
fn cluster_euclidean(
    points: &[Point3],
    indices: &[usize],
    config: &ExtractorConfig,
) -> Vec<Vec<usize>> {
    if indices.is_empty() {
        return Vec::new();
    }

    let local = indices.iter().map(|&i| points[i]).collect_vec();
    let tree = KdTree3::new(&local);
    let mut visited = IndexMask::new(local.len(), false);
    let mut clusters = Vec::new();

    for seed in 0..local.len() {
        if visited.get(seed) {
            continue;
        }

        let mut members = vec![seed];
        let mut queue = vec![seed];
        visited.set(seed, true);

        while let Some(cursor) = queue.pop() {
            for (j, _) in tree.within(&local[cursor], config.cluster_tolerance) {
                if !visited.get(j) {
                    visited.set(j, true);
                    members.push(j);
                    queue.push(j);
                }
            }
        }

        if members.len() >= config.min_cluster_size && members.len() <= config.max_cluster_size {
            let mut global: Vec<usize> = members.iter().map(|&j| indices[j]).collect();
            global.sort_unstable();
            clusters.push(global);
        } else {
            log::debug!(
                "discarding cluster of {} points outside size bounds",
                members.len()
            );
        }
    }

    clusters
}
