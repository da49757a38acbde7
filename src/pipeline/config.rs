//! Configuration for a pipeline run. Every threshold the stages consume is
//! carried explicitly in these values; nothing is read from ambient or
//! process-global state. The effective configuration is snapshotted into the
//! run's output directory so an audit of the artifacts always has the
//! parameters that produced them.

use crate::geom3::mesh::triangulate::TriangulateParams;
use crate::{Point3, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::path::PathBuf;
use std::time::Duration;

/// Whether the occlusion stage runs at all, and whether detected holes are
/// filled. This is an explicit, observable choice: a run that skips repair
/// does so because its configuration says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairMode {
    /// Build meshes only, no occlusion analysis.
    Skip,
    /// Detect and classify holes, leave the mesh untouched.
    DetectOnly,
    /// Detect holes and fill the ones classified as sensor occlusion.
    DetectAndRepair,
}

/// Parameters for planar-surface removal and candidate clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum point-to-plane distance for a point to count as a plane
    /// inlier.
    pub plane_distance_threshold: f64,
    /// RANSAC iterations per plane fit.
    pub plane_max_iterations: usize,
    /// Minimum fraction of the remaining cloud a plane must claim to be
    /// removed.
    pub plane_min_inlier_ratio: f64,
    /// Upper bound on the number of planes removed before clustering.
    pub max_planes_removed: usize,
    /// Maximum distance between neighboring points within one cluster.
    pub cluster_tolerance: f64,
    /// Clusters smaller than this are discarded as noise.
    pub min_cluster_size: usize,
    /// Clusters larger than this are discarded as unsegmented structure.
    pub max_cluster_size: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            plane_distance_threshold: 0.01,
            plane_max_iterations: 200,
            plane_min_inlier_ratio: 0.25,
            max_planes_removed: 3,
            cluster_tolerance: 0.03,
            min_cluster_size: 50,
            max_cluster_size: 25_000,
        }
    }
}

/// Parameters for normal estimation and surface triangulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshingConfig {
    /// Candidates with fewer points than this produce an empty mesh.
    pub min_points: usize,
    /// Neighborhood size for normal estimation and fan construction.
    pub neighbors: usize,
    /// Sensor position used to orient estimated normals.
    pub viewpoint: Point3,
    /// Fan radius as a multiple of each point's closest-neighbor distance.
    pub radius_factor: f64,
    /// Largest angular gap between fan neighbors that still closes into a
    /// triangle, in radians.
    pub max_angle_gap: f64,
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            min_points: 30,
            neighbors: 12,
            viewpoint: Point3::origin(),
            radius_factor: 2.5,
            max_angle_gap: TAU / 3.0,
        }
    }
}

impl MeshingConfig {
    pub(crate) fn triangulate_params(&self) -> TriangulateParams {
        TriangulateParams {
            neighbor_count: self.neighbors,
            radius_factor: self.radius_factor,
            max_angle_gap: self.max_angle_gap,
        }
    }
}

/// Parameters for hole classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcclusionConfig {
    /// Boundary loops with a perimeter above this are treated as true object
    /// boundary rather than missing coverage.
    pub max_hole_perimeter: f64,
    /// Largest angle, in radians, between the normals of faces adjacent
    /// along the loop for the surrounding surface to count as smooth.
    pub max_boundary_angle: f64,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            max_hole_perimeter: 0.25,
            max_boundary_angle: PI / 3.0,
        }
    }
}

/// The full configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving the stage checkpoint artifacts.
    pub output_dir: PathBuf,
    /// Number of successive sensor frames to accumulate.
    pub frame_count: usize,
    /// Overall deadline for collecting the requested frames.
    pub accumulate_timeout: Duration,
    /// Optional deadline for the whole run, checked at stage boundaries.
    pub run_timeout: Option<Duration>,
    /// Worker bound for per-candidate processing; 0 uses the default pool
    /// size.
    pub workers: usize,
    /// Whether checkpoint artifacts are written at all.
    pub write_checkpoints: bool,
    /// Occlusion stage behavior.
    pub repair_mode: RepairMode,
    pub extractor: ExtractorConfig,
    pub meshing: MeshingConfig,
    pub occlusion: OcclusionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            frame_count: 1,
            accumulate_timeout: Duration::from_secs(10),
            run_timeout: None,
            workers: 0,
            write_checkpoints: true,
            repair_mode: RepairMode::DetectAndRepair,
            extractor: ExtractorConfig::default(),
            meshing: MeshingConfig::default(),
            occlusion: OcclusionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check the configuration for values the stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(config_err("frame_count must be at least 1"));
        }
        if self.extractor.plane_distance_threshold <= 0.0 {
            return Err(config_err("plane_distance_threshold must be positive"));
        }
        if self.extractor.plane_min_inlier_ratio <= 0.0
            || self.extractor.plane_min_inlier_ratio > 1.0
        {
            return Err(config_err("plane_min_inlier_ratio must be in (0, 1]"));
        }
        if self.extractor.cluster_tolerance <= 0.0 {
            return Err(config_err("cluster_tolerance must be positive"));
        }
        if self.extractor.min_cluster_size > self.extractor.max_cluster_size {
            return Err(config_err(
                "min_cluster_size must not exceed max_cluster_size",
            ));
        }
        if self.meshing.min_points < 3 {
            return Err(config_err("min_points must be at least 3"));
        }
        if self.occlusion.max_hole_perimeter <= 0.0 {
            return Err(config_err("max_hole_perimeter must be positive"));
        }
        Ok(())
    }
}

fn config_err(msg: &str) -> crate::ReconError {
    crate::ReconError::Config(msg.to_string())
}
