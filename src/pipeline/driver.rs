//! The pipeline driver: an explicit state machine sequencing accumulation,
//! extraction, and the per-candidate meshing/occlusion stages, then reducing
//! the per-candidate outcomes into a single run outcome.
//!
//! Two guarantees matter here. First, fail-isolation: candidates are
//! processed independently, and one candidate's failure never aborts its
//! siblings. Second, faithful reduction: every candidate's terminal state is
//! kept in the report, and the outward outcome is computed from all of them,
//! never from an early return.

use crate::io::CheckpointWriter;
use crate::pipeline::accumulator::{FrameSource, accumulate};
use crate::pipeline::config::{PipelineConfig, RepairMode};
use crate::pipeline::extractor::{ObjectCandidate, extract_candidates};
use crate::pipeline::meshing::build_mesh;
use crate::pipeline::observer::CandidateObserver;
use crate::pipeline::occlusion::{OcclusionMap, detect_occlusion, repair};
use crate::{Mesh, PointCloudFeatures, ReconError, Result};
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// The terminal outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one candidate reached a usable terminal state.
    Success,
    /// Extraction produced no candidates; a defined non-error outcome.
    NoCandidates,
    /// Accumulation failed, the deadline passed, or every candidate failed.
    Failed,
}

/// The terminal state one candidate reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStage {
    /// The mesh was built; occlusion detection may or may not have run,
    /// depending on the repair mode.
    MeshBuilt,
    /// Detected occlusion holes were filled into a repaired mesh.
    Repaired,
    /// The candidate failed; its error is recorded in the outcome.
    Failed,
}

/// The per-candidate reconstruction result: everything one candidate
/// produced before reaching its terminal state.
#[derive(Debug)]
pub struct CandidateOutcome {
    /// Position of the candidate in the extraction ordering.
    pub index: usize,
    pub mesh: Mesh,
    pub occlusion: Option<OcclusionMap>,
    pub repaired: Option<Mesh>,
    pub stage: CandidateStage,
    pub error: Option<ReconError>,
}

impl CandidateOutcome {
    fn failed(index: usize, mesh: Mesh, occlusion: Option<OcclusionMap>, error: ReconError) -> Self {
        Self {
            index,
            mesh,
            occlusion,
            repaired: None,
            stage: CandidateStage::Failed,
            error: Some(error),
        }
    }
}

/// The full result of a pipeline run. The outward boolean the trigger
/// interface returns is [`RunReport::success`]; everything else is the
/// detail that boolean collapses.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub candidates: Vec<CandidateOutcome>,
    /// The run-level failure, set when the run never reached the
    /// per-candidate stage.
    pub failure: Option<ReconError>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    fn run_failed(failure: ReconError) -> Self {
        Self {
            outcome: RunOutcome::Failed,
            candidates: Vec::new(),
            failure: Some(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating,
    Extracting,
    PerCandidate,
    Reducing,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Idle => "Idle",
            State::Accumulating => "Accumulating",
            State::Extracting => "Extracting",
            State::PerCandidate => "PerCandidate",
            State::Reducing => "Reducing",
        };
        write!(f, "{}", name)
    }
}

struct StateTracker {
    state: State,
}

impl StateTracker {
    fn new() -> Self {
        Self { state: State::Idle }
    }

    fn advance(&mut self, next: State) {
        log::info!("pipeline state {} -> {}", self.state, next);
        self.state = next;
    }

    fn finish(&self, outcome: RunOutcome) {
        log::info!("pipeline state {} -> {:?}", self.state, outcome);
    }
}

/// Run the reconstruction pipeline once: accumulate frames from the source,
/// extract object candidates, and mesh/repair each candidate independently.
///
/// The source is borrowed exclusively for the duration of the run, which
/// keeps two runs from competing for the same sensor stream. Run-level
/// failures that are defined pipeline outcomes (insufficient frames, the
/// run deadline) come back as a `Failed` report with the failure recorded;
/// infrastructure errors (unwritable output directory, invalid
/// configuration) are returned as `Err`.
///
/// # Arguments
///
/// * `source`: the live frame stream
/// * `config`: the full run configuration
/// * `observer`: visualization side channel, use
///   [`NullObserver`](crate::pipeline::NullObserver) when unneeded
///
/// returns: Result<RunReport, ReconError>
pub fn run_pipeline(
    source: &mut dyn FrameSource,
    config: &PipelineConfig,
    observer: &dyn CandidateObserver,
) -> Result<RunReport> {
    config.validate()?;
    let checkpoints = CheckpointWriter::new(&config.output_dir, config.write_checkpoints)?;
    checkpoints.json("00-RunConfig", config);

    let started = Instant::now();
    let mut tracker = StateTracker::new();

    tracker.advance(State::Accumulating);
    let cloud = match accumulate(source, config.frame_count, config.accumulate_timeout) {
        Ok(cloud) => cloud,
        Err(e @ ReconError::InsufficientFrames { .. }) => {
            log::warn!("accumulation failed: {}", e);
            tracker.finish(RunOutcome::Failed);
            return Ok(RunReport::run_failed(e));
        }
        Err(e) => return Err(e),
    };

    let aabb = cloud.aabb();
    log::debug!(
        "accumulated {} points, extents {:?} to {:?}",
        cloud.len(),
        aabb.mins,
        aabb.maxs
    );
    checkpoints.cloud("01-AccumulatedPointCloud", &cloud);

    if let Some(failed) = deadline_exceeded(started, config, "Accumulating") {
        tracker.finish(RunOutcome::Failed);
        return Ok(failed);
    }

    tracker.advance(State::Extracting);
    let extraction = extract_candidates(&cloud, &config.extractor)?;

    for (k, removal) in extraction.removed_planes.iter().enumerate() {
        if let Ok(inlier_cloud) = cloud.create_from_indices(&removal.inliers) {
            checkpoints.cloud(&format!("00-Debugging-PlaneInliers-{}", k), &inlier_cloud);
        }
    }

    if extraction.candidates.is_empty() {
        log::info!("no object candidates found");
        tracker.finish(RunOutcome::NoCandidates);
        return Ok(RunReport {
            outcome: RunOutcome::NoCandidates,
            candidates: Vec::new(),
            failure: None,
        });
    }

    observer.candidates_extracted(&extraction.candidates);
    for (i, candidate) in extraction.candidates.iter().enumerate() {
        checkpoints.cloud(&format!("02-ObjectCandidates-{}", i), &candidate.cloud);
    }

    if let Some(failed) = deadline_exceeded(started, config, "Extracting") {
        tracker.finish(RunOutcome::Failed);
        return Ok(failed);
    }

    tracker.advance(State::PerCandidate);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| ReconError::Config(e.to_string()))?;

    let candidates: Vec<CandidateOutcome> = pool.install(|| {
        extraction
            .candidates
            .par_iter()
            .enumerate()
            .map(|(index, candidate)| process_candidate(index, candidate, config, &checkpoints, observer))
            .collect()
    });

    tracker.advance(State::Reducing);
    let succeeded = candidates
        .iter()
        .filter(|c| c.stage != CandidateStage::Failed)
        .count();
    let outcome = if succeeded > 0 {
        RunOutcome::Success
    } else {
        RunOutcome::Failed
    };

    log::info!(
        "run complete: {} of {} candidates reached a usable state",
        succeeded,
        candidates.len()
    );
    tracker.finish(outcome);

    Ok(RunReport {
        outcome,
        candidates,
        failure: None,
    })
}

fn deadline_exceeded(
    started: Instant,
    config: &PipelineConfig,
    stage: &'static str,
) -> Option<RunReport> {
    let limit = config.run_timeout?;
    if started.elapsed() > limit {
        let failure = ReconError::DeadlineExceeded(stage);
        log::warn!("{}", failure);
        Some(RunReport::run_failed(failure))
    } else {
        None
    }
}

/// Process one candidate to its terminal state. Nothing in here returns an
/// error: every failure is folded into the candidate's own outcome so that
/// sibling candidates are unaffected.
fn process_candidate(
    index: usize,
    candidate: &ObjectCandidate,
    config: &PipelineConfig,
    checkpoints: &CheckpointWriter,
    observer: &dyn CandidateObserver,
) -> CandidateOutcome {
    log::debug!("candidate {}: meshing {} points", index, candidate.len());
    checkpoints.cloud(&format!("03-ObjectCandidate-{}", index), &candidate.cloud);

    let mesh = build_mesh(candidate, &config.meshing);
    if mesh.is_empty() {
        let error = ReconError::DegenerateCandidate {
            index,
            points: candidate.len(),
        };
        log::warn!("candidate {}: {}", index, error);
        return CandidateOutcome::failed(index, mesh, None, error);
    }

    log::debug!(
        "candidate {}: built mesh with {} faces",
        index,
        mesh.face_count()
    );
    observer.mesh_built(index, &mesh);
    #[cfg(feature = "stl")]
    checkpoints.mesh(&format!("04-CandidateMesh-{}", index), &mesh);

    match config.repair_mode {
        RepairMode::Skip => CandidateOutcome {
            index,
            mesh,
            occlusion: None,
            repaired: None,
            stage: CandidateStage::MeshBuilt,
            error: None,
        },
        RepairMode::DetectOnly => {
            let map = detect_occlusion(&mesh, &config.occlusion);
            log::info!(
                "candidate {}: {} boundary chains, {} classified as occlusion",
                index,
                map.holes.len(),
                map.occlusion_count()
            );
            CandidateOutcome {
                index,
                mesh,
                occlusion: Some(map),
                repaired: None,
                stage: CandidateStage::MeshBuilt,
                error: None,
            }
        }
        RepairMode::DetectAndRepair => {
            let map = detect_occlusion(&mesh, &config.occlusion);
            log::info!(
                "candidate {}: {} boundary chains, {} classified as occlusion",
                index,
                map.holes.len(),
                map.occlusion_count()
            );
            match repair(&mesh, &map) {
                Ok(repaired) => {
                    #[cfg(feature = "stl")]
                    checkpoints.mesh(&format!("05-RepairedMesh-{}", index), &repaired);
                    CandidateOutcome {
                        index,
                        mesh,
                        occlusion: Some(map),
                        repaired: Some(repaired),
                        stage: CandidateStage::Repaired,
                        error: None,
                    }
                }
                Err(error) => {
                    log::warn!("candidate {}: {}", index, error);
                    CandidateOutcome::failed(index, mesh, Some(map), error)
                }
            }
        }
    }
}
