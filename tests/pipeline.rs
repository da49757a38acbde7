//! End-to-end tests of the pipeline driver state machine: outcome reduction,
//! fail-isolation between candidates, observable repair modes, and the
//! checkpoint audit trail.

use crossbeam_channel::bounded;
use recon3d::{
    CandidateObserver, CandidateStage, Frame, Iso3, Mesh, ObjectCandidate, PipelineConfig, Point3,
    PointCloud, ReconError, RepairMode, RunOutcome, handle_trigger, run_pipeline,
};
use recon3d::pipeline::ChannelFrameSource;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn grid(
    origin: Point3,
    side: usize,
    spacing: f64,
) -> Vec<Point3> {
    let mut points = Vec::new();
    for i in 0..side {
        for j in 0..side {
            points.push(Point3::new(
                origin.x + i as f64 * spacing,
                origin.y + j as f64 * spacing,
                origin.z,
            ));
        }
    }
    points
}

/// The tabletop support surface: a 20x20 planar grid at z = 0.
fn support_plane() -> Vec<Point3> {
    grid(Point3::new(0.0, 0.0, 0.0), 20, 0.05)
}

/// A raised 8x8 patch, dense enough to mesh.
fn object_patch() -> Vec<Point3> {
    grid(Point3::new(0.3, 0.3, 0.2), 8, 0.01)
}

/// Five points in a row, a cluster too sparse to mesh.
fn sparse_object() -> Vec<Point3> {
    (0..5)
        .map(|i| Point3::new(0.8 + i as f64 * 0.01, 0.8, 0.3))
        .collect()
}

fn single_frame_source(points: Vec<Point3>) -> ChannelFrameSource {
    let (tx, rx) = bounded(1);
    tx.send(Frame::new(
        PointCloud::from(points.as_slice()),
        Iso3::identity(),
    ))
    .unwrap();
    drop(tx);
    ChannelFrameSource::new(rx)
}

fn test_config(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.output_dir = dir.to_path_buf();
    config.frame_count = 1;
    config.accumulate_timeout = Duration::from_millis(200);
    config.extractor.max_planes_removed = 1;
    config.extractor.min_cluster_size = 5;
    config.extractor.cluster_tolerance = 0.05;
    config.meshing.min_points = 30;
    config.meshing.neighbors = 8;
    config.meshing.viewpoint = Point3::new(0.0, 0.0, 1.0);
    config
}

#[derive(Default)]
struct CountingObserver {
    extractions: AtomicUsize,
    meshes: AtomicUsize,
}

impl CandidateObserver for CountingObserver {
    fn candidates_extracted(&self, candidates: &[ObjectCandidate]) {
        self.extractions
            .fetch_add(candidates.len(), Ordering::SeqCst);
    }

    fn mesh_built(&self, _index: usize, _mesh: &Mesh) {
        self.meshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn plane_only_scene_has_no_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let observer = CountingObserver::default();

    let mut source = single_frame_source(support_plane());
    let report = run_pipeline(&mut source, &config, &observer).unwrap();

    assert_eq!(report.outcome, RunOutcome::NoCandidates);
    assert!(!report.success());
    assert!(report.candidates.is_empty());

    // No meshing or occlusion stage ever ran
    assert_eq!(observer.extractions.load(Ordering::SeqCst), 0);
    assert_eq!(observer.meshes.load(Ordering::SeqCst), 0);
}

#[test]
fn single_candidate_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.repair_mode = RepairMode::DetectAndRepair;
    let observer = CountingObserver::default();

    let mut points = support_plane();
    points.extend(object_patch());
    let mut source = single_frame_source(points);

    let report = run_pipeline(&mut source, &config, &observer).unwrap();

    assert!(report.success());
    assert_eq!(report.candidates.len(), 1);

    let candidate = &report.candidates[0];
    assert_eq!(candidate.stage, CandidateStage::Repaired);
    assert!(candidate.repaired.is_some());
    assert!(candidate.occlusion.is_some());
    assert!(candidate.error.is_none());
    assert!(!candidate.mesh.is_empty());

    assert_eq!(observer.extractions.load(Ordering::SeqCst), 1);
    assert_eq!(observer.meshes.load(Ordering::SeqCst), 1);
}

#[test]
fn degenerate_candidate_does_not_abort_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.repair_mode = RepairMode::DetectAndRepair;

    let mut points = support_plane();
    points.extend(object_patch());
    points.extend(sparse_object());
    let mut source = single_frame_source(points);

    let report = run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();

    // One candidate failed, one succeeded: the run is a success
    assert!(report.success());
    assert_eq!(report.candidates.len(), 2);

    let valid = &report.candidates[0];
    assert_eq!(valid.stage, CandidateStage::Repaired);
    assert!(valid.error.is_none());

    let degenerate = &report.candidates[1];
    assert_eq!(degenerate.stage, CandidateStage::Failed);
    assert!(degenerate.mesh.is_empty());
    assert!(degenerate.repaired.is_none());
    assert!(matches!(
        degenerate.error,
        Some(ReconError::DegenerateCandidate { points: 5, .. })
    ));
}

#[test]
fn insufficient_frames_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.frame_count = 2;
    config.accumulate_timeout = Duration::from_millis(30);

    let (tx, rx) = bounded::<Frame>(1);
    let mut source = ChannelFrameSource::new(rx);

    let report = run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();
    drop(tx);

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(!report.success());
    assert!(report.candidates.is_empty());
    assert!(matches!(
        report.failure,
        Some(ReconError::InsufficientFrames {
            received: 0,
            requested: 2
        })
    ));
}

#[test]
fn expired_run_deadline_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.run_timeout = Some(Duration::ZERO);

    let mut source = single_frame_source(support_plane());
    let report = run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(matches!(
        report.failure,
        Some(ReconError::DeadlineExceeded(_))
    ));
}

#[test]
fn repair_modes_are_observable() {
    let scene = || {
        let mut points = support_plane();
        points.extend(object_patch());
        points
    };

    // Skip: no occlusion analysis at all
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.repair_mode = RepairMode::Skip;
    let mut source = single_frame_source(scene());
    let report = run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();
    let candidate = &report.candidates[0];
    assert_eq!(candidate.stage, CandidateStage::MeshBuilt);
    assert!(candidate.occlusion.is_none());
    assert!(candidate.repaired.is_none());

    // DetectOnly: holes are classified but nothing is filled
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.repair_mode = RepairMode::DetectOnly;
    let mut source = single_frame_source(scene());
    let report = run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();
    let candidate = &report.candidates[0];
    assert_eq!(candidate.stage, CandidateStage::MeshBuilt);
    assert!(candidate.occlusion.is_some());
    assert!(candidate.repaired.is_none());
}

#[test]
fn checkpoints_form_the_audit_trail() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let mut points = support_plane();
    points.extend(object_patch());
    let mut source = single_frame_source(points);

    run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();

    for name in [
        "00-RunConfig.json",
        "00-Debugging-PlaneInliers-0.bpc",
        "01-AccumulatedPointCloud.bpc",
        "02-ObjectCandidates-0.bpc",
        "03-ObjectCandidate-0.bpc",
    ] {
        assert!(dir.path().join(name).exists(), "missing artifact {}", name);
    }

    // The accumulated checkpoint is a faithful copy of the input scene
    let loaded = recon3d::io::load_bpc(&dir.path().join("01-AccumulatedPointCloud.bpc")).unwrap();
    use recon3d::PointCloudFeatures;
    assert_eq!(loaded.len(), 400 + 64);
}

#[test]
fn disabled_checkpoints_leave_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.write_checkpoints = false;

    let mut source = single_frame_source(support_plane());
    run_pipeline(&mut source, &config, &recon3d::NullObserver).unwrap();

    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn trigger_adapter_collapses_to_boolean() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    // A scene with an object triggers success
    let mut points = support_plane();
    points.extend(object_patch());
    let mut source = single_frame_source(points);
    let response = handle_trigger(&mut source, &config, &recon3d::NullObserver);
    assert!(response.success);

    // An empty scene does not
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let mut source = single_frame_source(support_plane());
    let response = handle_trigger(&mut source, &config, &recon3d::NullObserver);
    assert!(!response.success);
}
