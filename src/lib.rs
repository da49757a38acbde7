//! Reconstruction of complete 3D object geometry from partial sensor scans.
//!
//! The crate is organized around a linear pipeline with a per-candidate
//! fan-out: a bounded number of sensor frames are accumulated into a single
//! cloud in the reference frame, dominant support planes are removed and the
//! residue is clustered into object candidates, each candidate is
//! triangulated into a surface mesh, and boundary regions caused by missing
//! sensor coverage are detected and optionally filled.
//!
//! The geometric types live in [`geom3`], dimension-generic numeric helpers
//! in [`common`], checkpoint/audit file formats in [`io`], and the pipeline
//! stages plus the orchestrating driver in [`pipeline`].

pub mod common;
mod errors;
pub mod geom3;
pub mod io;
pub mod pipeline;

pub use errors::ReconError;

pub type Result<T> = std::result::Result<T, ReconError>;

pub use common::IndexMask;
pub use common::kd_tree::KdTree3;
pub use geom3::{
    Iso3, Mesh, Plane3, Point3, PointCloud, PointCloudFeatures, SvdBasis3, UnitVec3, Vector3,
};
pub use pipeline::{
    CandidateObserver, CandidateOutcome, CandidateStage, Frame, FrameSource, NullObserver,
    ObjectCandidate, PipelineConfig, RepairMode, RunOutcome, RunReport, TriggerResponse,
    handle_trigger, run_pipeline,
};
