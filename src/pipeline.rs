//! The reconstruction pipeline: accumulation, candidate extraction, meshing,
//! and occlusion repair, sequenced by a transport-agnostic driver.
//!
//! The driver is deliberately decoupled from any service or messaging layer:
//! it takes a frame source, a configuration value, and an observer, and
//! returns a structured [`RunReport`]. The only concession to the outward
//! transport is [`handle_trigger`], which reduces a report to the boolean the
//! trigger interface carries.

pub mod accumulator;
pub mod config;
pub mod driver;
pub mod extractor;
pub mod meshing;
pub mod observer;
pub mod occlusion;

pub use accumulator::{ChannelFrameSource, Frame, FrameSource, accumulate};
pub use config::{ExtractorConfig, MeshingConfig, OcclusionConfig, PipelineConfig, RepairMode};
pub use driver::{CandidateOutcome, CandidateStage, RunOutcome, RunReport, run_pipeline};
pub use extractor::{Extraction, ObjectCandidate, extract_candidates};
pub use meshing::{build_mesh, estimate_normals};
pub use observer::{CandidateObserver, NullObserver};
pub use occlusion::{Hole, HoleKind, OcclusionMap, detect_occlusion, repair};

/// The outward response of the trigger interface. Everything richer than
/// this boolean travels through the observer and checkpoint side channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerResponse {
    pub success: bool,
}

/// Transport adapter over [`run_pipeline`]: runs the pipeline and collapses
/// the report to the trigger boolean, logging the detail that the boundary
/// interface cannot carry.
pub fn handle_trigger(
    source: &mut dyn FrameSource,
    config: &PipelineConfig,
    observer: &dyn CandidateObserver,
) -> TriggerResponse {
    match run_pipeline(source, config, observer) {
        Ok(report) => TriggerResponse {
            success: report.success(),
        },
        Err(e) => {
            log::error!("pipeline run aborted: {}", e);
            TriggerResponse { success: false }
        }
    }
}
