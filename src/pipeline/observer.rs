//! The visualization side channel. Implementations receive candidate and
//! mesh data for external display; the pipeline neither waits for nor reads
//! anything back, so implementations must return promptly and must not
//! block (hand the data to a channel or a queue, don't render in place).

use crate::Mesh;
use crate::pipeline::extractor::ObjectCandidate;

/// Observer for intermediate pipeline products. All methods are
/// fire-and-forget and have empty default implementations. The pipeline
/// calls them from worker threads, so implementations must be `Send + Sync`.
pub trait CandidateObserver: Send + Sync {
    /// Called once after extraction with the full ordered candidate set.
    fn candidates_extracted(&self, _candidates: &[ObjectCandidate]) {}

    /// Called for each candidate whose mesh was successfully built.
    fn mesh_built(&self, _index: usize, _mesh: &Mesh) {}
}

/// The no-op observer, for callers without a visualization consumer.
pub struct NullObserver;

impl CandidateObserver for NullObserver {}
