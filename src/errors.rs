//! Error types for the reconstruction pipeline.

use thiserror::Error;

/// The crate error type. Per-candidate failures (`DegenerateCandidate`,
/// `UnrepairableOcclusion`) are isolated to their candidate's outcome by the
/// driver and never abort sibling candidates; `InsufficientFrames` aborts the
/// whole run.
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("accumulated {received} of {requested} requested frames")]
    InsufficientFrames { received: usize, requested: usize },

    #[error("candidate {index} has {points} points, too sparse to mesh")]
    DegenerateCandidate { index: usize, points: usize },

    #[error("occlusion repair failed: {0}")]
    UnrepairableOcclusion(String),

    #[error("run deadline exceeded after {0}")]
    DeadlineExceeded(&'static str),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<String> for ReconError {
    fn from(msg: String) -> Self {
        ReconError::Geometry(msg)
    }
}

impl From<&str> for ReconError {
    fn from(msg: &str) -> Self {
        ReconError::Geometry(msg.to_string())
    }
}
