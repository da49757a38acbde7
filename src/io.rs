//! File formats for the pipeline's checkpoint artifacts.

pub mod checkpoint;
pub mod point_cloud;
#[cfg(feature = "stl")]
pub mod stl;

pub use checkpoint::CheckpointWriter;
pub use point_cloud::{load_bpc, write_bpc};
