//! Dimension-generic numeric utilities shared by the geometry and pipeline
//! modules.

pub mod index_mask;
pub mod kd_tree;
pub mod points;
pub mod svd_basis;
pub mod triangulation;

pub use index_mask::IndexMask;
pub use svd_basis::SvdBasis;
