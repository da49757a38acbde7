//! Specialized triangulation routines used when a meshing problem can be
//! transformed into a simpler space.

pub mod ear_clip;

pub type Point2 = parry3d_f64::na::Point2<f64>;
