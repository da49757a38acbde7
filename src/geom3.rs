//! 3D geometric types used by the reconstruction pipeline.

pub mod mesh;
mod plane3;
mod point_cloud;

use crate::common::svd_basis::SvdBasis;

pub use mesh::Mesh;
pub use plane3::Plane3;
pub use point_cloud::{PointCloud, PointCloudFeatures};

pub type Point3 = parry3d_f64::na::Point3<f64>;
pub type Vector3 = parry3d_f64::na::Vector3<f64>;
pub type UnitVec3 = parry3d_f64::na::Unit<Vector3>;
pub type Iso3 = parry3d_f64::na::Isometry3<f64>;

pub type SvdBasis3 = SvdBasis<3>;
