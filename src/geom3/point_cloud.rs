use crate::{Iso3, Point3, Result, UnitVec3};
use bounding_volume::Aabb;
use parry3d_f64::bounding_volume;

/// Read access to the features of a point cloud, shared by owned clouds and
/// views over them.
pub trait PointCloudFeatures {
    fn points(&self) -> &[Point3];
    fn normals(&self) -> Option<&[UnitVec3]>;
    fn colors(&self) -> Option<&[[u8; 3]]>;

    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    fn len(&self) -> usize {
        self.points().len()
    }

    fn aabb(&self) -> Aabb {
        Aabb::from_points(self.points())
    }

    /// Create a new owned point cloud from a set of indices into this one,
    /// carrying over normals and colors when present.
    fn create_from_indices(&self, indices: &[usize]) -> Result<PointCloud> {
        if indices.iter().any(|&i| i >= self.len()) {
            return Err("Index out of bounds".into());
        }

        let points = self.points();
        let normals = self.normals();
        let colors = self.colors();

        let points = indices.iter().map(|i| points[*i]).collect();
        let normals = normals.map(|n| indices.iter().map(|i| n[*i]).collect());
        let colors = colors.map(|c| indices.iter().map(|i| c[*i]).collect());

        PointCloud::try_new(points, normals, colors)
    }
}

/// A point cloud with optional per-point normals and colors. Identity is a
/// value: two clouds with the same data are the same cloud.
#[derive(Clone, Debug)]
pub struct PointCloud {
    points: Vec<Point3>,
    normals: Option<Vec<UnitVec3>>,
    colors: Option<Vec<[u8; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points and, optionally, normals and
    /// colors. If normals or colors are provided their length must match the
    /// number of points.
    ///
    /// # Arguments
    ///
    /// * `points`: The points in the point cloud.
    /// * `normals`: Optional normals to be associated with the points.
    /// * `colors`: Optional colors to be associated with the points.
    ///
    /// returns: Result<PointCloud, ReconError>
    pub fn try_new(
        points: Vec<Point3>,
        normals: Option<Vec<UnitVec3>>,
        colors: Option<Vec<[u8; 3]>>,
    ) -> Result<Self> {
        if let Some(normals) = &normals {
            if normals.len() != points.len() {
                return Err("normals must have the same length as points".into());
            }
        }

        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err("colors must have the same length as points".into());
            }
        }

        Ok(Self {
            points,
            normals,
            colors,
        })
    }

    /// Merges another point cloud into this one, modifying this point cloud
    /// in place and consuming the other. The two point clouds must either
    /// both have normals or both not have normals, and the same for colors.
    ///
    /// If the normal or color data is inconsistent an error is returned
    /// before any data is merged, however the other point cloud will still
    /// have been moved.
    ///
    /// # Arguments
    ///
    /// * `other`:
    ///
    /// returns: Result<(), ReconError>
    pub fn merge(&mut self, other: PointCloud) -> Result<()> {
        if self.normals.is_some() != other.normals.is_some() {
            return Err("Cannot merge point clouds with inconsistent normal data".into());
        }
        if self.colors.is_some() != other.colors.is_some() {
            return Err("Cannot merge point clouds with inconsistent color data".into());
        }

        self.points.extend(other.points);

        if let Some(normals) = other.normals {
            self.normals.as_mut().unwrap().extend(normals);
        }

        if let Some(colors) = other.colors {
            self.colors.as_mut().unwrap().extend(colors);
        }

        Ok(())
    }

    /// Transform the point cloud by applying a transformation to all points
    /// and normals, modifying the cloud in place.
    ///
    /// # Arguments
    ///
    /// * `transform`: The transformation to apply to the point cloud.
    pub fn transform_by(&mut self, transform: &Iso3) {
        for p in &mut self.points {
            *p = transform * *p;
        }

        if let Some(normals) = &mut self.normals {
            for n in normals {
                *n = transform * *n;
            }
        }
    }
}

impl From<&[Point3]> for PointCloud {
    fn from(points: &[Point3]) -> Self {
        Self::try_new(points.to_vec(), None, None)
            .expect("Failed to create point cloud from points, this should not happen")
    }
}

impl PointCloudFeatures for PointCloud {
    fn points(&self) -> &[Point3] {
        &self.points
    }

    fn normals(&self) -> Option<&[UnitVec3]> {
        self.normals.as_deref()
    }

    fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector3;
    use approx::assert_relative_eq;

    fn cloud(points: &[Point3]) -> PointCloud {
        PointCloud::from(points)
    }

    #[test]
    fn merge_concatenates() {
        let mut a = cloud(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
        let b = cloud(&[Point3::new(2.0, 0.0, 0.0)]);
        a.merge(b).unwrap();
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn merge_rejects_inconsistent_normals() {
        let mut a = cloud(&[Point3::new(0.0, 0.0, 0.0)]);
        let b = PointCloud::try_new(
            vec![Point3::new(1.0, 0.0, 0.0)],
            Some(vec![UnitVec3::new_normalize(Vector3::z())]),
            None,
        )
        .unwrap();

        assert!(a.merge(b).is_err());
    }

    #[test]
    fn try_new_rejects_length_mismatch() {
        let result = PointCloud::try_new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            Some(vec![UnitVec3::new_normalize(Vector3::z())]),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn transform_moves_points_and_normals() {
        let mut c = PointCloud::try_new(
            vec![Point3::new(1.0, 0.0, 0.0)],
            Some(vec![UnitVec3::new_normalize(Vector3::x())]),
            None,
        )
        .unwrap();

        let iso = Iso3::new(Vector3::new(0.0, 0.0, 1.0), Vector3::zeros());
        c.transform_by(&iso);

        assert_relative_eq!(c.points()[0], Point3::new(1.0, 0.0, 1.0));
        // Pure translation leaves the normal unchanged
        assert_relative_eq!(c.normals().unwrap()[0].x, 1.0);
    }

    #[test]
    fn create_from_indices_carries_attributes() {
        let c = PointCloud::try_new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            None,
            Some(vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]),
        )
        .unwrap();

        let sub = c.create_from_indices(&[2, 0]).unwrap();
        assert_eq!(sub.len(), 2);
        assert_relative_eq!(sub.points()[0], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(sub.colors().unwrap()[0], [0, 0, 255]);

        assert!(c.create_from_indices(&[3]).is_err());
    }
}
