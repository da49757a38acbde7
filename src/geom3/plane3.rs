use crate::geom3::{Point3, SvdBasis3, UnitVec3};

/// An infinite plane in 3D space, described by its unit normal and the
/// distance `d` from the origin along the normal.
#[derive(Debug, Clone)]
pub struct Plane3 {
    pub normal: UnitVec3,
    pub d: f64,
}

impl Plane3 {
    pub fn new(normal: UnitVec3, d: f64) -> Self {
        Self { normal, d }
    }

    /// Attempt to create a plane from three points. Returns `None` when the
    /// points are collinear or coincident within floating-point noise, which
    /// is how the RANSAC sampler rejects degenerate triples.
    ///
    /// # Arguments
    ///
    /// * `p1`:
    /// * `p2`:
    /// * `p3`:
    ///
    /// returns: Option<Plane3>
    pub fn from_points(p1: &Point3, p2: &Point3, p3: &Point3) -> Option<Self> {
        let cross = (p2 - p1).cross(&(p3 - p1));
        let normal = UnitVec3::try_new(cross, 1e-12)?;
        let d = normal.dot(&p1.coords);
        Some(Self::new(normal, d))
    }

    /// Measure and return the signed distance from the plane to a point in 3D
    /// space. The sign of the distance indicates whether the point is above
    /// or below the plane according to the plane's normal vector.
    ///
    /// # Arguments
    ///
    /// * `point`:
    ///
    /// returns: f64
    pub fn signed_distance_to_point(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.d
    }

    /// Measure and return the distance from the plane to a point in 3D space.
    /// The distance is always positive, and indicates the shortest distance
    /// from the point to the plane. If you need to know whether the point is
    /// above or below the plane, use `signed_distance_to_point`.
    ///
    /// # Arguments
    ///
    /// * `point`:
    ///
    /// returns: f64
    pub fn distance_to_point(&self, point: &Point3) -> f64 {
        self.signed_distance_to_point(point).abs()
    }
}

impl From<&SvdBasis3> for Plane3 {
    /// Create a Plane3 from a SvdBasis3 using the third basis vector as the
    /// normal and the mean point to calculate d. If a `SvdBasis3` has been
    /// constructed from a set of planar points, this will create a plane that
    /// best fits those points.
    ///
    /// # Arguments
    ///
    /// * `svd`: The SvdBasis3 to create the plane from
    ///
    /// returns: Plane3
    fn from(svd: &SvdBasis3) -> Self {
        let normal = UnitVec3::new_normalize(svd.basis[2]);
        let d = normal.dot(&svd.center.coords);
        Self::new(normal, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_points_and_distance() {
        let plane = Plane3::from_points(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();

        assert_relative_eq!(plane.distance_to_point(&Point3::new(5.0, 5.0, 1.0)), 0.0);
        assert_relative_eq!(plane.distance_to_point(&Point3::new(0.0, 0.0, 3.0)), 2.0);
        assert_relative_eq!(
            plane.signed_distance_to_point(&Point3::new(0.0, 0.0, 0.0)).abs(),
            1.0
        );
    }

    #[test]
    fn degenerate_points_rejected() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 0.0, 0.0);
        let p3 = Point3::new(2.0, 0.0, 0.0);
        assert!(Plane3::from_points(&p1, &p2, &p3).is_none());
    }

    #[test]
    fn fit_from_svd_basis() {
        let points = vec![
            Point3::new(5.0, 10.0, 15.0),
            Point3::new(5.0, 11.0, 16.0),
            Point3::new(5.0, 10.0, 16.0),
            Point3::new(5.0, 11.0, 15.0),
        ];
        let svd = SvdBasis3::from_points(&points);
        let plane = Plane3::from(&svd);
        assert_relative_eq!(plane.normal.x.abs(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(plane.d.abs(), 5.0, epsilon = 1e-6);
    }
}
