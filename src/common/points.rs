//! Common operations on f64 points in D-dimensional space.

use parry3d_f64::na::{Point, SVector};

/// Returns the distance between two points in D-dimensional space.
///
/// # Arguments
///
/// * `a`: the first point
/// * `b`: the second point
///
/// returns: f64
///
/// # Examples
///
/// ```
/// use recon3d::common::points::dist;
/// use recon3d::Point3;
/// let a = Point3::new(1.0, 2.0, 0.0);
/// let b = Point3::new(3.0, 2.0, 0.0);
/// assert_eq!(dist(&a, &b), 2.0);
/// ```
pub fn dist<const D: usize>(a: &Point<f64, D>, b: &Point<f64, D>) -> f64 {
    (a - b).norm()
}

/// Returns the mean point of a set of points in D-dimensional space. The mean
/// is found by summing the coordinates of all points and dividing by the
/// number of points.
///
/// # Arguments
///
/// * `points`: a slice of points to compute the mean of
///
/// returns: OPoint<f64, Const<{ D }>>
///
/// # Examples
///
/// ```
/// use recon3d::common::points::mean_point;
/// use recon3d::Point3;
/// let points = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(3.0, 4.0, 5.0)];
/// assert_eq!(mean_point(&points), Point3::new(2.0, 3.0, 4.0));
/// ```
pub fn mean_point<const D: usize>(points: &[Point<f64, D>]) -> Point<f64, D> {
    let mut sum = SVector::<f64, D>::zeros();
    for p in points {
        sum += p.coords;
    }
    Point::<f64, D>::from(sum / points.len() as f64)
}
