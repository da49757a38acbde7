use super::points::mean_point;
use parry3d_f64::na::{DMatrix, Point, SVector, Unit};

/// The result of using singular value decomposition to determine the basis
/// vectors of a set of points and their singular values. This can be used to
/// roughly estimate whether a set of points in D-dimensional space falls
/// along a point, line, or plane, and to move points between the world frame
/// and the basis frame.
#[derive(Debug)]
pub struct SvdBasis<const D: usize> {
    /// The resultant basis vectors, sorted by their corresponding singular
    /// values so that the first vector is the most significant. These are
    /// given as unit vectors.
    pub basis: [SVector<f64, D>; D],

    /// The raw singular values associated with each basis vector.
    pub sv: [f64; D],

    /// The center (mean point) of the original point set. The basis vectors
    /// represent directions relative to this center as their origin.
    pub center: Point<f64, D>,

    /// The number of points used to compute the basis.
    pub n: usize,
}

impl<const D: usize> SvdBasis<D> {
    /// Compute the basis vectors of a set of points using `nalgebra`'s SVD
    /// implementation. The basis vectors are sorted by their corresponding
    /// singular values so that the first vector is the most significant.
    ///
    /// For a set of roughly planar points the last basis vector is the plane
    /// normal, which is how the plane fitting and the local tangent frames in
    /// the meshing stage use this type.
    ///
    /// # Arguments
    ///
    /// * `points`: the points to decompose, must not be empty
    ///
    /// returns: SvdBasis<{ D }>
    pub fn from_points(points: &[Point<f64, D>]) -> Self {
        let center = mean_point(points);
        let n = points.len();
        let mut matrix = DMatrix::zeros(n, D);
        for (i, p) in points.iter().enumerate() {
            let v = p - center;
            for j in 0..D {
                matrix[(i, j)] = v[j];
            }
        }

        let result = matrix.svd(false, true);
        let v_t = result.v_t.unwrap();

        let mut basis = [SVector::<f64, D>::zeros(); D];
        let mut sv = [0.0; D];
        for i in 0..D {
            for j in 0..D {
                basis[i][j] = v_t[(i, j)];
            }
            sv[i] = result.singular_values[i];
        }

        SvdBasis {
            basis,
            sv,
            center,
            n,
        }
    }

    /// The least significant basis direction. For a planar point set this is
    /// the plane normal.
    pub fn smallest(&self) -> Unit<SVector<f64, D>> {
        Unit::new_unchecked(self.basis[D - 1])
    }

    /// Given a point in the global coordinate system, return the coordinates
    /// of the point in the basis coordinate system. This is done by
    /// subtracting the center of the basis from the point and then projecting
    /// the result onto each basis vector in sequence.
    ///
    /// # Arguments
    ///
    /// * `point`:
    ///
    /// returns: OPoint<f64, Const<{ D }>>
    pub fn point_to_basis(&self, point: &Point<f64, D>) -> Point<f64, D> {
        let as_vec = point - self.center;
        let mut result = Point::<f64, D>::origin();
        for i in 0..D {
            result[i] = self.basis[i].dot(&as_vec);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::geom3::{Point3, SvdBasis3, Vector3};
    use approx::assert_relative_eq;

    #[test]
    fn from_points_perfect() {
        let points = vec![
            Point3::new(-2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];

        let result = SvdBasis3::from_points(&points);
        assert_relative_eq!(result.center, Point3::origin());
        assert_relative_eq!(result.basis[0], Vector3::x_axis().into_inner());
        assert_relative_eq!(result.basis[1], Vector3::y_axis().into_inner());
        assert_relative_eq!(result.basis[2].z.abs(), 1.0, epsilon = 1e-12);
        assert_eq!(result.n, 4);
    }

    #[test]
    fn planar_points_normal() {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push(Point3::new(i as f64, j as f64, 2.5));
            }
        }

        let basis = SvdBasis3::from_points(&points);
        let normal = basis.smallest();
        assert_relative_eq!(normal.z.abs(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(basis.sv[2], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn point_to_basis_recovers_in_plane_coords() {
        let points = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 2.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        ];

        let basis = SvdBasis3::from_points(&points);
        for p in &points {
            let b = basis.point_to_basis(p);
            // All points lie in the plane, so the last coordinate is zero
            assert_relative_eq!(b.z, 0.0, epsilon = 1e-10);
        }
    }
}
