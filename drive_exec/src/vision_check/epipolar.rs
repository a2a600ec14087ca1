//! Epipolar constraint check

use nalgebra::{Matrix3, Point2, Vector3};

use super::VisionCheckError;

/// Check that every correspondence satisfies the epipolar constraint.
///
/// Each point is lifted to homogeneous coordinates `(x, y, 1)` and the residual
/// `x2 . (F x1)` is computed. The set passes only if the magnitude of every residual is at most
/// `threshold`. An empty set passes.
///
/// Fails if the two lists are of different lengths.
pub fn epipolar_verification(
    points_1: &[Point2<f64>],
    points_2: &[Point2<f64>],
    fundamental: &Matrix3<f64>,
    threshold: f64
) -> Result<bool, VisionCheckError> {
    if points_1.len() != points_2.len() {
        return Err(VisionCheckError::LengthMismatch {
            a: points_1.len(),
            b: points_2.len()
        })
    }

    Ok(points_1.iter()
        .zip(points_2.iter())
        .all(|(p1, p2)| epipolar_residual(p1, p2, fundamental).abs() <= threshold))
}

/// Residual `x2 . (F x1)` of a single correspondence.
pub fn epipolar_residual(
    point_1: &Point2<f64>,
    point_2: &Point2<f64>,
    fundamental: &Matrix3<f64>
) -> f64 {
    let x1 = Vector3::new(point_1.x, point_1.y, 1.0);
    let x2 = Vector3::new(point_2.x, point_2.y, 1.0);

    x2.dot(&(fundamental * x1))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vision_check::Params;

    #[test]
    fn test_epipolar() -> Result<(), VisionCheckError> {
        let f = Params::default().fundamental_matrix();

        // Rectified pair, matching points share a row
        let p1 = vec![Point2::new(10.0, 20.0), Point2::new(300.0, 41.5), Point2::new(-3.0, 0.0)];
        let p2 = vec![Point2::new(2.0, 20.0), Point2::new(250.0, 41.5), Point2::new(-9.0, 0.0)];
        assert!(epipolar_verification(&p1, &p2, &f, 1e-6)?);
        assert!(epipolar_verification(&[], &[], &f, 1e-6)?);

        // One bad pair fails the whole set
        let mut p2_bad = p2.clone();
        p2_bad[1].y += 0.01;
        assert!(!epipolar_verification(&p1, &p2_bad, &f, 1e-6)?);
        assert!(epipolar_verification(&p1, &p2_bad, &f, 0.1)?);

        match epipolar_verification(&p1, &p2[..2], &f, 1e-6) {
            Err(VisionCheckError::LengthMismatch { a: 3, b: 2 }) => (),
            r => panic!("Expected length mismatch, got {:?}", r)
        }

        Ok(())
    }
}
