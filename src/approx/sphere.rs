use nalgebra::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

const DEFAULT_SEED : u64 = 8;

/// Points over the surface of the unit sphere in R^dim, stored as a (n x dim) matrix.
/// For dim = 2, the points are the n equally spaced angles of the unit circle. For any other
/// dimension, the points are standard normal draws scaled to unit norm. Since the standard
/// multivariate normal is rotation invariant, the resulting points are uniformly distributed
/// over the sphere without preferring any axis.
#[derive(Debug, Clone)]
pub struct NSphere {

    dim : usize,

    points : DMatrix<f64>

}

impl NSphere {

    /// Samples the sphere with a fixed seed, so that repeated contour calculations
    /// yield the same points.
    pub fn new(dim : usize, n : usize) -> Self {
        Self::with_rng(dim, n, &mut StdRng::seed_from_u64(DEFAULT_SEED))
    }

    pub fn with_rng<R>(dim : usize, n : usize, rng : &mut R) -> Self
    where
        R : Rng + ?Sized
    {
        let points = match dim {
            2 => DMatrix::from_fn(n, 2, |i, j| {
                let phi = 2. * PI * i as f64 / n as f64;
                if j == 0 { phi.cos() } else { phi.sin() }
            }),
            _ => {
                let mut points = DMatrix::zeros(n, dim);
                for i in 0..n {
                    let mut p = DVector::<f64>::zeros(dim);
                    let mut norm = 0.0;
                    while dim > 0 && norm == 0.0 {
                        p = DVector::from_fn(dim, |_, _| rng.sample(StandardNormal) );
                        norm = p.norm();
                    }
                    if norm > 0.0 {
                        p /= norm;
                    }
                    points.row_mut(i).copy_from(&p.transpose());
                }
                points
            }
        };
        Self { dim, points }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n(&self) -> usize {
        self.points.nrows()
    }

    /// Unit-norm points, one per row.
    pub fn unit_sphere_samples(&self) -> &DMatrix<f64> {
        &self.points
    }

    pub fn scaled(&self, radius : f64) -> DMatrix<f64> {
        &self.points * radius
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn points_have_unit_norm() {
        for dim in 1..6 {
            let s = NSphere::new(dim, 200);
            assert_eq!(s.unit_sphere_samples().shape(), (200, dim));
            for r in s.unit_sphere_samples().row_iter() {
                assert!((r.norm() - 1.0).abs() < 1E-12);
            }
        }
    }

    #[test]
    fn circle_is_equally_spaced() {
        let s = NSphere::new(2, 4);
        let p = s.unit_sphere_samples();
        assert!((p[(0, 0)] - 1.0).abs() < 1E-12 && p[(0, 1)].abs() < 1E-12);
        assert!(p[(1, 0)].abs() < 1E-12 && (p[(1, 1)] - 1.0).abs() < 1E-12);
        assert!((p[(2, 0)] + 1.0).abs() < 1E-12);
    }

    #[test]
    fn no_axis_is_preferred() {
        // The mean of uniform points on the sphere is the origin, and each squared
        // coordinate has expectation 1/dim.
        let s = NSphere::new(3, 20_000);
        let p = s.unit_sphere_samples();
        for c in 0..3 {
            let col = p.column(c);
            assert!(col.mean().abs() < 0.02);
            let sq = col.map(|v| v * v ).mean();
            assert!((sq - 1. / 3.).abs() < 0.02);
        }
    }

}
