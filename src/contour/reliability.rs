use nalgebra::*;
use std::sync::Arc;
use crate::approx::NSphere;
use crate::calc::std_normal_cdf;
use crate::distr::MultivariateDistribution;
use super::{ContourError, ContourJob, CancelToken, invalid};

// Number of sphere points transformed between two cancellation checks.
const CHUNK_SIZE : usize = 64;

/// Points over the sphere of radius beta in standard normal space, transformed to the
/// physical space of the distribution (IFORM/ISORM).
pub(crate) struct SphereJob {

    pub distribution : Arc<MultivariateDistribution>,

    pub n_points : usize,

    pub beta : f64

}

pub(crate) struct SphereContour {

    pub sphere_points : DMatrix<f64>,

    pub coordinates : Vec<DVector<f64>>

}

pub(crate) fn check_n_points(n_points : usize) -> Result<(), ContourError> {
    if n_points == 0 {
        Err(invalid("n_points", "at least one contour point is required"))
    } else {
        Ok(())
    }
}

impl ContourJob for SphereJob {

    type Output = SphereContour;

    fn setup(self, cancel : &CancelToken) -> Result<SphereContour, ContourError> {
        let n_dim = self.distribution.n_dim();
        let sphere = NSphere::new(n_dim, self.n_points);
        let sphere_points = sphere.scaled(self.beta);

        // Dimensions are evaluated in order, since the marginal at each dimension
        // might be conditioned on the coordinates already found for the ones before it.
        let mut coordinates : Vec<DVector<f64>> = Vec::with_capacity(n_dim);
        for dim in 0..n_dim {
            let p = sphere_points.column(dim).map(std_normal_cdf);
            let mut x : DVector<f64> = DVector::zeros(self.n_points);
            for start in (0..self.n_points).step_by(CHUNK_SIZE) {
                cancel.checkpoint()?;
                let len = CHUNK_SIZE.min(self.n_points - start);
                let p_chunk = p.rows(start, len).into_owned();
                let prefix : Vec<DVector<f64>> = coordinates.iter()
                    .map(|c| c.rows(start, len).into_owned() )
                    .collect();
                let x_chunk = self.distribution.i_cdf(dim, &p_chunk, &prefix[..])?;
                x.rows_mut(start, len).copy_from(&x_chunk);
            }
            coordinates.push(x);
        }
        cancel.checkpoint()?;
        Ok(SphereContour { sphere_points, coordinates })
    }

}
