use nalgebra::*;
use std::sync::Arc;
use log::debug;
use crate::calc::std_normal_upper_quantile;
use crate::distr::MultivariateDistribution;
use super::*;
use super::reliability::{SphereJob, check_n_points};

/// Contour based on the inverse first-order reliability method (Winterstein et al., 1993).
/// Points over a sphere in standard normal space, with radius equal to the reliability index
/// beta = Φ^-1(1 - alpha), are transformed into the physical space of the distribution.
#[derive(Debug, Clone)]
pub struct IFormContour {

    distribution : Arc<MultivariateDistribution>,

    settings : ContourSettings,

    beta : f64,

    // (n_points x n_dim)
    sphere_points : DMatrix<f64>,

    coordinates : Coordinates

}

impl IFormContour {

    pub fn new(
        distribution : Arc<MultivariateDistribution>,
        settings : ContourSettings,
        n_points : usize
    ) -> Result<Self, ContourError> {
        settings.validate()?;
        check_n_points(n_points)?;
        let beta = std_normal_upper_quantile(settings.alpha());
        debug!("IFORM contour with beta = {} and {} points", beta, n_points);
        let job = SphereJob { distribution : distribution.clone(), n_points, beta };
        let computed = run_bounded(job, settings.timeout()?)?;
        Ok(Self {
            distribution,
            settings,
            beta,
            sphere_points : computed.sphere_points,
            coordinates : Coordinates::Unimodal(computed.coordinates)
        })
    }

    /// Reliability index.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn sphere_points(&self) -> &DMatrix<f64> {
        &self.sphere_points
    }

}

impl Contour for IFormContour {

    fn name(&self) -> &str {
        "IFORM"
    }

    fn distribution(&self) -> &Arc<MultivariateDistribution> {
        &self.distribution
    }

    fn settings(&self) -> &ContourSettings {
        &self.settings
    }

    fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

}
