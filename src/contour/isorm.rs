use nalgebra::*;
use std::sync::Arc;
use log::debug;
use crate::calc::chi2_upper_quantile;
use crate::distr::MultivariateDistribution;
use super::*;
use super::reliability::{SphereJob, check_n_points};

/// Contour based on the inverse second-order reliability method (Chai and Leira, 2018).
/// Identical to IFORM, except that the radius of the sphere is the square root of the
/// chi-squared quantile at 1 - alpha with n_dim degrees of freedom, which is at least
/// as large as the IFORM radius for any distribution with more than one dimension.
#[derive(Debug, Clone)]
pub struct ISormContour {

    distribution : Arc<MultivariateDistribution>,

    settings : ContourSettings,

    beta : f64,

    sphere_points : DMatrix<f64>,

    coordinates : Coordinates

}

/// sqrt(χ²^-1(1 - alpha; n_dim)), the ISORM reliability index.
pub fn isorm_beta(alpha : f64, n_dim : usize) -> Result<f64, ContourError> {
    chi2_upper_quantile(alpha, n_dim)
        .map(|x| x.sqrt() )
        .map_err(|msg| invalid("alpha", msg) )
}

impl ISormContour {

    pub fn new(
        distribution : Arc<MultivariateDistribution>,
        settings : ContourSettings,
        n_points : usize
    ) -> Result<Self, ContourError> {
        settings.validate()?;
        check_n_points(n_points)?;
        let beta = isorm_beta(settings.alpha(), distribution.n_dim())?;
        debug!("ISORM contour with beta = {} and {} points", beta, n_points);
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

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn sphere_points(&self) -> &DMatrix<f64> {
        &self.sphere_points
    }

}

impl Contour for ISormContour {

    fn name(&self) -> &str {
        "ISORM"
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

#[test]
fn isorm_beta_in_one_dimension_equals_two_sided_normal() {
    let alpha = 0.01;
    let beta = isorm_beta(alpha, 1).unwrap();
    let z = crate::calc::std_normal_upper_quantile(alpha / 2.);
    assert!((beta - z).abs() < 1E-8);
    assert!(isorm_beta(alpha, 3).unwrap() > isorm_beta(alpha, 2).unwrap());
}
