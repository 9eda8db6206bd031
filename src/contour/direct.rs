use nalgebra::*;
use std::sync::Arc;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};
use crate::calc::empirical_quantile;
use crate::distr::MultivariateDistribution;
use super::*;

/// Parameters of the direct sampling contour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectSamplingOptions {

    /// Number of points drawn from the distribution when no sample is informed.
    pub n : usize,

    /// Angle between neighboring directions, in degrees.
    pub deg_step : f64,

    /// Previously drawn sample (2 x n) to be used instead of a new one.
    pub sample : Option<DMatrix<f64>>,

    pub seed : Option<u64>

}

impl Default for DirectSamplingOptions {

    fn default() -> Self {
        Self { n : 100_000, deg_step : 5., sample : None, seed : None }
    }

}

impl DirectSamplingOptions {

    pub fn with_sample(mut self, sample : DMatrix<f64>) -> Self {
        self.sample = Some(sample);
        self
    }

    pub fn with_seed(mut self, seed : u64) -> Self {
        self.seed = Some(seed);
        self
    }

}

/// Direct sampling contour (Huseby et al., 2013), for two-dimensional distributions only.
/// For each direction θ, the sample is projected onto the unit vector (cos θ, sin θ), and the
/// empirical (1 - alpha)-quantile of the projection gives the distance of a line perpendicular
/// to that direction. The contour vertices are the intersections of the lines of neighboring
/// directions, visited counter-clockwise.
#[derive(Debug, Clone)]
pub struct DirectSamplingContour {

    distribution : Arc<MultivariateDistribution>,

    settings : ContourSettings,

    deg_step : f64,

    sample : DMatrix<f64>,

    coordinates : Coordinates

}

struct DirectSamplingJob {
    distribution : Arc<MultivariateDistribution>,
    n : usize,
    seed : Option<u64>,
    sample : Option<DMatrix<f64>>,
    deg_step : f64,
    alpha : f64
}

impl ContourJob for DirectSamplingJob {

    type Output = (DMatrix<f64>, Vec<DVector<f64>>);

    fn setup(self, cancel : &CancelToken) -> Result<Self::Output, ContourError> {
        let sample = match self.sample {
            Some(sample) => sample,
            None => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy()
                };
                self.distribution.draw_sample(self.n, &mut rng)?
            }
        };
        if sample.iter().any(|v| v.is_nan() ) {
            return Err(ContourError::NanInput);
        }
        cancel.checkpoint()?;

        let n_dirs = (360. / self.deg_step).ceil() as usize;
        let rad_step = self.deg_step.to_radians();
        let thetas : Vec<f64> = (0..n_dirs).map(|i| i as f64 * rad_step ).collect();
        let x = sample.row(0);
        let y = sample.row(1);
        let mut radii = Vec::with_capacity(n_dirs);
        let mut proj = vec![0.0; sample.ncols()];
        for theta in thetas.iter() {
            cancel.checkpoint()?;
            let (sin, cos) = theta.sin_cos();
            for (i, p) in proj.iter_mut().enumerate() {
                *p = x[i] * cos + y[i] * sin;
            }
            radii.push(empirical_quantile(&mut proj[..], 1. - self.alpha));
        }

        let mut x_cont = DVector::zeros(n_dirs);
        let mut y_cont = DVector::zeros(n_dirs);
        for i in 0..n_dirs {
            let j = (i + 1) % n_dirs;
            let (t0, t1) = (thetas[i], thetas[j]);
            let (r0, r1) = (radii[i], radii[j]);
            let den = (t1 - t0).sin();
            x_cont[i] = (r0 * t1.sin() - r1 * t0.sin()) / den;
            y_cont[i] = (r1 * t0.cos() - r0 * t1.cos()) / den;
        }
        Ok((sample, vec![x_cont, y_cont]))
    }

}

impl DirectSamplingContour {

    pub fn new(
        distribution : Arc<MultivariateDistribution>,
        settings : ContourSettings,
        opts : DirectSamplingOptions
    ) -> Result<Self, ContourError> {
        if distribution.n_dim() != 2 {
            return Err(ContourError::NotImplemented { n_dim : distribution.n_dim() });
        }
        settings.validate()?;
        if !(opts.deg_step > 0.0 && opts.deg_step < 180.0) {
            return Err(invalid("deg_step", format!("should be in (0, 180) degrees, but was {}", opts.deg_step)));
        }
        match &opts.sample {
            Some(s) if s.nrows() != 2 => {
                return Err(invalid("sample", format!("should have 2 rows (one per dimension), but has {}", s.nrows())));
            },
            Some(s) if s.ncols() == 0 => {
                return Err(invalid("sample", "sample is empty"));
            },
            None if opts.n == 0 => {
                return Err(invalid("n", "at least one point should be drawn"));
            },
            _ => { }
        }
        debug!("Direct sampling contour with {} directions", (360. / opts.deg_step).ceil());
        let job = DirectSamplingJob {
            distribution : distribution.clone(),
            n : opts.n,
            seed : opts.seed,
            sample : opts.sample,
            deg_step : opts.deg_step,
            alpha : settings.alpha()
        };
        let (sample, coords) = run_bounded(job, settings.timeout()?)?;
        Ok(Self { distribution, settings, deg_step : opts.deg_step, sample, coordinates : Coordinates::Unimodal(coords) })
    }

    /// The (2 x n) sample the contour was calculated from.
    pub fn sample(&self) -> &DMatrix<f64> {
        &self.sample
    }

    pub fn deg_step(&self) -> f64 {
        self.deg_step
    }

}

impl Contour for DirectSamplingContour {

    fn name(&self) -> &str {
        "Direct sampling"
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
