use nalgebra::*;
use serde::{Serialize, Deserialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::distr::{MultivariateDistribution, DistributionError};

/// Cooperative cancellation and bounded execution of contour calculations.
pub mod exec;

pub use exec::*;

mod reliability;

pub mod iform;

pub use iform::*;

pub mod isorm;

pub use isorm::*;

pub mod direct;

pub use direct::*;

pub mod hdc;

pub use hdc::*;

const HOURS_PER_YEAR : f64 = 365.25 * 24.;

#[derive(Debug, Error)]
pub enum ContourError {

    #[error("Invalid value for '{param}': {msg}")]
    InvalidParameter { param : &'static str, msg : String },

    #[error("This method is only implemented for two-dimensional distributions, but the distribution has {n_dim} dimensions")]
    NotImplemented { n_dim : usize },

    #[error("Encountered a NaN in the density grid")]
    NanDensity,

    #[error("Encountered a NaN in the sample")]
    NanInput,

    #[error("The calculation takes too long. It takes longer than the given value for a timeout, which is '{seconds} seconds'.")]
    Timeout { seconds : f64 },

    #[error("The calculation was cancelled")]
    Cancelled,

    #[error("The worker thread stopped before returning a result")]
    WorkerLost,

    #[error("Could not spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error(transparent)]
    Distribution(#[from] DistributionError)

}

pub(crate) fn invalid(param : &'static str, msg : impl Into<String>) -> ContourError {
    ContourError::InvalidParameter { param, msg : msg.into() }
}

fn default_return_period() -> f64 {
    50.
}

fn default_state_duration() -> f64 {
    3.
}

/// Parameters shared by all contour methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSettings {

    /// Average time between events at least as extreme as the contour, in years.
    #[serde(default = "default_return_period")]
    pub return_period : f64,

    /// Time span represented by one independent observation, in hours.
    #[serde(default = "default_state_duration")]
    pub state_duration : f64,

    /// Upper bound on the duration of the calculation, in seconds.
    #[serde(default)]
    pub timeout : Option<f64>

}

impl Default for ContourSettings {

    fn default() -> Self {
        Self { return_period : default_return_period(), state_duration : default_state_duration(), timeout : None }
    }

}

impl ContourSettings {

    pub fn new(return_period : f64, state_duration : f64) -> Self {
        Self { return_period, state_duration, timeout : None }
    }

    pub fn with_timeout(mut self, seconds : f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Probability that a single observation exceeds the contour.
    pub fn alpha(&self) -> f64 {
        self.state_duration / (self.return_period * HOURS_PER_YEAR)
    }

    pub fn validate(&self) -> Result<(), ContourError> {
        if !(self.return_period > 0.0 && self.return_period.is_finite()) {
            return Err(invalid("return_period", format!("should be positive, but was {}", self.return_period)));
        }
        if !(self.state_duration > 0.0 && self.state_duration.is_finite()) {
            return Err(invalid("state_duration", format!("should be positive, but was {}", self.state_duration)));
        }
        let alpha = self.alpha();
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(invalid("state_duration", format!(
                "exceedance probability {} outside (0,1); state_duration should be shorter than the return period", alpha
            )));
        }
        self.timeout().map(|_| () )
    }

    pub fn timeout(&self) -> Result<Option<Duration>, ContourError> {
        match self.timeout {
            None => Ok(None),
            Some(t) if t > 0.0 && t.is_finite() => Ok(Some(Duration::from_secs_f64(t))),
            Some(t) => Err(invalid("timeout", format!("should be a positive number of seconds, but was {}", t)))
        }
    }

}

/// Contour points, with one vector per dimension. Points at the same position
/// of each vector form one point of the contour.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinates {

    Unimodal(Vec<DVector<f64>>),

    /// One entry for each disjoint part of the contour.
    Multimodal(Vec<Vec<DVector<f64>>>)

}

impl Coordinates {

    pub fn branches(&self) -> Vec<&[DVector<f64>]> {
        match self {
            Coordinates::Unimodal(c) => vec![&c[..]],
            Coordinates::Multimodal(bs) => bs.iter().map(|b| &b[..] ).collect()
        }
    }

    pub fn n_branches(&self) -> usize {
        match self {
            Coordinates::Unimodal(_) => 1,
            Coordinates::Multimodal(bs) => bs.len()
        }
    }

    pub fn is_multimodal(&self) -> bool {
        match self {
            Coordinates::Multimodal(_) => true,
            _ => false
        }
    }

    /// Total number of contour points over all branches.
    pub fn n_points(&self) -> usize {
        self.branches().iter().map(|b| b.first().map(|v| v.nrows() ).unwrap_or(0) ).sum()
    }

}

/// Environmental contour: The set of points of a multivariate distribution which, for a
/// given return period, delimits the region of "normal" environmental conditions.
/// Implementors compute their coordinates once, at construction.
pub trait Contour
    where Self : Debug + Send + Sync
{

    fn name(&self) -> &str;

    fn distribution(&self) -> &Arc<MultivariateDistribution>;

    fn settings(&self) -> &ContourSettings;

    fn alpha(&self) -> f64 {
        self.settings().alpha()
    }

    fn coordinates(&self) -> &Coordinates;

}

fn default_n_points() -> usize {
    180
}

/// Declarative choice of contour method and its parameters, e.g.
/// { "method" : "iform", "n_points" : 360 } or { "method" : "hdc", "deltas" : 0.1 }.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ContourMethod {

    Iform {
        #[serde(default = "default_n_points")]
        n_points : usize
    },

    Isorm {
        #[serde(default = "default_n_points")]
        n_points : usize
    },

    Direct(DirectSamplingOptions),

    Hdc {
        #[serde(default)]
        limits : Option<Vec<(f64, f64)>>,

        #[serde(default)]
        deltas : Option<Deltas>
    }

}

impl ContourMethod {

    pub fn compute(
        &self,
        distribution : Arc<MultivariateDistribution>,
        settings : ContourSettings
    ) -> Result<Box<dyn Contour>, ContourError> {
        match self {
            ContourMethod::Iform { n_points } => {
                Ok(Box::new(IFormContour::new(distribution, settings, *n_points)?))
            },
            ContourMethod::Isorm { n_points } => {
                Ok(Box::new(ISormContour::new(distribution, settings, *n_points)?))
            },
            ContourMethod::Direct(opts) => {
                Ok(Box::new(DirectSamplingContour::new(distribution, settings, opts.clone())?))
            },
            ContourMethod::Hdc { limits, deltas } => {
                Ok(Box::new(HighestDensityContour::new(distribution, settings, limits.clone(), deltas.clone())?))
            }
        }
    }

}
