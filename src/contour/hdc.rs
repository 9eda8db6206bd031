use nalgebra::*;
use std::sync::Arc;
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use crate::approx::{Grid, cumsum_biggest_until, boundary, components};
use crate::calc::std_normal_cdf;
use crate::distr::MultivariateDistribution;
use super::*;
use super::isorm::isorm_beta;

// Fraction of the extent of each dimension used as the default cell size.
const DEFAULT_RESOLUTION : f64 = 0.0025;

/// Grid cell size: Either the same for all dimensions, or one per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deltas {

    Uniform(f64),

    PerDimension(Vec<f64>)

}

/// Highest density contour (Haselsteiner et al., 2017). The joint density is averaged over the
/// cells of a grid, and the cells are accumulated in decreasing order of probability until they
/// hold 1 - alpha of the probability mass. The contour is the boundary of this highest density
/// region, which may be split in several disjoint parts for multi-modal distributions.
#[derive(Debug, Clone)]
pub struct HighestDensityContour {

    distribution : Arc<MultivariateDistribution>,

    settings : ContourSettings,

    deltas : Vec<f64>,

    limits : Vec<(f64, f64)>,

    sample_coords : Vec<DVector<f64>>,

    // Density at the border of the highest density region.
    fm : f64,

    mass_shortfall : bool,

    coordinates : Coordinates

}

struct HdcJob {
    distribution : Arc<MultivariateDistribution>,
    alpha : f64,
    limits : Option<Vec<(f64, f64)>>,
    deltas : Option<Deltas>
}

struct HdcComputed {
    deltas : Vec<f64>,
    limits : Vec<(f64, f64)>,
    sample_coords : Vec<DVector<f64>>,
    fm : f64,
    mass_shortfall : bool,
    coordinates : Coordinates
}

fn check_limits(limits : &[(f64, f64)], n_dim : usize) -> Result<Vec<(f64, f64)>, ContourError> {
    if limits.len() != n_dim {
        return Err(invalid("limits", format!(
            "expected one (min, max) pair for each of the {} dimensions, but got {}", n_dim, limits.len()
        )));
    }
    let mut sorted = Vec::with_capacity(n_dim);
    for (dim, (a, b)) in limits.iter().enumerate() {
        if !a.is_finite() || !b.is_finite() || a == b {
            return Err(invalid("limits", format!(
                "limits of dimension {} should be two distinct finite numbers, but were ({}, {})", dim, a, b
            )));
        }
        sorted.push((a.min(*b), a.max(*b)));
    }
    Ok(sorted)
}

fn check_deltas(deltas : &Deltas, n_dim : usize) -> Result<Vec<f64>, ContourError> {
    let deltas = match deltas {
        Deltas::Uniform(d) => vec![*d; n_dim],
        Deltas::PerDimension(ds) => {
            if ds.len() != n_dim {
                return Err(invalid("deltas", format!(
                    "expected one cell size for each of the {} dimensions, but got {}", n_dim, ds.len()
                )));
            }
            ds.clone()
        }
    };
    if let Some(d) = deltas.iter().find(|d| !(**d > 0.0 && d.is_finite()) ) {
        return Err(invalid("deltas", format!("cell sizes should be positive, but found {}", d)));
    }
    Ok(deltas)
}

/// Limits reaching well into the tail of the first marginal: The ISORM exceedance probability
/// alpha_m = 1 - Φ(β) is divided by ten and the upper limit is the corresponding quantile of
/// dimension 0. The other dimensions use the same limits.
pub fn default_limits(distribution : &MultivariateDistribution, alpha : f64) -> Result<Vec<(f64, f64)>, ContourError> {
    let n_dim = distribution.n_dim();
    let alpha_m = std_normal_cdf(-isorm_beta(alpha, n_dim)?);
    let p = DVector::from_element(1, 1. - 0.1 * alpha_m);
    let upper = distribution.i_cdf(0, &p, &[])?[0];
    if !(upper > 0.0 && upper.is_finite()) {
        return Err(invalid("limits", format!(
            "default upper limit {} is not positive; limits should be informed for this distribution", upper
        )));
    }
    Ok(vec![(0.0, upper); n_dim])
}

/// Equally spaced points min, min + delta, ... covering [min, max].
pub fn grid_coordinates(limits : &[(f64, f64)], deltas : &[f64]) -> Vec<DVector<f64>> {
    limits.iter().zip(deltas.iter())
        .map(|((min, max), delta)| {
            let n = ((max + delta - min) / delta).ceil() as usize;
            DVector::from_fn(n, |i, _| min + i as f64 * delta )
        })
        .collect()
}

impl ContourJob for HdcJob {

    type Output = HdcComputed;

    fn setup(self, cancel : &CancelToken) -> Result<HdcComputed, ContourError> {
        let n_dim = self.distribution.n_dim();
        let limits = match self.limits {
            Some(limits) => limits,
            None => default_limits(&self.distribution, self.alpha)?
        };
        let deltas = match self.deltas {
            Some(deltas) => check_deltas(&deltas, n_dim)?,
            None => limits.iter().map(|(min, max)| DEFAULT_RESOLUTION * (max - min) ).collect()
        };
        let sample_coords = grid_coordinates(&limits[..], &deltas[..]);
        let shape : Vec<usize> = sample_coords.iter().map(|c| c.nrows() ).collect();
        debug!("HDC grid with shape {:?} over limits {:?}", shape, limits);
        cancel.checkpoint()?;

        let density = self.distribution.cell_averaged_joint_pdf_with(&sample_coords[..], || cancel.checkpoint() )?;
        if density.values().iter().any(|f| f.is_nan() ) {
            return Err(ContourError::NanDensity);
        }
        cancel.checkpoint()?;

        let cell_volume : f64 = deltas.iter().product();
        let mass : Vec<f64> = density.values().iter().map(|f| f * cell_volume ).collect();
        let hdr = cumsum_biggest_until(&mass[..], 1. - self.alpha).map_err(|_| ContourError::NanDensity )?;
        let fm = if hdr.reached {
            hdr.last_summed / cell_volume
        } else {
            warn!(
                "The accumulated probability of the grid ({}) is smaller than the target {}. \
                Using the whole grid as the highest density region; the limits are probably too narrow",
                hdr.mass(&mass[..]),
                1. - self.alpha
            );
            0.0
        };
        cancel.checkpoint()?;

        let region = Grid::from_values(shape, hdr.mask)
            .ok_or_else(|| invalid("limits", "grid shape does not match the density") )?;
        let parts = components(&boundary(&region));
        debug!("HDC boundary has {} connected component(s); fm = {}", parts.len(), fm);
        let mut branches : Vec<Vec<DVector<f64>>> = parts.iter()
            .map(|cells| {
                (0..n_dim).map(|dim| {
                    DVector::from_iterator(cells.len(), cells.iter().map(|flat| {
                        let ix = region.unravel(*flat);
                        sample_coords[dim][ix[dim]]
                    }))
                }).collect()
            })
            .collect();
        let coordinates = if branches.len() > 1 {
            Coordinates::Multimodal(branches)
        } else {
            Coordinates::Unimodal(branches.pop().unwrap_or_else(|| vec![DVector::zeros(0); n_dim] ))
        };
        Ok(HdcComputed { deltas, limits, sample_coords, fm, mass_shortfall : !hdr.reached, coordinates })
    }

}

impl HighestDensityContour {

    pub fn new(
        distribution : Arc<MultivariateDistribution>,
        settings : ContourSettings,
        limits : Option<Vec<(f64, f64)>>,
        deltas : Option<Deltas>
    ) -> Result<Self, ContourError> {
        settings.validate()?;
        let n_dim = distribution.n_dim();
        let limits = match limits {
            Some(l) => Some(check_limits(&l[..], n_dim)?),
            None => None
        };
        if let Some(d) = &deltas {
            check_deltas(d, n_dim)?;
        }
        let job = HdcJob { distribution : distribution.clone(), alpha : settings.alpha(), limits, deltas };
        let computed = run_bounded(job, settings.timeout()?)?;
        Ok(Self {
            distribution,
            settings,
            deltas : computed.deltas,
            limits : computed.limits,
            sample_coords : computed.sample_coords,
            fm : computed.fm,
            mass_shortfall : computed.mass_shortfall,
            coordinates : computed.coordinates
        })
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas[..]
    }

    pub fn limits(&self) -> &[(f64, f64)] {
        &self.limits[..]
    }

    /// Grid points along each dimension.
    pub fn sample_coords(&self) -> &[DVector<f64>] {
        &self.sample_coords[..]
    }

    /// Probability density at the contour. Zero when the grid could not hold the
    /// target probability.
    pub fn fm(&self) -> f64 {
        self.fm
    }

    pub fn mass_shortfall(&self) -> bool {
        self.mass_shortfall
    }

}

impl Contour for HighestDensityContour {

    fn name(&self) -> &str {
        "Highest density"
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
