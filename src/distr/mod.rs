use nalgebra::*;
use std::fmt::Debug;
use std::sync::Arc;
use rand::Rng;
use thiserror::Error;
use serde::{Serialize, Deserialize};
use crate::approx::Grid;

pub mod param;

pub use param::*;

pub mod weibull;

pub use weibull::*;

pub mod lognormal;

pub use lognormal::*;

pub mod normal;

pub use normal::*;

#[derive(Debug, Clone, Error)]
pub enum DistributionError {

    #[error("Parameter out of bounds. {name} has to be strictly greater than {min}, but was {value}")]
    ParameterBounds { name : &'static str, min : f64, value : f64 },

    #[error("Probability {0} outside the unit interval")]
    Probability(f64),

    #[error("The dependency of dimension '{dim}' must have smaller index than dimension, but was {on}")]
    Dependency { dim : usize, on : usize },

    #[error("distributions and dependencies must be of the same length, but len(distributions)={0} and len(dependencies)={1}")]
    Length(usize, usize),

    #[error("A multivariate distribution requires at least one dimension")]
    Empty,

    #[error("Parameter {0} is a function of another variable, but no dependency was declared for it")]
    UnconditionedFunction(&'static str),

    #[error("Conditioning variable {on} has not been evaluated")]
    MissingConditioning { on : usize },

    #[error("Conditioning variable {on} has {found} values, but 1 or {expected} were expected")]
    ConditioningLength { on : usize, found : usize, expected : usize },

    #[error("Invalid grid: {0}")]
    Grid(String)

}

/// Distribution parameter positions which might be conditioned on earlier variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Shape,
    Loc,
    Scale
}

impl Slot {

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Shape => "shape",
            Slot::Loc => "loc",
            Slot::Scale => "scale"
        }
    }

}

/// Which earlier random variables (by dimension index) the shape, location and scale
/// parameters of a marginal are functions of. A variable can only depend on variables
/// that appear before it in the multivariate distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {

    #[serde(default)]
    pub shape : Option<usize>,

    #[serde(default)]
    pub loc : Option<usize>,

    #[serde(default)]
    pub scale : Option<usize>

}

static INDEPENDENT : Dependency = Dependency { shape : None, loc : None, scale : None };

impl Dependency {

    pub fn new(shape : Option<usize>, loc : Option<usize>, scale : Option<usize>) -> Self {
        Self { shape, loc, scale }
    }

    pub fn independent() -> Self {
        INDEPENDENT
    }

    pub fn index(&self, slot : Slot) -> Option<usize> {
        match slot {
            Slot::Shape => self.shape,
            Slot::Loc => self.loc,
            Slot::Scale => self.scale
        }
    }

    pub fn is_independent(&self) -> bool {
        self.shape.is_none() && self.loc.is_none() && self.scale.is_none()
    }

    fn indices(&self) -> impl Iterator<Item=usize> {
        vec![self.shape, self.loc, self.scale].into_iter().filter_map(|d| d )
    }

}

/// Values of the already evaluated random variables, together with the dependency
/// description of the marginal being evaluated. Each entry of rv_values is either a single
/// value (broadcast over the argument vector) or a vector with the same length as the argument.
#[derive(Debug, Clone, Copy)]
pub struct Conditioning<'a> {

    rv_values : &'a [DVector<f64>],

    dependency : &'a Dependency

}

impl<'a> Conditioning<'a> {

    pub fn new(rv_values : &'a [DVector<f64>], dependency : &'a Dependency) -> Self {
        Self { rv_values, dependency }
    }

    pub fn independent() -> Conditioning<'static> {
        Conditioning { rv_values : &[], dependency : &INDEPENDENT }
    }

    pub fn dependency(&self) -> &Dependency {
        self.dependency
    }

    pub fn rv_values(&self) -> &[DVector<f64>] {
        self.rv_values
    }

    /// Evaluates the parameter at the informed slot for the i-th entry of an
    /// argument vector of length n.
    pub fn evaluate(&self, param : &Param, slot : Slot, i : usize, n : usize) -> Result<f64, DistributionError> {
        match self.dependency.index(slot) {
            None => match param {
                Param::Constant(v) => Ok(*v),
                Param::Function { .. } => Err(DistributionError::UnconditionedFunction(slot.name()))
            },
            Some(on) => {
                let rv = self.rv_values.get(on).ok_or(DistributionError::MissingConditioning { on })?;
                let x = match rv.nrows() {
                    1 => rv[0],
                    m if m == n => rv[i],
                    found => return Err(DistributionError::ConditioningLength { on, found, expected : n })
                };
                Ok(param.value(x))
            }
        }
    }

}

/// Univariate (possibly conditional) continuous distribution. This is the only contract
/// the contour algorithms rely upon: Implementors are free to represent their parameters
/// in any way, as long as cdf/i_cdf/pdf are evaluated elementwise over the argument
/// vector under the conditioning values.
pub trait Marginal
    where Self : Debug + Send + Sync
{

    fn name(&self) -> &str;

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError>;

    /// Inverse cumulative distribution (percent-point) function.
    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError>;

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError>;

}

// Applies f to each entry of x, short-circuiting on the first error.
pub(crate) fn elementwise<F>(x : &DVector<f64>, mut f : F) -> Result<DVector<f64>, DistributionError>
where
    F : FnMut(usize, f64) -> Result<f64, DistributionError>
{
    let mut out = DVector::zeros(x.nrows());
    for (i, xi) in x.iter().enumerate() {
        out[i] = f(i, *xi)?;
    }
    Ok(out)
}

pub(crate) fn check_positive(name : &'static str, value : f64) -> Result<f64, DistributionError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DistributionError::ParameterBounds { name, min : 0.0, value })
    }
}

pub(crate) fn check_probability(p : f64) -> Result<f64, DistributionError> {
    if p >= 0.0 && p <= 1.0 {
        Ok(p)
    } else {
        Err(DistributionError::Probability(p))
    }
}

/// A multivariate distribution structured as a hierarchical model: An ordered sequence of
/// marginals, where the parameters of each marginal might be functions of the realizations
/// of the marginals before it. The joint density factors as f(x0) f(x1|x0) f(x2|x0,x1)...
#[derive(Debug, Clone)]
pub struct MultivariateDistribution {

    distributions : Vec<Arc<dyn Marginal>>,

    dependencies : Vec<Dependency>

}

impl MultivariateDistribution {

    pub fn new(
        distributions : Vec<Arc<dyn Marginal>>,
        dependencies : Vec<Dependency>
    ) -> Result<Self, DistributionError> {
        if distributions.len() != dependencies.len() {
            return Err(DistributionError::Length(distributions.len(), dependencies.len()));
        }
        if distributions.is_empty() {
            return Err(DistributionError::Empty);
        }
        for (dim, dep) in dependencies.iter().enumerate() {
            if let Some(on) = dep.indices().find(|on| *on >= dim ) {
                return Err(DistributionError::Dependency { dim, on });
            }
        }
        Ok(Self { distributions, dependencies })
    }

    pub fn n_dim(&self) -> usize {
        self.distributions.len()
    }

    pub fn distributions(&self) -> &[Arc<dyn Marginal>] {
        &self.distributions[..]
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies[..]
    }

    /// Evaluates the inverse cdf of the marginal at dimension dim, conditioned
    /// on the values of the dimensions before it.
    pub fn i_cdf(&self, dim : usize, p : &DVector<f64>, rv_values : &[DVector<f64>]) -> Result<DVector<f64>, DistributionError> {
        let cond = Conditioning::new(rv_values, &self.dependencies[dim]);
        self.distributions[dim].i_cdf(p, &cond)
    }

    pub fn cdf(&self, dim : usize, x : &DVector<f64>, rv_values : &[DVector<f64>]) -> Result<DVector<f64>, DistributionError> {
        let cond = Conditioning::new(rv_values, &self.dependencies[dim]);
        self.distributions[dim].cdf(x, &cond)
    }

    /// Joint probability density. x is a (n_dim x n) matrix with one point per column.
    pub fn pdf(&self, x : &DMatrix<f64>) -> Result<DVector<f64>, DistributionError> {
        assert!(x.nrows() == self.n_dim(), "Points should have one row per dimension");
        let rows : Vec<DVector<f64>> = (0..x.nrows()).map(|r| x.row(r).transpose() ).collect();
        let mut f = DVector::from_element(x.ncols(), 1.0);
        for (dim, row) in rows.iter().enumerate() {
            let cond = Conditioning::new(&rows[0..dim], &self.dependencies[dim]);
            let fd = self.distributions[dim].pdf(row, &cond)?;
            f.component_mul_assign(&fd);
        }
        Ok(f)
    }

    /// Draws n realizations by inverse transform sampling, one dimension at a time, so that
    /// each dimension is conditioned on the values already drawn for the dimensions before it.
    /// The result has shape (n_dim x n).
    pub fn draw_sample<R>(&self, n : usize, rng : &mut R) -> Result<DMatrix<f64>, DistributionError>
    where
        R : Rng + ?Sized
    {
        let mut rows : Vec<DVector<f64>> = Vec::with_capacity(self.n_dim());
        for dim in 0..self.n_dim() {
            let u = DVector::from_fn(n, |_, _| rng.gen::<f64>() );
            let row = self.i_cdf(dim, &u, &rows[..])?;
            rows.push(row);
        }
        Ok(DMatrix::from_fn(self.n_dim(), n, |r, c| rows[r][c] ))
    }

    /// Calculates the cell averaged joint probability density over the grid spanned by coords
    /// (one vector of equally spaced sampling points per dimension). The result has one cell per
    /// combination of sampling points, with the last dimension varying fastest.
    pub fn cell_averaged_joint_pdf(&self, coords : &[DVector<f64>]) -> Result<Grid, DistributionError> {
        self.cell_averaged_joint_pdf_with(coords, || Ok(()) )
    }

    /// Same as cell_averaged_joint_pdf, but calls check before evaluating each row of
    /// conditional cdfs, and stops with its error as soon as it fails.
    pub fn cell_averaged_joint_pdf_with<F, E>(&self, coords : &[DVector<f64>], mut check : F) -> Result<Grid, E>
    where
        F : FnMut() -> Result<(), E>,
        E : From<DistributionError>
    {
        if coords.len() != self.n_dim() {
            return Err(E::from(DistributionError::Grid(format!(
                "Expected {} coordinate vectors, but got {}", self.n_dim(), coords.len()
            ))));
        }
        let shape : Vec<usize> = coords.iter().map(|c| c.nrows() ).collect();
        let mut grid = Grid::filled(shape, 1.0);
        let strides = grid.strides().to_vec();
        for dim in 0..self.n_dim() {
            let fbar = self.cell_averaged_pdf(dim, coords, &mut check)?;

            // The conditional density at dim is constant over the dimensions after it, so the
            // prefix multi-index of a cell is its flat index divided by the stride of dim.
            for (flat, v) in grid.values_mut().iter_mut().enumerate() {
                *v *= fbar[flat / strides[dim]];
            }
        }
        Ok(grid)
    }

    /// Approximates the pdf of a single (conditional) marginal by the finite differential quotient
    /// of its cdf evaluated at the borders of the grid cells: f(x) ~ (F(x + dx/2) - F(x - dx/2)) / dx.
    /// Returns a row-major array over the dimensions 0..=dim.
    fn cell_averaged_pdf<F, E>(&self, dim : usize, coords : &[DVector<f64>], check : &mut F) -> Result<Vec<f64>, E>
    where
        F : FnMut() -> Result<(), E>,
        E : From<DistributionError>
    {
        let x = &coords[dim];
        if x.nrows() < 2 {
            return Err(E::from(DistributionError::Grid(format!(
                "Dimension {} requires at least two sampling points", dim
            ))));
        }
        let dx = x[1] - x[0];
        let lower = x.map(|xi| xi - 0.5 * dx );
        let upper = x.map(|xi| xi + 0.5 * dx );
        let prefix_shape : Vec<usize> = coords[0..dim].iter().map(|c| c.nrows() ).collect();
        let n_prefix : usize = prefix_shape.iter().product();
        let n = x.nrows();
        let mut fbar = vec![0.0; n_prefix * n];
        let mut rv_values : Vec<DVector<f64>> = vec![DVector::zeros(1); dim];
        for p in 0..n_prefix {
            check()?;
            let mut rem = p;
            for k in (0..dim).rev() {
                rv_values[k][0] = coords[k][rem % prefix_shape[k]];
                rem /= prefix_shape[k];
            }
            let cond = Conditioning::new(&rv_values[..], &self.dependencies[dim]);
            let f_low = self.distributions[dim].cdf(&lower, &cond)?;
            let f_up = self.distributions[dim].cdf(&upper, &cond)?;
            for j in 0..n {
                fbar[p * n + j] = (f_up[j] - f_low[j]) / dx;
            }
        }
        Ok(fbar)
    }

}
