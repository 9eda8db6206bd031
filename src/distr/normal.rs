use crate::distr::*;
use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::calc::{std_normal_cdf, std_normal_quantile};
use std::f64::consts::PI;

/// Normal distribution, parametrized by its location (mean) and scale (standard deviation).
/// Either parameter might be a function of an earlier variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normal {

    pub loc : Param,

    pub scale : Param

}

impl Normal {

    pub fn new(loc : impl Into<Param>, scale : impl Into<Param>) -> Self {
        Self { loc : loc.into(), scale : scale.into() }
    }

    fn params(&self, cond : &Conditioning<'_>, i : usize, n : usize) -> Result<(f64, f64), DistributionError> {
        let loc = cond.evaluate(&self.loc, Slot::Loc, i, n)?;
        let scale = check_positive("scale", cond.evaluate(&self.scale, Slot::Scale, i, n)?)?;
        Ok((loc, scale))
    }

}

// based on stats::dnorm.ipp
fn normal_prob(x : f64, mu : f64, stddev : f64) -> f64 {
    let z = (x - mu) / stddev;
    (-0.5 * z.powf(2.)).exp() / (stddev * (2.0*PI).sqrt())
}

impl Marginal for Normal {

    fn name(&self) -> &str {
        "Normal"
    }

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (loc, scale) = self.params(cond, i, n)?;
            Ok(std_normal_cdf((xi - loc) / scale))
        })
    }

    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = p.nrows();
        elementwise(p, |i, pi| {
            let pi = check_probability(pi)?;
            let (loc, scale) = self.params(cond, i, n)?;
            Ok(loc + scale * std_normal_quantile(pi))
        })
    }

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (loc, scale) = self.params(cond, i, n)?;
            Ok(normal_prob(xi, loc, scale))
        })
    }

}

#[test]
fn normal() {
    let n = Normal::new(1.0, 2.0);
    let x = DVector::from_column_slice(&[1.0, 3.0]);
    let cond = Conditioning::independent();
    let f = n.cdf(&x, &cond).unwrap();
    assert!((f[0] - 0.5).abs() < 1E-12);
    assert!((f[1] - 0.8413447460685429).abs() < 1E-10);
    let q = n.i_cdf(&f, &cond).unwrap();
    assert!((&q - &x).norm() < 1E-9);
    assert!((n.pdf(&x, &cond).unwrap()[0] - 0.19947114020071635).abs() < 1E-12);
    assert!(Normal::new(0.0, -1.0).cdf(&x, &cond).is_err());
}
