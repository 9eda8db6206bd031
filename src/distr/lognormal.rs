use crate::distr::*;
use nalgebra::DVector;
use serde::{Serialize, Deserialize};
use crate::calc::{std_normal_cdf, std_normal_quantile};
use std::f64::consts::PI;

/// Lognormal distribution, parametrized by sigma (the standard deviation of ln x, evaluated
/// at the shape slot of a dependency) and mu (the mean of ln x, evaluated at the scale slot,
/// since the scale of the distribution is e^mu).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lognormal {

    pub sigma : Param,

    pub mu : Param

}

impl Lognormal {

    pub fn new(sigma : impl Into<Param>, mu : impl Into<Param>) -> Self {
        Self { sigma : sigma.into(), mu : mu.into() }
    }

    fn params(&self, cond : &Conditioning<'_>, i : usize, n : usize) -> Result<(f64, f64), DistributionError> {
        let sigma = check_positive("sigma", cond.evaluate(&self.sigma, Slot::Shape, i, n)?)?;
        let mu = cond.evaluate(&self.mu, Slot::Scale, i, n)?;
        Ok((sigma, mu))
    }

}

fn lognormal_prob(x : f64, sigma : f64, mu : f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let z = (x.ln() - mu) / sigma;
    (-0.5 * z.powf(2.)).exp() / (x * sigma * (2.0*PI).sqrt())
}

impl Marginal for Lognormal {

    fn name(&self) -> &str {
        "Lognormal"
    }

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (sigma, mu) = self.params(cond, i, n)?;
            if xi <= 0.0 {
                Ok(0.0)
            } else {
                Ok(std_normal_cdf((xi.ln() - mu) / sigma))
            }
        })
    }

    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = p.nrows();
        elementwise(p, |i, pi| {
            let pi = check_probability(pi)?;
            let (sigma, mu) = self.params(cond, i, n)?;
            Ok((mu + sigma * std_normal_quantile(pi)).exp())
        })
    }

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (sigma, mu) = self.params(cond, i, n)?;
            Ok(lognormal_prob(xi, sigma, mu))
        })
    }

}

#[test]
fn lognormal() {
    let ln = Lognormal::new(0.5, 1.0);
    let cond = Conditioning::independent();
    let x = DVector::from_column_slice(&[-1.0, 1.0f64.exp(), 5.0]);
    let p = ln.cdf(&x, &cond).unwrap();
    assert!(p[0] == 0.0);
    assert!((p[1] - 0.5).abs() < 1E-12);
    let q = ln.i_cdf(&DVector::from_element(1, p[2]), &cond).unwrap();
    assert!((q[0] - 5.0).abs() < 1E-9);

    // mu as a function of the first variable, broadcast from a single conditioning value.
    let dep = Dependency::new(Some(0), None, Some(0));
    let cond_ln = Lognormal::new(
        Param::function(Function::Exp3, 0.04, 0.1748, -0.2243),
        Param::function(Function::Power3, 0.1, 1.489, 0.1901)
    );
    let rv = vec![DVector::from_element(1, 1.0)];
    let median = cond_ln.i_cdf(&DVector::from_element(2, 0.5), &Conditioning::new(&rv, &dep)).unwrap();
    assert!((median[0] - 1.589f64.exp()).abs() < 1E-9);
    assert!((median[1] - median[0]).abs() < 1E-15);
}
