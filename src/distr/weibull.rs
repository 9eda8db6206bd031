use crate::distr::*;
use nalgebra::DVector;
use serde::{Serialize, Deserialize};

/// Three-parameter Weibull distribution:
/// f(x) = (b/a) ((x - c)/a)^(b - 1) exp(-((x - c)/a)^b) for x > c,
/// with shape b, scale a and location c.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weibull {

    pub shape : Param,

    pub loc : Param,

    pub scale : Param

}

impl Weibull {

    pub fn new(shape : impl Into<Param>, loc : impl Into<Param>, scale : impl Into<Param>) -> Self {
        Self { shape : shape.into(), loc : loc.into(), scale : scale.into() }
    }

    fn params(&self, cond : &Conditioning<'_>, i : usize, n : usize) -> Result<(f64, f64, f64), DistributionError> {
        let shape = check_positive("shape", cond.evaluate(&self.shape, Slot::Shape, i, n)?)?;
        let loc = cond.evaluate(&self.loc, Slot::Loc, i, n)?;
        let scale = check_positive("scale", cond.evaluate(&self.scale, Slot::Scale, i, n)?)?;
        Ok((shape, loc, scale))
    }

}

fn weibull_cdf(x : f64, shape : f64, loc : f64, scale : f64) -> f64 {
    if x <= loc {
        return 0.0;
    }
    -(-((x - loc) / scale).powf(shape)).exp_m1()
}

fn weibull_i_cdf(p : f64, shape : f64, loc : f64, scale : f64) -> f64 {
    loc + scale * (-(-p).ln_1p()).powf(1. / shape)
}

fn weibull_prob(x : f64, shape : f64, loc : f64, scale : f64) -> f64 {
    let z = (x - loc) / scale;
    if z < 0.0 {
        return 0.0;
    }
    (shape / scale) * z.powf(shape - 1.) * (-z.powf(shape)).exp()
}

impl Marginal for Weibull {

    fn name(&self) -> &str {
        "Weibull"
    }

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (shape, loc, scale) = self.params(cond, i, n)?;
            Ok(weibull_cdf(xi, shape, loc, scale))
        })
    }

    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = p.nrows();
        elementwise(p, |i, pi| {
            let pi = check_probability(pi)?;
            let (shape, loc, scale) = self.params(cond, i, n)?;
            Ok(weibull_i_cdf(pi, shape, loc, scale))
        })
    }

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let n = x.nrows();
        elementwise(x, |i, xi| {
            let (shape, loc, scale) = self.params(cond, i, n)?;
            Ok(weibull_prob(xi, shape, loc, scale))
        })
    }

}

#[test]
fn weibull() {
    let w = Weibull::new(1.471, 0.8888, 2.776);
    let cond = Conditioning::independent();
    let x = DVector::from_column_slice(&[0.5, 2.0, 6.0, 12.0]);
    let p = w.cdf(&x, &cond).unwrap();
    assert!(p[0] == 0.0);
    let expected = 1.0 - (-((2.0f64 - 0.8888) / 2.776).powf(1.471)).exp();
    assert!((p[1] - expected).abs() < 1E-12);
    let q = w.i_cdf(&p.rows(1, 3).into_owned(), &cond).unwrap();
    assert!((q - x.rows(1, 3).into_owned()).norm() < 1E-9);

    // Shape one reduces to the shifted exponential.
    let e = Weibull::new(1.0, 0.0, 2.0);
    let f = e.pdf(&DVector::from_element(1, 1.0), &cond).unwrap();
    assert!((f[0] - 0.5 * (-0.5f64).exp()).abs() < 1E-12);
    assert!(w.i_cdf(&DVector::from_element(1, 1.5), &cond).is_err());
}
