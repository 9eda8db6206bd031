use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};

/// Dependence functions used to express a distribution parameter as a function of the
/// realization of an earlier random variable (e.g. the wave period scale as a function
/// of the significant wave height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {

    /// a + b x^c
    Power3,

    /// a + b e^(cx)
    Exp3,

    /// ln(a + b sqrt(x / 9.81))
    Lnsquare2,

    /// a + 1 / (x + b)^c
    Powerdecrease3,

    /// a + b / (1 + cx)
    Asymdecrease3

}

impl Function {

    pub fn evaluate(&self, x : f64, a : f64, b : f64, c : f64) -> f64 {
        match self {
            Function::Power3 => a + b * x.powf(c),
            Function::Exp3 => a + b * (c * x).exp(),
            Function::Lnsquare2 => (a + b * (x / 9.81).sqrt()).ln(),
            Function::Powerdecrease3 => a + 1. / (x + b).powf(c),
            Function::Asymdecrease3 => a + b / (1. + c * x)
        }
    }

}

/// A distribution parameter: Either a constant or a function of one
/// conditioning variable. Constants deserialize from plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {

    Constant(f64),

    Function {
        func : Function,
        a : f64,
        b : f64,
        #[serde(default)]
        c : f64
    }

}

impl Param {

    pub fn function(func : Function, a : f64, b : f64, c : f64) -> Self {
        Param::Function { func, a, b, c }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Param::Constant(_) => true,
            _ => false
        }
    }

    /// Evaluates the parameter at the realization x of its conditioning variable.
    /// Constants ignore x.
    pub fn value(&self, x : f64) -> f64 {
        match self {
            Param::Constant(v) => *v,
            Param::Function { func, a, b, c } => func.evaluate(x, *a, *b, *c)
        }
    }

}

impl From<f64> for Param {

    fn from(v : f64) -> Self {
        Param::Constant(v)
    }

}

impl Display for Param {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Constant(v) => write!(f, "{}", v),
            Param::Function { func, a, b, c } => write!(f, "{:?}({}, {}, {})", func, a, b, c)
        }
    }

}

#[test]
fn dependence_functions() {
    let mu = Param::function(Function::Power3, 0.1, 1.489, 0.1901);
    assert!((mu.value(1.0) - 1.589).abs() < 1E-12);
    let sigma = Param::function(Function::Exp3, 0.04, 0.1748, -0.2243);
    assert!((sigma.value(0.0) - 0.2148).abs() < 1E-12);
    let c : Param = 2.5.into();
    assert!(c.is_constant() && c.value(100.0) == 2.5);
    let p : Param = serde_json::from_str(r#"{ "func" : "exp3", "a" : 0.04, "b" : 0.1748, "c" : -0.2243 }"#).unwrap();
    assert_eq!(p, sigma);
    let p : Param = serde_json::from_str("1.471").unwrap();
    assert_eq!(p, Param::Constant(1.471));
}
