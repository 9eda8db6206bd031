use serde::{Serialize, Deserialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use crate::distr::*;

/* Declarative description of a multivariate distribution, so that models can be saved, have
their parameters tweaked and then re-loaded without touching source code. A model is a JSON object
with one entry per dimension, in the order they are evaluated:

{ "marginals" : [
    { "distribution" : "weibull", "shape" : 1.471, "loc" : 0.8888, "scale" : 2.776 },
    { "distribution" : "lognormal",
      "sigma" : { "func" : "exp3", "a" : 0.04, "b" : 0.1748, "c" : -0.2243 },
      "mu" : { "func" : "power3", "a" : 0.1, "b" : 1.489, "c" : 0.1901 },
      "dependency" : { "shape" : 0, "scale" : 0 } }
] } */

#[derive(Debug, Error)]
pub enum ModelError {

    #[error("Could not read model: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid model: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Distribution(#[from] DistributionError)

}

fn zero() -> Param {
    Param::Constant(0.0)
}

/// One dimension of the model: The marginal family, its parameters, and which earlier
/// dimensions those parameters are conditioned on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "lowercase")]
pub enum MarginalSpec {

    Weibull {
        shape : Param,

        #[serde(default = "zero")]
        loc : Param,

        scale : Param,

        #[serde(default)]
        dependency : Dependency
    },

    Lognormal {
        sigma : Param,

        mu : Param,

        #[serde(default)]
        dependency : Dependency
    },

    Normal {
        #[serde(default = "zero")]
        loc : Param,

        scale : Param,

        #[serde(default)]
        dependency : Dependency
    }

}

impl MarginalSpec {

    pub fn dependency(&self) -> Dependency {
        match self {
            MarginalSpec::Weibull { dependency, .. } => *dependency,
            MarginalSpec::Lognormal { dependency, .. } => *dependency,
            MarginalSpec::Normal { dependency, .. } => *dependency
        }
    }

    pub fn marginal(&self) -> Arc<dyn Marginal> {
        match self {
            MarginalSpec::Weibull { shape, loc, scale, .. } => {
                Arc::new(Weibull::new(shape.clone(), loc.clone(), scale.clone()))
            },
            MarginalSpec::Lognormal { sigma, mu, .. } => {
                Arc::new(Lognormal::new(sigma.clone(), mu.clone()))
            },
            MarginalSpec::Normal { loc, scale, .. } => {
                Arc::new(Normal::new(loc.clone(), scale.clone()))
            }
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {

    pub marginals : Vec<MarginalSpec>

}

impl ModelSpec {

    pub fn load_from_path<P>(path : P) -> Result<Self, ModelError>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        Self::load(f)
    }

    pub fn load<R>(mut reader : R) -> Result<Self, ModelError>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        content.parse()
    }

    pub fn save_to_path<P>(&self, path : P) -> Result<(), ModelError>
    where
        P : AsRef<Path>
    {
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        self.save(file)
    }

    pub fn save<W>(&self, mut writer : W) -> Result<(), ModelError>
    where
        W : Write
    {
        let content = serde_json::to_string_pretty(self)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Builds the distribution, verifying that every dependency points to an earlier dimension.
    pub fn build(&self) -> Result<MultivariateDistribution, ModelError> {
        let distributions = self.marginals.iter().map(|m| m.marginal() ).collect();
        let dependencies = self.marginals.iter().map(|m| m.dependency() ).collect();
        Ok(MultivariateDistribution::new(distributions, dependencies)?)
    }

}

impl FromStr for ModelSpec {

    type Err = ModelError;

    fn from_str(s : &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(s)?)
    }

}
