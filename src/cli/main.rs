use envcontour::contour::*;
use envcontour::model::ModelSpec;
use envcontour::graph::sort_points_to_form_continuous_line;
use structopt::*;
use serde::Serialize;
use nalgebra::*;
use std::sync::Arc;
use std::io;
use anyhow::{bail, Context};

/// Shared arguments of all contour methods.
#[derive(StructOpt, Debug)]
pub struct Common {

    /// JSON model file (see envcontour::model)
    model : String,

    /// Return period, in years
    #[structopt(short, long, default_value = "50")]
    return_period : f64,

    /// Duration of an independent environmental state, in hours
    #[structopt(short, long, default_value = "3")]
    state_duration : f64,

    /// Give up the calculation after this many seconds
    #[structopt(short, long)]
    timeout : Option<f64>,

    /// Write the points as CSV (columns branch,x0,x1,...) instead of JSON
    #[structopt(long)]
    csv : bool,

    /// Order the points of each branch to form a continuous line (two-dimensional contours only)
    #[structopt(long)]
    sort : bool

}

/// Calculate environmental contours from the command line
#[derive(StructOpt, Debug)]
pub enum EnvContour {

    /// Inverse first-order reliability method
    Iform {
        #[structopt(flatten)]
        common : Common,

        #[structopt(short, long, default_value = "180")]
        n_points : usize
    },

    /// Inverse second-order reliability method
    Isorm {
        #[structopt(flatten)]
        common : Common,

        #[structopt(short, long, default_value = "180")]
        n_points : usize
    },

    /// Direct sampling (two-dimensional models only)
    Direct {
        #[structopt(flatten)]
        common : Common,

        /// Number of Monte Carlo draws
        #[structopt(short, long, default_value = "100000")]
        n : usize,

        /// Angle between neighboring directions, in degrees
        #[structopt(short, long, default_value = "5")]
        deg_step : f64,

        #[structopt(long)]
        seed : Option<u64>
    },

    /// Highest density contour
    Hdc {
        #[structopt(flatten)]
        common : Common,

        /// Grid limits as min,max pairs for each dimension (e.g. -l 0 20 0 18)
        #[structopt(short, long, allow_hyphen_values = true)]
        limits : Vec<f64>,

        /// Grid cell size: One value for all dimensions, or one per dimension
        #[structopt(long)]
        deltas : Vec<f64>
    }

}

#[derive(Serialize)]
struct ContourOutput {
    method : String,
    alpha : f64,
    branches : Vec<Vec<Vec<f64>>>
}

fn parse_method(cmd : &EnvContour) -> anyhow::Result<(&Common, ContourMethod)> {
    match cmd {
        EnvContour::Iform { common, n_points } => {
            Ok((common, ContourMethod::Iform { n_points : *n_points }))
        },
        EnvContour::Isorm { common, n_points } => {
            Ok((common, ContourMethod::Isorm { n_points : *n_points }))
        },
        EnvContour::Direct { common, n, deg_step, seed } => {
            let opts = DirectSamplingOptions { n : *n, deg_step : *deg_step, sample : None, seed : *seed };
            Ok((common, ContourMethod::Direct(opts)))
        },
        EnvContour::Hdc { common, limits, deltas } => {
            if limits.len() % 2 != 0 {
                bail!("Limits should be informed as min,max pairs, but {} values were given", limits.len());
            }
            let limits = if limits.is_empty() {
                None
            } else {
                Some(limits.chunks(2).map(|c| (c[0], c[1]) ).collect())
            };
            let deltas = match deltas.len() {
                0 => None,
                1 => Some(Deltas::Uniform(deltas[0])),
                _ => Some(Deltas::PerDimension(deltas.clone()))
            };
            Ok((common, ContourMethod::Hdc { limits, deltas }))
        }
    }
}

fn branches(coords : &Coordinates, sort : bool) -> anyhow::Result<Vec<Vec<DVector<f64>>>> {
    coords.branches().iter()
        .map(|b| {
            if sort {
                if b.len() != 2 {
                    bail!("Points can only be sorted for two-dimensional contours");
                }
                let (x, y) = sort_points_to_form_continuous_line(&b[0], &b[1], false);
                Ok(vec![x, y])
            } else {
                Ok(b.to_vec())
            }
        })
        .collect()
}

fn write_csv(branches : &[Vec<DVector<f64>>]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    let n_dim = branches.first().map(|b| b.len() ).unwrap_or(0);
    let mut header = vec![String::from("branch")];
    header.extend((0..n_dim).map(|d| format!("x{}", d) ));
    wtr.write_record(&header)?;
    for (i, b) in branches.iter().enumerate() {
        let n = b.first().map(|v| v.nrows() ).unwrap_or(0);
        for p in 0..n {
            let mut record = vec![i.to_string()];
            record.extend(b.iter().map(|v| v[p].to_string() ));
            wtr.write_record(&record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();
    let cmd = EnvContour::from_args();
    let (common, method) = parse_method(&cmd)?;
    let model = ModelSpec::load_from_path(&common.model)
        .with_context(|| format!("Could not load model from {}", common.model) )?;
    let dist = Arc::new(model.build()?);
    let mut settings = ContourSettings::new(common.return_period, common.state_duration);
    settings.timeout = common.timeout;
    let contour = method.compute(dist, settings)?;
    let branches = branches(contour.coordinates(), common.sort)?;
    if common.csv {
        write_csv(&branches[..])
    } else {
        let out = ContourOutput {
            method : contour.name().to_string(),
            alpha : contour.alpha(),
            branches : branches.iter()
                .map(|b| b.iter().map(|v| v.iter().cloned().collect() ).collect() )
                .collect()
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        Ok(())
    }
}
