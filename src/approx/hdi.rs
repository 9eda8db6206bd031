use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HdrError {

    #[error("Array contains NaN at index {0}")]
    NaN(usize)

}

/// Set of cells accumulated by cumsum_biggest_until.
#[derive(Debug, Clone, PartialEq)]
pub struct HighestDensityRegion {

    /// True for every accumulated cell.
    pub mask : Vec<bool>,

    /// Value of the last (smallest) accumulated cell.
    pub last_summed : f64,

    /// False when the sum of all cells stays below the limit, in which case
    /// every cell is part of the region.
    pub reached : bool

}

impl HighestDensityRegion {

    pub fn n_cells(&self) -> usize {
        self.mask.iter().filter(|m| **m ).count()
    }

    /// Sum of the values of the accumulated cells.
    pub fn mass(&self, values : &[f64]) -> f64 {
        values.iter().zip(self.mask.iter()).filter(|(_, m)| **m ).map(|(v, _)| v ).sum()
    }

}

/// Sums the biggest values of the array until the sum reaches the limit. The cells are
/// visited in decreasing order of value (among equal values, the cell with the larger index
/// comes first), and the cell at which the running sum reaches the limit is itself part of
/// the region, so the accumulated sum is never smaller than the limit unless the limit can't
/// be reached at all.
pub fn cumsum_biggest_until(values : &[f64], limit : f64) -> Result<HighestDensityRegion, HdrError> {
    if let Some(pos) = values.iter().position(|v| v.is_nan() ) {
        return Err(HdrError::NaN(pos));
    }

    // Stable ascending order, reversed.
    let mut order : Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*a].partial_cmp(&values[*b]).unwrap_or(Ordering::Equal) );
    order.reverse();

    let mut mask = vec![false; values.len()];
    let mut cumsum = 0.0;
    let mut last_summed = 0.0;
    for ix in order.iter() {
        cumsum += values[*ix];
        mask[*ix] = true;
        last_summed = values[*ix];
        if cumsum >= limit {
            return Ok(HighestDensityRegion { mask, last_summed, reached : true });
        }
    }
    Ok(HighestDensityRegion { mask, last_summed, reached : false })
}
