use super::{Grid, neighbor_offsets};
use std::collections::VecDeque;

/// Binary erosion with the full 3^n structuring element: A cell survives only if it and all
/// the cells touching it (diagonals included) are set. Cells outside the grid count as unset,
/// so set cells at the grid border never survive.
pub fn erode(mask : &Grid<bool>) -> Grid<bool> {
    let offsets = neighbor_offsets(mask.n_dim());
    let mut out = mask.clone();
    for (flat, v) in mask.values().iter().enumerate() {
        if *v {
            let all_set = mask.neighbors(flat, &offsets[..])
                .all(|n| n.map(|nflat| mask.values()[nflat] ).unwrap_or(false) );
            out.values_mut()[flat] = all_set;
        }
    }
    out
}

/// Cells of the mask that do not survive erosion.
pub fn boundary(mask : &Grid<bool>) -> Grid<bool> {
    let eroded = erode(mask);
    let mut out = mask.clone();
    for (b, e) in out.values_mut().iter_mut().zip(eroded.values().iter()) {
        *b = *b && !*e;
    }
    out
}

/// Labels the connected components of the mask, with connectivity through faces, edges and
/// corners. Unset cells receive label 0; the components receive labels 1..=n in the order
/// their first cell appears in a raster scan. Returns the labels and the number of components.
pub fn label(mask : &Grid<bool>) -> (Grid<usize>, usize) {
    let offsets = neighbor_offsets(mask.n_dim());
    let mut labels = mask.map(|_| 0usize );
    let mut n = 0;
    let mut queue = VecDeque::new();
    for start in 0..mask.len() {
        if !mask.values()[start] || labels.values()[start] != 0 {
            continue;
        }
        n += 1;
        labels.values_mut()[start] = n;
        queue.push_back(start);
        while let Some(flat) = queue.pop_front() {
            for nflat in mask.neighbors(flat, &offsets[..]).flatten() {
                if mask.values()[nflat] && labels.values()[nflat] == 0 {
                    labels.values_mut()[nflat] = n;
                    queue.push_back(nflat);
                }
            }
        }
    }
    (labels, n)
}

/// Flat indices of the cells of each connected component, in raster order.
pub fn components(mask : &Grid<bool>) -> Vec<Vec<usize>> {
    let (labels, n) = label(mask);
    let mut comps = vec![Vec::new(); n];
    for (flat, l) in labels.values().iter().enumerate() {
        if *l > 0 {
            comps[*l - 1].push(flat);
        }
    }
    comps
}
