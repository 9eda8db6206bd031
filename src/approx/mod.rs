/*! Discrete approximations used by the contour algorithms: Points sampled over the surface of the
unit n-sphere, densities evaluated over rectangular grids, and the regions of highest density
(and their boundaries) extracted from those grids. !*/

pub mod sphere;

pub use sphere::*;

pub mod grid;

pub use grid::*;

pub mod hdi;

pub use hdi::*;

pub mod region;

pub use region::*;
