/// Special functions: Standard normal cdf and quantiles, chi-squared quantiles
/// and empirical quantiles.
pub mod calc;

/// Hierarchical multivariate distributions, built from univariate marginals whose parameters
/// might be functions of the realizations of earlier marginals.
pub mod distr;

/// Discrete approximations: Points over the n-sphere, densities over rectangular grids
/// and the highest density regions extracted from them.
pub mod approx;

/// Environmental contours (IFORM, ISORM, direct sampling and highest density contours),
/// optionally computed under a timeout.
pub mod contour;

/// Ordering of unstructured contour points into a continuous line, via the depth-first
/// traversal of a nearest-neighbor graph.
pub mod graph;

/// Declarative (JSON) description of multivariate distributions.
pub mod model;

