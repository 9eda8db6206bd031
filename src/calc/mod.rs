use std::cmp::Ordering;
use std::f64::consts::SQRT_2;
use statrs::function::erf::{erfc, erfc_inv};
use statrs::function::gamma::checked_gamma_ur;

/* Special functions shared by the contour algorithms. Quantiles close to one are
always requested through their upper-tail probability alpha = 1 - p, since forming
1 - alpha for alpha ~ 1e-6 already discards most of the significant digits. */

/// Cumulative distribution function of the standard normal, evaluated via the
/// complementary error function so that the lower tail keeps its relative precision.
pub fn std_normal_cdf(x : f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Inverse of the standard normal cdf. Returns the infinities at the borders of the
/// unit interval and NaN outside of it.
pub fn std_normal_quantile(p : f64) -> f64 {
    if p.is_nan() || p < 0.0 || p > 1.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Standard normal quantile at 1 - alpha, computed directly from the upper tail.
pub fn std_normal_upper_quantile(alpha : f64) -> f64 {
    if alpha.is_nan() || alpha < 0.0 || alpha > 1.0 {
        return f64::NAN;
    }
    if alpha == 0.0 {
        return f64::INFINITY;
    }
    if alpha == 1.0 {
        return f64::NEG_INFINITY;
    }
    SQRT_2 * erfc_inv(2.0 * alpha)
}

// Survival function of the chi-squared distribution: Q(df/2, x/2).
fn chi2_sf(x : f64, df : f64) -> Result<f64, String> {
    if x <= 0.0 {
        return Ok(1.0);
    }
    checked_gamma_ur(0.5 * df, 0.5 * x).map_err(|e| format!("{}", e) )
}

/// Quantile of the chi-squared distribution with df degrees of freedom at 1 - alpha,
/// that is, the x for which P(X > x) = alpha. The survival function is monotonically
/// decreasing, so the root is bracketed by doubling and refined by bisection until the
/// bracket is below machine precision relative to its position.
pub fn chi2_upper_quantile(alpha : f64, df : usize) -> Result<f64, String> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(format!("Upper tail probability should be in (0,1), but was {}", alpha));
    }
    if df == 0 {
        return Err(format!("Chi-squared distribution requires at least one degree of freedom"));
    }
    let df = df as f64;
    let mut low = 0.0;
    let mut high = df.max(1.0);
    while chi2_sf(high, df)? > alpha {
        low = high;
        high *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        if chi2_sf(mid, df)? > alpha {
            low = mid;
        } else {
            high = mid;
        }
        if high - low <= 4.0 * f64::EPSILON * high {
            break;
        }
    }
    Ok(0.5 * (low + high))
}

/// Empirical quantile with linear interpolation between the order statistics that
/// bracket the position (n - 1) q. Partially reorders the informed values.
pub fn empirical_quantile(values : &mut [f64], q : f64) -> f64 {
    let n = values.len();
    assert!(n > 0, "Quantile of empty sample");
    assert!(q >= 0.0 && q <= 1.0, "Quantile position should be in [0,1]");
    let pos = (n - 1) as f64 * q;
    let k = pos.floor() as usize;
    let frac = pos - k as f64;
    let cmp = |a : &f64, b : &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    let (_, lo, upper) = values.select_nth_unstable_by(k, cmp);
    let lo = *lo;
    if frac == 0.0 || upper.is_empty() {
        return lo;
    }
    let hi = upper.iter().cloned().fold(f64::INFINITY, f64::min);
    lo + frac * (hi - lo)
}
