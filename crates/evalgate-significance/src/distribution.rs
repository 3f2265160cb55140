//! Student's t distribution lookups.
//!
//! Both directions go through `statrs`, which evaluates the CDF via the
//! regularized incomplete beta function. From `LARGE_DF` upwards that
//! evaluation loses accuracy and slows down, so the t distribution is
//! reached from the standard normal with a Cornish–Fisher expansion.

use crate::SignificanceError;
use evalgate_types::SIGNIFICANCE_LEVEL;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Degrees of freedom at which the normal expansion takes over.
pub const LARGE_DF: f64 = 1e5;

fn standard_normal() -> Result<Normal, SignificanceError> {
    Normal::new(0.0, 1.0).map_err(|_| SignificanceError::InvalidDistribution {
        degrees_of_freedom: f64::INFINITY,
    })
}

/// Normal quantile `z` to t quantile, second order in `1 / df`.
fn cornish_fisher_t(z: f64, df: f64) -> f64 {
    let z3 = z.powi(3);
    let z5 = z.powi(5);
    z + (z3 + z) / (4.0 * df) + (5.0 * z5 + 16.0 * z3 + 3.0 * z) / (96.0 * df * df)
}

/// Inverse of `cornish_fisher_t` to the same order.
fn cornish_fisher_z(t: f64, df: f64) -> f64 {
    let t3 = t.powi(3);
    let t5 = t.powi(5);
    t - (t3 + t) / (4.0 * df) + (13.0 * t5 + 8.0 * t3 + 3.0 * t) / (96.0 * df * df)
}

fn standard_t(degrees_of_freedom: f64) -> Result<StudentsT, SignificanceError> {
    StudentsT::new(0.0, 1.0, degrees_of_freedom)
        .map_err(|_| SignificanceError::InvalidDistribution { degrees_of_freedom })
}

/// Two-tailed p-value for `t` under a Student's t with `degrees_of_freedom`.
pub fn two_tailed_p(t: f64, degrees_of_freedom: f64) -> Result<f64, SignificanceError> {
    let dist = standard_t(degrees_of_freedom)?;
    let tail = if degrees_of_freedom >= LARGE_DF {
        standard_normal()?.sf(cornish_fisher_z(t.abs(), degrees_of_freedom))
    } else {
        dist.sf(t.abs())
    };
    Ok((2.0 * tail).clamp(0.0, 1.0))
}

/// Two-tailed critical value: the `1 - alpha / 2` quantile.
pub fn t_critical(degrees_of_freedom: f64, alpha: f64) -> Result<f64, SignificanceError> {
    let dist = standard_t(degrees_of_freedom)?;
    let q = 1.0 - alpha / 2.0;
    if degrees_of_freedom >= LARGE_DF {
        let z = standard_normal()?.inverse_cdf(q);
        return Ok(cornish_fisher_t(z, degrees_of_freedom));
    }
    Ok(dist.inverse_cdf(q))
}

/// Strict: a p-value exactly at alpha is not significant.
pub fn is_significant(p_value: f64) -> bool {
    p_value < SIGNIFICANCE_LEVEL
}
