//! 95% confidence intervals from Student's t critical values (never z).

use crate::{Moments, SignificanceError, WelchTerms, t_critical};
use evalgate_types::{
    CONFIDENCE_LEVEL, ConfidenceInterval, MeanDifferenceInterval, SIGNIFICANCE_LEVEL, System,
};

/// `mean ± t(n-1) · sd / sqrt(n)`.
pub fn mean_confidence_interval(
    sample: &[f64],
    group: System,
) -> Result<ConfidenceInterval, SignificanceError> {
    from_moments(&Moments::of(sample, group)?)
}

pub(crate) fn from_moments(m: &Moments) -> Result<ConfidenceInterval, SignificanceError> {
    let tc = t_critical((m.n - 1) as f64, SIGNIFICANCE_LEVEL)?;
    let margin = tc * m.variance.sqrt() / (m.n as f64).sqrt();
    Ok(ConfidenceInterval {
        mean: m.mean,
        lower: m.mean - margin,
        upper: m.mean + margin,
        confidence: CONFIDENCE_LEVEL,
    })
}

/// `(m1 - m2) ± t(welch df) · sqrt(v1/n1 + v2/n2)`, sharing the t-test's df.
pub fn mean_difference_interval(
    ai: &[f64],
    baseline: &[f64],
) -> Result<MeanDifferenceInterval, SignificanceError> {
    let a = Moments::of(ai, System::Ai)?;
    let b = Moments::of(baseline, System::Baseline)?;
    let terms = WelchTerms::of(&a, &b)?;
    difference_from_terms(&a, &b, &terms)
}

pub(crate) fn difference_from_terms(
    a: &Moments,
    b: &Moments,
    terms: &WelchTerms,
) -> Result<MeanDifferenceInterval, SignificanceError> {
    let diff = a.mean - b.mean;
    let tc = t_critical(terms.degrees_of_freedom, SIGNIFICANCE_LEVEL)?;
    let margin = tc * terms.standard_error;
    Ok(MeanDifferenceInterval {
        lower: diff - margin,
        upper: diff + margin,
        confidence: CONFIDENCE_LEVEL,
    })
}
