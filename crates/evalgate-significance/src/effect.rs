//! Cohen's d with a pooled standard deviation.

use crate::{Moments, SignificanceError};
use evalgate_types::{EffectSize, EffectSizeInterpretation, System};

/// `sqrt(((n1-1)·v1 + (n2-1)·v2) / (n1+n2-2))`.
pub fn pooled_std_dev(ai: &[f64], baseline: &[f64]) -> Result<f64, SignificanceError> {
    let a = Moments::of(ai, System::Ai)?;
    let b = Moments::of(baseline, System::Baseline)?;
    Ok(pooled_from_moments(&a, &b))
}

pub(crate) fn pooled_from_moments(a: &Moments, b: &Moments) -> f64 {
    let num = (a.n - 1) as f64 * a.variance + (b.n - 1) as f64 * b.variance;
    (num / (a.n + b.n - 2) as f64).sqrt()
}

/// Signed Cohen's d; positive when the AI system's mean is higher.
///
/// Defined as 0 when both groups are constant with equal means.
pub fn cohens_d(ai: &[f64], baseline: &[f64]) -> Result<f64, SignificanceError> {
    let a = Moments::of(ai, System::Ai)?;
    let b = Moments::of(baseline, System::Baseline)?;
    cohens_d_from_moments(&a, &b, pooled_from_moments(&a, &b))
}

pub(crate) fn cohens_d_from_moments(
    a: &Moments,
    b: &Moments,
    pooled: f64,
) -> Result<f64, SignificanceError> {
    let mean_difference = a.mean - b.mean;
    if pooled == 0.0 {
        if mean_difference == 0.0 {
            return Ok(0.0);
        }
        return Err(SignificanceError::ZeroVariance { mean_difference });
    }
    Ok(mean_difference / pooled)
}

/// Bucket `|d|`: `<0.2` negligible, `[0.2, 0.5)` small, `[0.5, 0.8)` medium,
/// `[0.8, 1.2)` large, `>=1.2` very large.
pub fn interpret(cohens_d: f64) -> EffectSizeInterpretation {
    let m = cohens_d.abs();
    if m < 0.2 {
        EffectSizeInterpretation::Negligible
    } else if m < 0.5 {
        EffectSizeInterpretation::Small
    } else if m < 0.8 {
        EffectSizeInterpretation::Medium
    } else if m < 1.2 {
        EffectSizeInterpretation::Large
    } else {
        EffectSizeInterpretation::VeryLarge
    }
}

/// One sentence combining the bucket, the direction and the raw value.
pub fn describe_effect(cohens_d: f64, interpretation: EffectSizeInterpretation) -> String {
    if interpretation == EffectSizeInterpretation::Negligible {
        return format!(
            "The difference between the AI and baseline systems is negligible (Cohen's d = {cohens_d:.2})."
        );
    }
    let (winner, loser) = if cohens_d > 0.0 {
        (System::Ai, System::Baseline)
    } else {
        (System::Baseline, System::Ai)
    };
    format!(
        "The {winner} system outperforms the {loser} system with a {effect} effect (Cohen's d = {cohens_d:.2}).",
        effect = interpretation.label(),
    )
}

pub fn effect_size(cohens_d: f64) -> EffectSize {
    let interpretation = interpret(cohens_d);
    EffectSize {
        cohens_d,
        interpretation,
        description: describe_effect(cohens_d, interpretation),
    }
}
