//! Inferential statistics for comparing the AI system against the baseline.
//!
//! Sign convention everywhere: group 1 is the AI system, group 2 the
//! baseline, so a positive t statistic, Cohen's d or mean difference means
//! the AI system scored higher.
//!
//! The t-test is Welch's (unequal variances). Degrees of freedom are kept as
//! real numbers; rounding is a display concern.

mod distribution;
mod effect;
mod interval;

pub use distribution::{is_significant, t_critical, two_tailed_p};
pub use effect::{cohens_d, describe_effect, effect_size, interpret, pooled_std_dev};
pub use interval::{mean_confidence_interval, mean_difference_interval};

use evalgate_stats::{mean, sample_variance};
use evalgate_types::{
    ConfidenceInterval, EffectSize, MeanDifferenceInterval, System, TTestResult,
    MIN_INFERENTIAL_SAMPLE, SIGNIFICANCE_LEVEL,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignificanceError {
    #[error("{group} sample has {actual} observation(s); at least {required} are required")]
    InsufficientData {
        group: System,
        actual: usize,
        required: usize,
    },

    #[error(
        "both samples have zero variance but their means differ by {mean_difference}; the t statistic is unbounded"
    )]
    ZeroVariance { mean_difference: f64 },

    #[error("no t distribution with {degrees_of_freedom} degrees of freedom")]
    InvalidDistribution { degrees_of_freedom: f64 },
}

/// Sample size, mean and unbiased variance of a group with at least two observations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Moments {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
}

impl Moments {
    pub(crate) fn of(sample: &[f64], group: System) -> Result<Self, SignificanceError> {
        if sample.len() < MIN_INFERENTIAL_SAMPLE {
            return Err(SignificanceError::InsufficientData {
                group,
                actual: sample.len(),
                required: MIN_INFERENTIAL_SAMPLE,
            });
        }
        Ok(Self {
            n: sample.len(),
            mean: mean(sample),
            variance: sample_variance(sample),
        })
    }

    /// Squared standard error of the mean.
    fn sem_squared(&self) -> f64 {
        self.variance / self.n as f64
    }
}

/// Welch's standard error and degrees of freedom for a pair of groups.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct WelchTerms {
    pub standard_error: f64,
    pub degrees_of_freedom: f64,
}

impl WelchTerms {
    pub(crate) fn of(ai: &Moments, baseline: &Moments) -> Result<Self, SignificanceError> {
        let a = ai.sem_squared();
        let b = baseline.sem_squared();
        let se2 = a + b;

        if se2 == 0.0 {
            // Welch–Satterthwaite is 0/0 here; both groups are constant so
            // the pooled df is the only meaningful value.
            return Ok(Self {
                standard_error: 0.0,
                degrees_of_freedom: (ai.n + baseline.n - 2) as f64,
            });
        }

        // (a + b)^2 / (a^2/(n1-1) + b^2/(n2-1)), with a and b rescaled by
        // their sum so tiny variances cannot underflow the denominator.
        let (wa, wb) = (a / se2, b / se2);
        let denom = wa.powi(2) / (ai.n - 1) as f64 + wb.powi(2) / (baseline.n - 1) as f64;
        let degrees_of_freedom = 1.0 / denom;
        if !degrees_of_freedom.is_finite() || degrees_of_freedom <= 0.0 {
            return Err(SignificanceError::InvalidDistribution { degrees_of_freedom });
        }

        Ok(Self {
            standard_error: se2.sqrt(),
            degrees_of_freedom,
        })
    }
}

/// Two-tailed Welch's t-test of `ai` against `baseline`.
///
/// When both groups have zero variance and equal means the statistic is
/// defined as `t = 0`, `p = 1`. Zero variance with different means is a
/// [`SignificanceError::ZeroVariance`].
pub fn welch_t_test(ai: &[f64], baseline: &[f64]) -> Result<TTestResult, SignificanceError> {
    let a = Moments::of(ai, System::Ai)?;
    let b = Moments::of(baseline, System::Baseline)?;
    let terms = WelchTerms::of(&a, &b)?;
    t_test_from_terms(&a, &b, &terms)
}

fn t_test_from_terms(
    ai: &Moments,
    baseline: &Moments,
    terms: &WelchTerms,
) -> Result<TTestResult, SignificanceError> {
    let mean_difference = ai.mean - baseline.mean;

    let (t_statistic, p_value) = if terms.standard_error == 0.0 {
        if mean_difference != 0.0 {
            return Err(SignificanceError::ZeroVariance { mean_difference });
        }
        (0.0, 1.0)
    } else {
        let t = mean_difference / terms.standard_error;
        (t, two_tailed_p(t, terms.degrees_of_freedom)?)
    };

    Ok(TTestResult {
        t_statistic,
        degrees_of_freedom: terms.degrees_of_freedom,
        p_value,
        is_significant: is_significant(p_value),
        significance_level: SIGNIFICANCE_LEVEL,
    })
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InferenceOptions {
    /// A positive standard error or pooled standard deviation below this is
    /// reported as numerically unstable.
    pub instability_threshold: f64,
}

pub const DEFAULT_INSTABILITY_THRESHOLD: f64 = 1e-6;

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            instability_threshold: DEFAULT_INSTABILITY_THRESHOLD,
        }
    }
}

/// Non-fatal: the result is kept, but callers should treat it with care.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NumericalWarning {
    SmallStandardError {
        standard_error: f64,
        t_statistic: f64,
    },
    SmallPooledStdDev {
        pooled_std_dev: f64,
        cohens_d: f64,
    },
}

impl std::fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericalWarning::SmallStandardError {
                standard_error,
                t_statistic,
            } => write!(
                f,
                "numerical instability: Welch standard error {standard_error:e} is near zero (t = {t_statistic:e})"
            ),
            NumericalWarning::SmallPooledStdDev {
                pooled_std_dev,
                cohens_d,
            } => write!(
                f,
                "numerical instability: pooled standard deviation {pooled_std_dev:e} is near zero (d = {cohens_d:e})"
            ),
        }
    }
}

/// Everything the inferential module produces for one pair of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub t_test: TTestResult,
    pub effect_size: EffectSize,
    pub ai_interval: ConfidenceInterval,
    pub baseline_interval: ConfidenceInterval,
    pub mean_difference: f64,
    pub mean_difference_interval: MeanDifferenceInterval,
    pub warnings: Vec<NumericalWarning>,
}

/// Run the t-test, effect size and all three confidence intervals.
///
/// Fails with [`SignificanceError::InsufficientData`] when either sample has
/// fewer than two observations.
pub fn infer(
    ai: &[f64],
    baseline: &[f64],
    opts: &InferenceOptions,
) -> Result<Inference, SignificanceError> {
    let a = Moments::of(ai, System::Ai)?;
    let b = Moments::of(baseline, System::Baseline)?;
    let terms = WelchTerms::of(&a, &b)?;

    let t_test = t_test_from_terms(&a, &b, &terms)?;
    let pooled = effect::pooled_from_moments(&a, &b);
    let d = effect::cohens_d_from_moments(&a, &b, pooled)?;

    let mut warnings = Vec::new();
    let threshold = opts.instability_threshold;
    if terms.standard_error > 0.0 && terms.standard_error < threshold {
        warnings.push(NumericalWarning::SmallStandardError {
            standard_error: terms.standard_error,
            t_statistic: t_test.t_statistic,
        });
    }
    if pooled > 0.0 && pooled < threshold {
        warnings.push(NumericalWarning::SmallPooledStdDev {
            pooled_std_dev: pooled,
            cohens_d: d,
        });
    }
    for w in &warnings {
        tracing::warn!(warning = %w, "inferential statistics may be unreliable");
    }

    Ok(Inference {
        t_test,
        effect_size: effect_size(d),
        ai_interval: interval::from_moments(&a)?,
        baseline_interval: interval::from_moments(&b)?,
        mean_difference: a.mean - b.mean,
        mean_difference_interval: interval::difference_from_terms(&a, &b, &terms)?,
        warnings,
    })
}
