//! Domain logic for evalgate.
//!
//! This crate is intentionally I/O-free: it takes an owned snapshot of
//! comparison records and does math and prose. Every entry point is a pure
//! function of its inputs.

mod report;
mod tally;

pub use report::{compose, conclusion, format_df, format_p, journal_statement};
pub use tally::{TieTolerance, classify, tally, tally_records};

use evalgate_significance::{InferenceOptions, SignificanceError, infer};
use evalgate_stats::describe;
use evalgate_types::{
    ComparisonRecord, ComparisonStatistics, Criterion, DateRange, GroupSummary,
    STATISTICS_SCHEMA_V1, ScoreRangeError, StatisticalAnalysisResult, System,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    InvalidScoreRange(#[from] ScoreRangeError),

    #[error("insufficient data: {group} sample has {actual} observation(s), at least {required} required")]
    InsufficientData {
        group: System,
        actual: usize,
        required: usize,
    },

    #[error("t-test undefined: both groups have zero variance (mean difference {mean_difference})")]
    ZeroVariance { mean_difference: f64 },

    #[error(transparent)]
    Numerical(SignificanceError),

    #[error("tie tolerance must be finite and non-negative, got {0}")]
    InvalidTieTolerance(f64),
}

impl From<SignificanceError> for DomainError {
    fn from(err: SignificanceError) -> Self {
        match err {
            SignificanceError::InsufficientData {
                group,
                actual,
                required,
            } => DomainError::InsufficientData {
                group,
                actual,
                required,
            },
            SignificanceError::ZeroVariance { mean_difference } => {
                DomainError::ZeroVariance { mean_difference }
            }
            other => DomainError::Numerical(other),
        }
    }
}

/// Knobs shared by both engine entry points.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct AnalysisOptions {
    pub tie_tolerance: TieTolerance,
    pub inference: InferenceOptions,
}

/// Reject any record with a score outside `[0, 100]`.
pub fn validate_records(records: &[ComparisonRecord]) -> Result<(), DomainError> {
    for r in records {
        r.validate()?;
    }
    Ok(())
}

pub fn overall_scores(records: &[ComparisonRecord], system: System) -> Vec<f64> {
    records.iter().map(|r| r.overall(system)).collect()
}

fn group_summary(records: &[ComparisonRecord], system: System) -> GroupSummary {
    let criteria: BTreeMap<Criterion, _> = Criterion::ALL
        .into_iter()
        .map(|c| {
            let values: Vec<f64> = records.iter().map(|r| r.scores(system).get(c)).collect();
            (c, describe(&values))
        })
        .collect();

    GroupSummary {
        overall: describe(&overall_scores(records, system)),
        criteria,
    }
}

/// Descriptive aggregate and win/loss/tie tally.
///
/// Never fails on small or empty input; only out-of-range scores are errors.
pub fn compute_statistics(
    records: &[ComparisonRecord],
    data_range: &DateRange,
    opts: &AnalysisOptions,
) -> Result<ComparisonStatistics, DomainError> {
    validate_records(records)?;

    let counts = tally_records(records, opts.tie_tolerance);
    debug_assert_eq!(counts.total(), records.len());

    Ok(ComparisonStatistics {
        schema: STATISTICS_SCHEMA_V1.to_string(),
        total_comparisons: records.len(),
        ai_wins: counts.ai_wins,
        baseline_wins: counts.baseline_wins,
        ties: counts.ties,
        ai_win_rate: counts.ai_win_rate(),
        tie_epsilon: opts.tie_tolerance.epsilon(),
        ai: group_summary(records, System::Ai),
        baseline: group_summary(records, System::Baseline),
        data_range: data_range.as_report_range(),
    })
}

/// Full inferential analysis, strict: fails with
/// [`DomainError::InsufficientData`] when either group has fewer than two
/// records, and with [`DomainError::ZeroVariance`] when the t-test is undefined.
pub fn compute_statistical_analysis(
    records: &[ComparisonRecord],
    data_range: &DateRange,
    opts: &AnalysisOptions,
) -> Result<StatisticalAnalysisResult, DomainError> {
    validate_records(records)?;
    let ai = overall_scores(records, System::Ai);
    let baseline = overall_scores(records, System::Baseline);
    let inference = infer(&ai, &baseline, &opts.inference)?;
    run_composer(records, &ai, &baseline, Ok(inference), data_range, opts)
}

/// Full inferential analysis, graceful: insufficient or degenerate data
/// yields a partial report rather than an error, so a dashboard can show
/// "not enough data yet".
pub fn compose_report(
    records: &[ComparisonRecord],
    data_range: &DateRange,
    opts: &AnalysisOptions,
) -> Result<StatisticalAnalysisResult, DomainError> {
    validate_records(records)?;
    let ai = overall_scores(records, System::Ai);
    let baseline = overall_scores(records, System::Baseline);
    let inference = infer(&ai, &baseline, &opts.inference);
    run_composer(records, &ai, &baseline, inference, data_range, opts)
}

fn run_composer(
    records: &[ComparisonRecord],
    ai: &[f64],
    baseline: &[f64],
    inference: Result<evalgate_significance::Inference, SignificanceError>,
    data_range: &DateRange,
    opts: &AnalysisOptions,
) -> Result<StatisticalAnalysisResult, DomainError> {
    tracing::debug!(records = records.len(), "composing statistical analysis");
    compose(
        describe(ai),
        describe(baseline),
        tally_records(records, opts.tie_tolerance),
        inference,
        data_range,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use evalgate_types::{AnalysisStatus, CriteriaScores, EffectSizeInterpretation};
    use time::macros::datetime;

    fn flat(v: f64) -> CriteriaScores {
        CriteriaScores {
            accuracy: v,
            relevance: v,
            actionability: v,
            clarity: v,
            completeness: v,
        }
    }

    fn records(ai: &[f64], baseline: &[f64]) -> Vec<ComparisonRecord> {
        ai.iter()
            .zip(baseline)
            .enumerate()
            .map(|(i, (&a, &b))| ComparisonRecord {
                id: format!("r{i}"),
                created_at: datetime!(2024-06-01 00:00 UTC),
                ai_scores: flat(a),
                baseline_scores: flat(b),
                ai_overall_score: a,
                baseline_overall_score: b,
            })
            .collect()
    }

    const A: [f64; 5] = [80.0, 85.0, 90.0, 75.0, 95.0];
    const B: [f64; 5] = [60.0, 65.0, 70.0, 55.0, 75.0];

    #[test]
    fn statistics_on_known_values() {
        let s = compute_statistics(&records(&A, &B), &DateRange::default(), &Default::default())
            .unwrap();
        assert_eq!(s.total_comparisons, 5);
        assert_eq!(s.ai_wins, 5);
        assert_eq!(s.ai_win_rate, 1.0);
        assert_eq!(s.ai.overall.mean, 85.0);
        assert_eq!(s.baseline.overall.mean, 65.0);
        assert_eq!(s.ai.criteria[&Criterion::Clarity].median, 85.0);
        assert_eq!(s.ai.criteria.len(), 5);
    }

    #[test]
    fn analysis_on_known_values() {
        let r = compute_statistical_analysis(
            &records(&A, &B),
            &DateRange::default(),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(r.ai.mean, 85.0);
        assert_eq!(r.baseline.mean, 65.0);
        assert_eq!(r.mean_difference, 20.0);
        assert!(r.t_test.unwrap().is_significant);
        assert_eq!(r.tally.ai_wins, 5);
    }

    #[test]
    fn constant_identical_analysis() {
        let s = [70.0, 70.0, 70.0];
        let r =
            compute_statistical_analysis(&records(&s, &s), &DateRange::default(), &Default::default())
                .unwrap();
        let t = r.t_test.unwrap();
        assert_eq!(t.t_statistic, 0.0);
        assert_eq!(t.p_value, 1.0);
        assert!(!t.is_significant);
        let e = r.effect_size.unwrap();
        assert_eq!(e.cohens_d, 0.0);
        assert_eq!(e.interpretation, EffectSizeInterpretation::Negligible);
        assert_eq!(r.tally.ties, 3);
    }

    #[test]
    fn single_records_strict_fails_but_statistics_succeed() {
        let recs = records(&[90.0], &[60.0]);
        let err = compute_statistical_analysis(&recs, &DateRange::default(), &Default::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientData {
                actual: 1,
                required: 2,
                ..
            }
        ));

        let s = compute_statistics(&recs, &DateRange::default(), &Default::default()).unwrap();
        assert_eq!(s.ai.overall.sample_size, 1);
        assert_eq!(s.ai.overall.std_dev, 0.0);
        assert_eq!(s.baseline.overall.sample_size, 1);
        assert_eq!(s.baseline.overall.std_dev, 0.0);

        let partial = compose_report(&recs, &DateRange::default(), &Default::default()).unwrap();
        assert_eq!(partial.status, AnalysisStatus::InsufficientData);
    }

    #[test]
    fn empty_input_is_defined() {
        let s = compute_statistics(&[], &DateRange::default(), &Default::default()).unwrap();
        assert_eq!(s.total_comparisons, 0);
        assert_eq!(s.ai_win_rate, 0.0);
        let r = compose_report(&[], &DateRange::default(), &Default::default()).unwrap();
        assert_eq!(r.status, AnalysisStatus::InsufficientData);
        assert!(!r.mean_difference.is_nan());
    }

    #[test]
    fn out_of_range_score_is_rejected_everywhere() {
        let mut recs = records(&A, &B);
        recs[2].baseline_overall_score = 101.0;
        let opts = AnalysisOptions::default();
        let range = DateRange::default();
        for result in [
            compute_statistics(&recs, &range, &opts).map(|_| ()),
            compute_statistical_analysis(&recs, &range, &opts).map(|_| ()),
            compose_report(&recs, &range, &opts).map(|_| ()),
        ] {
            assert!(matches!(result, Err(DomainError::InvalidScoreRange(_))));
        }
    }

    #[test]
    fn tie_tolerance_flows_into_statistics() {
        let recs = records(&[75.0, 80.0], &[75.0001, 70.0]);
        let exact = compute_statistics(&recs, &DateRange::default(), &Default::default()).unwrap();
        assert_eq!((exact.ai_wins, exact.baseline_wins, exact.ties), (1, 1, 0));

        let opts = AnalysisOptions {
            tie_tolerance: TieTolerance::new(0.01).unwrap(),
            ..Default::default()
        };
        let fuzzy = compute_statistics(&recs, &DateRange::default(), &opts).unwrap();
        assert_eq!((fuzzy.ai_wins, fuzzy.baseline_wins, fuzzy.ties), (1, 0, 1));
        assert_eq!(fuzzy.tie_epsilon, 0.01);
    }

    #[test]
    fn data_range_passes_through() {
        let range = DateRange::new(Some(datetime!(2024-01-01 00:00 UTC)), None);
        let r = compose_report(&records(&A, &B), &range, &Default::default()).unwrap();
        assert_eq!(r.data_range, Some(range));
    }

    #[test]
    fn swapping_systems_is_symmetric() {
        let opts = AnalysisOptions::default();
        let range = DateRange::default();
        let fwd = compute_statistical_analysis(&records(&A, &B), &range, &opts).unwrap();
        let rev = compute_statistical_analysis(&records(&B, &A), &range, &opts).unwrap();
        assert_eq!(fwd.ai.mean, rev.baseline.mean);
        assert_eq!(fwd.mean_difference, -rev.mean_difference);
        let (ft, rt) = (fwd.t_test.unwrap(), rev.t_test.unwrap());
        assert_eq!(ft.t_statistic, -rt.t_statistic);
        assert_eq!(ft.p_value, rt.p_value);
        assert_relative_eq!(
            fwd.effect_size.unwrap().cohens_d,
            -rev.effect_size.unwrap().cohens_d
        );
    }
}
