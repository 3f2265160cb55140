//! Shared types for evalgate.
//!
//! Design goal: versioned, explicit, boring.
//! Records come in from a store, statistics and analysis reports go out to
//! exporters and dashboards. JSON field names are part of the contract.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub const STATISTICS_SCHEMA_V1: &str = "evalgate.statistics.v1";
pub const ANALYSIS_SCHEMA_V1: &str = "evalgate.analysis.v1";

/// Two-tailed alpha for every hypothesis test. Not configurable.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Coverage of every reported confidence interval.
pub const CONFIDENCE_LEVEL: f64 = 1.0 - SIGNIFICANCE_LEVEL;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Inferential statistics need at least this many observations per group.
pub const MIN_INFERENTIAL_SAMPLE: usize = 2;

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Accuracy,
    Relevance,
    Actionability,
    Clarity,
    Completeness,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Accuracy,
        Criterion::Relevance,
        Criterion::Actionability,
        Criterion::Clarity,
        Criterion::Completeness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Accuracy => "accuracy",
            Criterion::Relevance => "relevance",
            Criterion::Actionability => "actionability",
            Criterion::Clarity => "clarity",
            Criterion::Completeness => "completeness",
        }
    }
}

/// The five sub-criteria a single response is graded on, each in `[0, 100]`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriteriaScores {
    pub accuracy: f64,
    pub relevance: f64,
    pub actionability: f64,
    pub clarity: f64,
    pub completeness: f64,
}

impl CriteriaScores {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Accuracy => self.accuracy,
            Criterion::Relevance => self.relevance,
            Criterion::Actionability => self.actionability,
            Criterion::Clarity => self.clarity,
            Criterion::Completeness => self.completeness,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        Criterion::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Which response generator a score belongs to.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum System {
    Ai,
    Baseline,
}

impl System {
    pub fn key(self) -> &'static str {
        match self {
            System::Ai => "ai",
            System::Baseline => "baseline",
        }
    }

    /// Human-facing name used in generated prose.
    pub fn label(self) -> &'static str {
        match self {
            System::Ai => "AI",
            System::Baseline => "baseline",
        }
    }
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One evaluated question/response pair.
///
/// Records are created once when an evaluation completes and never mutated.
/// Overall scores are already aggregated upstream; evalgate never re-derives
/// them from the sub-criteria.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub id: String,

    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub created_at: OffsetDateTime,

    pub ai_scores: CriteriaScores,
    pub baseline_scores: CriteriaScores,

    pub ai_overall_score: f64,
    pub baseline_overall_score: f64,
}

impl ComparisonRecord {
    pub fn overall(&self, system: System) -> f64 {
        match system {
            System::Ai => self.ai_overall_score,
            System::Baseline => self.baseline_overall_score,
        }
    }

    pub fn scores(&self, system: System) -> &CriteriaScores {
        match system {
            System::Ai => &self.ai_scores,
            System::Baseline => &self.baseline_scores,
        }
    }

    /// Check every score against `[MIN_SCORE, MAX_SCORE]`.
    ///
    /// NaN and infinities are rejected as out of range.
    pub fn validate(&self) -> Result<(), ScoreRangeError> {
        for system in [System::Ai, System::Baseline] {
            self.check(format!("{}OverallScore", system.key()), self.overall(system))?;
            for (criterion, value) in self.scores(system).iter() {
                self.check(
                    format!("{}Scores.{}", system.key(), criterion.as_str()),
                    value,
                )?;
            }
        }
        Ok(())
    }

    fn check(&self, field: String, value: f64) -> Result<(), ScoreRangeError> {
        if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(())
        } else {
            Err(ScoreRangeError {
                record_id: self.id.clone(),
                field,
                value,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("record {record_id}: {field} = {value} is outside the valid score range [0, 100]")]
pub struct ScoreRangeError {
    pub record_id: String,
    pub field: String,
    pub value: f64,
}

/// Inclusive `createdAt` filter. Either bound may be open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DateRange {
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub start: Option<OffsetDateTime>,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub end: Option<OffsetDateTime>,
}

impl DateRange {
    pub fn new(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
    }

    /// `None` when unfiltered, so reports can omit the field.
    pub fn as_report_range(&self) -> Option<DateRange> {
        if self.is_unbounded() {
            None
        } else {
            Some(self.clone())
        }
    }
}

// ----------------------------
// Derived statistics
// ----------------------------

/// Summary of one sample.
///
/// `mean` and `median` are 0 for an empty sample and `std_dev` is 0 below two
/// observations; check `sample_size` before trusting them.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    pub sample_size: usize,
    pub mean: f64,
    pub median: f64,

    /// Sample standard deviation (divisor `n - 1`).
    pub std_dev: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TTestResult {
    pub t_statistic: f64,

    /// Welch–Satterthwaite degrees of freedom, unrounded.
    pub degrees_of_freedom: f64,

    /// Two-tailed.
    pub p_value: f64,
    pub is_significant: bool,
    pub significance_level: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeInterpretation {
    Negligible,
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl EffectSizeInterpretation {
    pub fn label(self) -> &'static str {
        match self {
            EffectSizeInterpretation::Negligible => "negligible",
            EffectSizeInterpretation::Small => "small",
            EffectSizeInterpretation::Medium => "medium",
            EffectSizeInterpretation::Large => "large",
            EffectSizeInterpretation::VeryLarge => "very large",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EffectSize {
    /// Positive means the AI system scored higher than the baseline.
    pub cohens_d: f64,
    pub interpretation: EffectSizeInterpretation,
    pub description: String,
}

/// Confidence interval for one group's mean.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

/// Confidence interval for `mean(ai) - mean(baseline)`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MeanDifferenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOutcome {
    AiWins,
    BaselineWins,
    Tie,
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TallyCounts {
    pub ai_wins: usize,
    pub baseline_wins: usize,
    pub ties: usize,
}

impl TallyCounts {
    pub fn total(&self) -> usize {
        self.ai_wins + self.baseline_wins + self.ties
    }

    /// `ai_wins / total`, or 0 when nothing was compared.
    pub fn ai_win_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.ai_wins as f64 / n as f64,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every inferential statistic was computed.
    Complete,

    /// A group had fewer than [`MIN_INFERENTIAL_SAMPLE`] observations.
    InsufficientData,

    /// Both groups have zero variance but different means, so the t-test is undefined.
    Degenerate,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalAnalysisResult {
    pub schema: String,
    pub status: AnalysisStatus,

    pub ai: DescriptiveStats,
    pub baseline: DescriptiveStats,

    /// `ai.mean - baseline.mean`.
    pub mean_difference: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_confidence_interval: Option<ConfidenceInterval>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_confidence_interval: Option<ConfidenceInterval>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_difference_interval: Option<MeanDifferenceInterval>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_test: Option<TTestResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<EffectSize>,

    pub tally: TallyCounts,
    pub ai_win_rate: f64,

    pub conclusion: String,
    pub journal_statement: String,

    /// Non-fatal numerical issues noticed while computing the report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_range: Option<DateRange>,
}

impl StatisticalAnalysisResult {
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

/// Per-system aggregate of the overall score and each sub-criterion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GroupSummary {
    pub overall: DescriptiveStats,
    pub criteria: BTreeMap<Criterion, DescriptiveStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStatistics {
    pub schema: String,

    pub total_comparisons: usize,
    pub ai_wins: usize,
    pub baseline_wins: usize,
    pub ties: usize,

    /// `ai_wins / total_comparisons`, 0 when there are no comparisons.
    pub ai_win_rate: f64,

    /// Tie tolerance the tally was computed with.
    pub tie_epsilon: f64,

    pub ai: GroupSummary,
    pub baseline: GroupSummary,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_range: Option<DateRange>,
}

// ----------------------------
// Optional config file schema
// ----------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct AnalysisConfig {
    /// Absolute score difference below which a pair counts as a tie.
    /// Omitted means exact equality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tie_epsilon: Option<f64>,

    /// Standard errors below this (but above zero) are flagged as numerically unstable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instability_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct DefaultsConfig {
    /// Path to the records file (JSON array or JSON Lines).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn scores(v: f64) -> CriteriaScores {
        CriteriaScores {
            accuracy: v,
            relevance: v,
            actionability: v,
            clarity: v,
            completeness: v,
        }
    }

    fn record(ai: f64, baseline: f64) -> ComparisonRecord {
        ComparisonRecord {
            id: "rec-1".into(),
            created_at: datetime!(2024-03-01 12:00 UTC),
            ai_scores: scores(ai),
            baseline_scores: scores(baseline),
            ai_overall_score: ai,
            baseline_overall_score: baseline,
        }
    }

    #[test]
    fn record_json_uses_camel_case_fields() {
        let json = serde_json::to_value(record(80.0, 60.0)).unwrap();
        assert_eq!(json["createdAt"], "2024-03-01T12:00:00Z");
        assert_eq!(json["aiOverallScore"], 80.0);
        assert_eq!(json["baselineScores"]["actionability"], 60.0);
    }

    #[test]
    fn record_parses_from_upstream_json() {
        let raw = r#"{
            "id": "abc",
            "createdAt": "2024-05-06T07:08:09+02:00",
            "aiScores": {"accuracy": 90, "relevance": 80, "actionability": 70, "clarity": 60, "completeness": 50},
            "baselineScores": {"accuracy": 10, "relevance": 20, "actionability": 30, "clarity": 40, "completeness": 50},
            "aiOverallScore": 70.0,
            "baselineOverallScore": 30.0
        }"#;
        let rec: ComparisonRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.ai_scores.get(Criterion::Clarity), 60.0);
        assert_eq!(rec.overall(System::Baseline), 30.0);
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_overall() {
        let err = record(100.5, 50.0).validate().unwrap_err();
        assert_eq!(err.field, "aiOverallScore");
        assert_eq!(err.record_id, "rec-1");
    }

    #[test]
    fn validate_rejects_out_of_range_criterion() {
        let mut rec = record(50.0, 50.0);
        rec.baseline_scores.clarity = -0.1;
        let err = rec.validate().unwrap_err();
        assert_eq!(err.field, "baselineScores.clarity");
    }

    #[test]
    fn validate_rejects_nan() {
        let mut rec = record(50.0, 50.0);
        rec.ai_scores.accuracy = f64::NAN;
        assert!(rec.validate().is_err());
    }

    #[test]
    fn validate_accepts_bounds() {
        assert!(record(0.0, 100.0).validate().is_ok());
    }

    #[test]
    fn date_range_is_inclusive() {
        let range = DateRange::new(
            Some(datetime!(2024-01-01 00:00 UTC)),
            Some(datetime!(2024-01-31 00:00 UTC)),
        );
        assert!(range.contains(datetime!(2024-01-01 00:00 UTC)));
        assert!(range.contains(datetime!(2024-01-31 00:00 UTC)));
        assert!(!range.contains(datetime!(2024-01-31 00:00:01 UTC)));
        assert!(DateRange::default().contains(datetime!(1999-01-01 00:00 UTC)));
    }

    #[test]
    fn unbounded_range_is_omitted_from_reports() {
        assert_eq!(DateRange::default().as_report_range(), None);
        let json = serde_json::to_value(DateRange::new(
            Some(datetime!(2024-01-01 00:00 UTC)),
            None,
        ))
        .unwrap();
        assert_eq!(json, serde_json::json!({"start": "2024-01-01T00:00:00Z"}));
    }

    #[test]
    fn outcome_serializes_screaming_snake() {
        let s = serde_json::to_string(&ComparisonOutcome::BaselineWins).unwrap();
        assert_eq!(s, "\"BASELINE_WINS\"");
    }

    #[test]
    fn empty_tally_has_zero_win_rate() {
        assert_eq!(TallyCounts::default().ai_win_rate(), 0.0);
        let t = TallyCounts {
            ai_wins: 3,
            baseline_wins: 1,
            ties: 0,
        };
        assert_eq!(t.ai_win_rate(), 0.75);
    }

    #[test]
    fn config_parses_from_toml() {
        let cfg: ConfigFile = toml::from_str(
            r#"
            [analysis]
            tie_epsilon = 0.5

            [defaults]
            records = "records.jsonl"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.tie_epsilon, Some(0.5));
        assert_eq!(cfg.analysis.instability_threshold, None);
        assert_eq!(cfg.defaults.records.as_deref(), Some("records.jsonl"));
    }

    #[test]
    fn empty_config_is_default() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn very_large_label_has_a_space() {
        assert_eq!(EffectSizeInterpretation::VeryLarge.label(), "very large");
        let s = serde_json::to_string(&EffectSizeInterpretation::VeryLarge).unwrap();
        assert_eq!(s, "\"very_large\"");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn in_range_scores_always_validate(ai in 0.0f64..=100.0, baseline in 0.0f64..=100.0) {
                prop_assert!(record(ai, baseline).validate().is_ok());
            }

            #[test]
            fn above_range_scores_never_validate(ai in 100.000001f64..1e6) {
                prop_assert!(record(ai, 50.0).validate().is_err());
            }
        }
    }
}
