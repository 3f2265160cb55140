//! Report composer: turns descriptive, tally and inferential outputs into a
//! [`StatisticalAnalysisResult`] with deterministic prose.

use crate::DomainError;
use evalgate_significance::{Inference, SignificanceError};
use evalgate_types::{
    ANALYSIS_SCHEMA_V1, AnalysisStatus, DateRange, DescriptiveStats, MIN_INFERENTIAL_SAMPLE,
    StatisticalAnalysisResult, System, TallyCounts,
};

/// Assemble the final report.
///
/// Insufficient data and zero-variance failures become a partial report with
/// an explanatory conclusion; any other inferential failure is returned.
pub fn compose(
    ai: DescriptiveStats,
    baseline: DescriptiveStats,
    tally: TallyCounts,
    inference: Result<Inference, SignificanceError>,
    data_range: &DateRange,
) -> Result<StatisticalAnalysisResult, DomainError> {
    let mut report = StatisticalAnalysisResult {
        schema: ANALYSIS_SCHEMA_V1.to_string(),
        status: AnalysisStatus::Complete,
        ai,
        baseline,
        mean_difference: ai.mean - baseline.mean,
        ai_confidence_interval: None,
        baseline_confidence_interval: None,
        mean_difference_interval: None,
        t_test: None,
        effect_size: None,
        tally,
        ai_win_rate: tally.ai_win_rate(),
        conclusion: String::new(),
        journal_statement: String::new(),
        warnings: Vec::new(),
        data_range: data_range.as_report_range(),
    };

    match inference {
        Ok(inf) => {
            report.conclusion = conclusion(&ai, &baseline, &inf);
            report.journal_statement = journal_statement(&ai, &baseline, &inf);
            report.warnings = inf.warnings.iter().map(ToString::to_string).collect();
            report.mean_difference = inf.mean_difference;
            report.ai_confidence_interval = Some(inf.ai_interval);
            report.baseline_confidence_interval = Some(inf.baseline_interval);
            report.mean_difference_interval = Some(inf.mean_difference_interval);
            report.t_test = Some(inf.t_test);
            report.effect_size = Some(inf.effect_size);
        }
        Err(SignificanceError::InsufficientData { .. }) => {
            tracing::info!(
                ai_n = ai.sample_size,
                baseline_n = baseline.sample_size,
                "not enough data for inferential statistics; returning partial report"
            );
            report.status = AnalysisStatus::InsufficientData;
            report.conclusion = format!(
                "Not enough data for a statistical comparison yet: the AI system has {} scored response(s) and the baseline system has {}; at least {MIN_INFERENTIAL_SAMPLE} per system are required.",
                ai.sample_size, baseline.sample_size,
            );
            report.journal_statement = format!(
                "Inferential statistics were not computed because each group requires at least {MIN_INFERENTIAL_SAMPLE} observations (AI n = {}, baseline n = {}).",
                ai.sample_size, baseline.sample_size,
            );
        }
        Err(SignificanceError::ZeroVariance { .. }) => {
            tracing::info!(
                ai_mean = ai.mean,
                baseline_mean = baseline.mean,
                "both groups are constant with different means; returning partial report"
            );
            report.status = AnalysisStatus::Degenerate;
            report.conclusion = format!(
                "Every AI response scored {:.2} and every baseline response scored {:.2}; with no variation in either group a t-test and effect size cannot be computed.",
                ai.mean, baseline.mean,
            );
            report.journal_statement = format!(
                "An independent-samples t-test could not be computed because both groups have zero variance (AI M = {:.2}, baseline M = {:.2}).",
                ai.mean, baseline.mean,
            );
        }
        Err(other) => return Err(other.into()),
    }

    Ok(report)
}

/// Deterministic plain-language summary: which system had the higher mean,
/// whether the difference is significant, and how large it is.
pub fn conclusion(ai: &DescriptiveStats, baseline: &DescriptiveStats, inf: &Inference) -> String {
    let diff = inf.mean_difference;
    let lead = if diff == 0.0 {
        format!(
            "The AI and baseline systems achieved the same mean score ({:.2}).",
            ai.mean
        )
    } else {
        let (hi, lo, hi_mean, lo_mean) = if diff > 0.0 {
            (System::Ai, System::Baseline, ai.mean, baseline.mean)
        } else {
            (System::Baseline, System::Ai, baseline.mean, ai.mean)
        };
        format!(
            "The {hi} system achieved a higher mean score than the {lo} system ({hi_mean:.2} vs {lo_mean:.2}, a difference of {:.2} points).",
            diff.abs()
        )
    };

    let significance = if inf.t_test.is_significant {
        "statistically significant"
    } else {
        "not statistically significant"
    };

    format!(
        "{lead} The difference is {significance} ({p}) with a {effect} effect size (Cohen's d = {d:.2}).",
        p = format_p(inf.t_test.p_value),
        effect = inf.effect_size.interpretation.label(),
        d = inf.effect_size.cohens_d,
    )
}

/// APA-7 style results sentence.
pub fn journal_statement(
    ai: &DescriptiveStats,
    baseline: &DescriptiveStats,
    inf: &Inference,
) -> String {
    let t = &inf.t_test;
    format!(
        "An independent-samples t-test revealed a {sig} difference between the AI system (M = {am:.2}, SD = {asd:.2}) and the baseline system (M = {bm:.2}, SD = {bsd:.2}), t({df}) = {t:.2}, {p}, Cohen's d = {d:.2}.",
        sig = if t.is_significant {
            "significant"
        } else {
            "non-significant"
        },
        am = ai.mean,
        asd = ai.std_dev,
        bm = baseline.mean,
        bsd = baseline.std_dev,
        df = format_df(t.degrees_of_freedom),
        t = t.t_statistic,
        p = format_p(t.p_value),
        d = inf.effect_size.cohens_d,
    )
}

/// `p < .001` below one in a thousand, otherwise three decimals without the
/// leading zero.
pub fn format_p(p: f64) -> String {
    if p < 0.001 {
        return "p < .001".to_string();
    }
    let s = format!("{p:.3}");
    match s.strip_prefix('0') {
        Some(rest) => format!("p = {rest}"),
        None => format!("p = {s}"),
    }
}

/// Integral df print bare (pooled or balanced designs), Welch df get two decimals.
pub fn format_df(df: f64) -> String {
    if (df - df.round()).abs() < 1e-9 {
        format!("{df:.0}")
    } else {
        format!("{df:.2}")
    }
}
