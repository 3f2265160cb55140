//! Markdown renderings of analysis reports and statistics.

use evalgate_domain::{format_df, format_p};
use evalgate_types::{
    AnalysisStatus, ComparisonStatistics, ConfidenceInterval, Criterion, DateRange,
    DescriptiveStats, StatisticalAnalysisResult, System,
};
use std::fmt::Write as _;
use time::format_description::well_known::Rfc3339;

pub fn render_markdown(report: &StatisticalAnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(header(report));
    out.push_str("\n\n");

    if let Some(range) = &report.data_range {
        let _ = writeln!(out, "**Window:** {}\n", format_range(range));
    }

    out.push_str("| system | n | mean | median | std dev | 95% CI |\n");
    out.push_str("|---|---:|---:|---:|---:|---|\n");
    group_row(
        &mut out,
        System::Ai,
        &report.ai,
        report.ai_confidence_interval.as_ref(),
    );
    group_row(
        &mut out,
        System::Baseline,
        &report.baseline,
        report.baseline_confidence_interval.as_ref(),
    );

    let diff_ci = report
        .mean_difference_interval
        .as_ref()
        .map(|ci| format!("[{:.2}, {:.2}]", ci.lower, ci.upper))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "| difference | | {:+.2} | | | {diff_ci} |",
        report.mean_difference
    );

    if let (Some(t), Some(e)) = (&report.t_test, &report.effect_size) {
        out.push('\n');
        out.push_str("| t | df | p | Cohen's d | effect |\n");
        out.push_str("|---:|---:|---|---:|---|\n");
        let _ = writeln!(
            out,
            "| {:.2} | {} | {} | {:.2} | {} |",
            t.t_statistic,
            format_df(t.degrees_of_freedom),
            format_p(t.p_value),
            e.cohens_d,
            e.interpretation.label(),
        );
    }

    let _ = writeln!(
        out,
        "\n**Tally:** AI wins {}, baseline wins {}, ties {} (AI win rate {:.1}%)",
        report.tally.ai_wins,
        report.tally.baseline_wins,
        report.tally.ties,
        report.ai_win_rate * 100.0,
    );

    let _ = writeln!(out, "\n{}", report.conclusion);
    let _ = writeln!(out, "\n> {}", report.journal_statement);

    if !report.warnings.is_empty() {
        out.push_str("\n**Notes:**\n");
        for w in &report.warnings {
            let _ = writeln!(out, "- {w}");
        }
    }

    out
}

pub fn render_statistics_markdown(stats: &ComparisonStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "📊 evalgate: {} comparison(s)\n",
        stats.total_comparisons
    );

    if let Some(range) = &stats.data_range {
        let _ = writeln!(out, "**Window:** {}\n", format_range(range));
    }

    let _ = writeln!(
        out,
        "**Tally:** AI wins {}, baseline wins {}, ties {} (AI win rate {:.1}%)\n",
        stats.ai_wins,
        stats.baseline_wins,
        stats.ties,
        stats.ai_win_rate * 100.0,
    );

    out.push_str("| metric | AI mean | AI median | AI sd | baseline mean | baseline median | baseline sd |\n");
    out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");

    metric_row(&mut out, "overall", &stats.ai.overall, &stats.baseline.overall);
    for c in Criterion::ALL {
        if let (Some(a), Some(b)) = (stats.ai.criteria.get(&c), stats.baseline.criteria.get(&c)) {
            metric_row(&mut out, c.as_str(), a, b);
        }
    }

    out
}

fn header(report: &StatisticalAnalysisResult) -> &'static str {
    match report.status {
        AnalysisStatus::InsufficientData => "⏳ evalgate: not enough data",
        AnalysisStatus::Degenerate => "⚠️ evalgate: no variation in scores",
        AnalysisStatus::Complete => match &report.t_test {
            Some(t) if t.is_significant && report.mean_difference > 0.0 => {
                "✅ evalgate: AI system ahead"
            }
            Some(t) if t.is_significant => "❌ evalgate: baseline system ahead",
            _ => "➖ evalgate: no significant difference",
        },
    }
}

fn group_row(
    out: &mut String,
    system: System,
    stats: &DescriptiveStats,
    ci: Option<&ConfidenceInterval>,
) {
    let ci = ci
        .map(|ci| format!("[{:.2}, {:.2}]", ci.lower, ci.upper))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "| {} | {} | {:.2} | {:.2} | {:.2} | {ci} |",
        system.label(),
        stats.sample_size,
        stats.mean,
        stats.median,
        stats.std_dev,
    );
}

fn metric_row(out: &mut String, name: &str, ai: &DescriptiveStats, baseline: &DescriptiveStats) {
    let _ = writeln!(
        out,
        "| `{name}` | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
        ai.mean, ai.median, ai.std_dev, baseline.mean, baseline.median, baseline.std_dev,
    );
}

fn format_range(range: &DateRange) -> String {
    let fmt = |ts: Option<time::OffsetDateTime>| match ts {
        Some(ts) => ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string()),
        None => "…".to_string(),
    };
    format!("{} to {}", fmt(range.start), fmt(range.end))
}
