//! Export use case for converting reports to CSV or JSONL.
//!
//! Rows are flat so the output can be loaded straight into a spreadsheet or a
//! time-series store for trend tracking across reporting windows.

use evalgate_types::{
    AnalysisStatus, ComparisonStatistics, ConfidenceInterval, DescriptiveStats,
    StatisticalAnalysisResult, System,
};
use std::str::FromStr;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RFC 4180 CSV with header row.
    Csv,
    /// JSON Lines (one JSON object per line).
    Jsonl,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "jsonl" => Ok(ExportFormat::Jsonl),
            other => Err(format!("unknown export format {other:?} (expected csv|jsonl)")),
        }
    }
}

/// One row per system plus a `difference` row carrying the test results.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnalysisExportRow {
    pub group: String,
    pub status: String,
    pub sample_size: Option<usize>,
    pub mean: f64,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub t_statistic: Option<f64>,
    pub degrees_of_freedom: Option<f64>,
    pub p_value: Option<f64>,
    pub cohens_d: Option<f64>,
}

/// One row per system and metric (`overall` or a criterion).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatisticsExportRow {
    pub system: String,
    pub metric: String,
    pub sample_size: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

pub struct ExportUseCase;

impl ExportUseCase {
    pub fn export_analysis(
        report: &StatisticalAnalysisResult,
        format: ExportFormat,
    ) -> anyhow::Result<String> {
        let rows = Self::analysis_to_rows(report);
        match format {
            ExportFormat::Csv => Ok(Self::analysis_rows_to_csv(&rows)),
            ExportFormat::Jsonl => to_jsonl(&rows),
        }
    }

    pub fn export_statistics(
        stats: &ComparisonStatistics,
        format: ExportFormat,
    ) -> anyhow::Result<String> {
        let rows = Self::statistics_to_rows(stats);
        match format {
            ExportFormat::Csv => Ok(Self::statistics_rows_to_csv(&rows)),
            ExportFormat::Jsonl => to_jsonl(&rows),
        }
    }

    fn analysis_to_rows(report: &StatisticalAnalysisResult) -> Vec<AnalysisExportRow> {
        let status = status_to_string(report.status).to_string();

        let group = |system: System, stats: &DescriptiveStats, ci: Option<&ConfidenceInterval>| {
            AnalysisExportRow {
                group: system.key().to_string(),
                status: status.clone(),
                sample_size: Some(stats.sample_size),
                mean: stats.mean,
                median: Some(stats.median),
                std_dev: Some(stats.std_dev),
                ci_lower: ci.map(|c| c.lower),
                ci_upper: ci.map(|c| c.upper),
                t_statistic: None,
                degrees_of_freedom: None,
                p_value: None,
                cohens_d: None,
            }
        };

        let mut rows = vec![
            group(
                System::Ai,
                &report.ai,
                report.ai_confidence_interval.as_ref(),
            ),
            group(
                System::Baseline,
                &report.baseline,
                report.baseline_confidence_interval.as_ref(),
            ),
        ];

        rows.push(AnalysisExportRow {
            group: "difference".to_string(),
            status,
            sample_size: None,
            mean: report.mean_difference,
            median: None,
            std_dev: None,
            ci_lower: report.mean_difference_interval.as_ref().map(|c| c.lower),
            ci_upper: report.mean_difference_interval.as_ref().map(|c| c.upper),
            t_statistic: report.t_test.as_ref().map(|t| t.t_statistic),
            degrees_of_freedom: report.t_test.as_ref().map(|t| t.degrees_of_freedom),
            p_value: report.t_test.as_ref().map(|t| t.p_value),
            cohens_d: report.effect_size.as_ref().map(|e| e.cohens_d),
        });

        rows
    }

    /// Sorted by system, then metric name.
    fn statistics_to_rows(stats: &ComparisonStatistics) -> Vec<StatisticsExportRow> {
        let mut rows = Vec::new();
        for (system, summary) in [(System::Ai, &stats.ai), (System::Baseline, &stats.baseline)] {
            let row = |metric: &str, d: &DescriptiveStats| StatisticsExportRow {
                system: system.key().to_string(),
                metric: metric.to_string(),
                sample_size: d.sample_size,
                mean: d.mean,
                median: d.median,
                std_dev: d.std_dev,
            };
            rows.push(row("overall", &summary.overall));
            for (criterion, d) in &summary.criteria {
                rows.push(row(criterion.as_str(), d));
            }
        }

        rows.sort_by(|a, b| (&a.system, &a.metric).cmp(&(&b.system, &b.metric)));
        rows
    }

    fn analysis_rows_to_csv(rows: &[AnalysisExportRow]) -> String {
        let mut output = String::from(
            "group,status,sample_size,mean,median,std_dev,ci_lower,ci_upper,t_statistic,degrees_of_freedom,p_value,cohens_d\n",
        );

        for row in rows {
            let fields = [
                csv_escape(&row.group),
                csv_escape(&row.status),
                row.sample_size.map_or(String::new(), |n| n.to_string()),
                format!("{:.6}", row.mean),
                opt_f64(row.median),
                opt_f64(row.std_dev),
                opt_f64(row.ci_lower),
                opt_f64(row.ci_upper),
                opt_f64(row.t_statistic),
                opt_f64(row.degrees_of_freedom),
                opt_f64(row.p_value),
                opt_f64(row.cohens_d),
            ];
            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }

    fn statistics_rows_to_csv(rows: &[StatisticsExportRow]) -> String {
        let mut output = String::from("system,metric,sample_size,mean,median,std_dev\n");

        for row in rows {
            output.push_str(&format!(
                "{},{},{},{:.6},{:.6},{:.6}\n",
                csv_escape(&row.system),
                csv_escape(&row.metric),
                row.sample_size,
                row.mean,
                row.median,
                row.std_dev,
            ));
        }

        output
    }
}

fn to_jsonl<T: serde::Serialize>(rows: &[T]) -> anyhow::Result<String> {
    let mut output = String::new();
    for row in rows {
        output.push_str(&serde_json::to_string(row)?);
        output.push('\n');
    }
    Ok(output)
}

fn status_to_string(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Complete => "complete",
        AnalysisStatus::InsufficientData => "insufficient_data",
        AnalysisStatus::Degenerate => "degenerate",
    }
}

fn opt_f64(v: Option<f64>) -> String {
    v.map_or(String::new(), |v| format!("{v:.6}"))
}

/// Escape a string for CSV per RFC 4180.
fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
