//! Cross-crate tests: a records file on disk through the store, the use
//! cases, and every output surface.

use approx::assert_relative_eq;
use evalgate_adapters::{JsonFileStore, RecordStore};
use evalgate_app::{
    AnalysisRequest, AnalysisUseCase, ExportFormat, ExportUseCase, StatisticsRequest,
    StatisticsUseCase, render_markdown,
};
use evalgate_domain::{AnalysisOptions, compute_statistical_analysis};
use evalgate_significance::{t_critical, two_tailed_p, welch_t_test};
use evalgate_types::{AnalysisStatus, ComparisonRecord, CriteriaScores, DateRange};
use std::fs;
use std::io::Write;
use time::macros::datetime;

fn scores(accuracy: f64, rest: f64) -> CriteriaScores {
    CriteriaScores {
        accuracy,
        relevance: rest,
        actionability: rest,
        clarity: rest,
        completeness: rest,
    }
}

/// Twelve evaluations spread over March 2024, AI ahead on average.
fn march_records() -> Vec<ComparisonRecord> {
    let ai = [
        82.0, 77.5, 91.0, 68.0, 88.5, 79.0, 85.0, 73.5, 90.0, 81.0, 76.0, 87.5,
    ];
    let baseline = [
        70.0, 74.0, 80.5, 66.0, 71.0, 79.0, 69.5, 75.0, 72.0, 68.0, 77.5, 70.5,
    ];
    ai.iter()
        .zip(baseline)
        .enumerate()
        .map(|(i, (&a, b))| ComparisonRecord {
            id: format!("cmp-{i:03}"),
            created_at: datetime!(2024-03-01 12:00 UTC) + time::Duration::days(2 * i as i64),
            ai_scores: scores(a - 1.0, a),
            baseline_scores: scores(b + 1.0, b),
            ai_overall_score: a,
            baseline_overall_score: b,
        })
        .collect()
}

fn write_jsonl(records: &[ComparisonRecord]) -> (tempfile::TempDir, JsonFileStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comparisons.jsonl");
    let mut f = fs::File::create(&path).unwrap();
    for r in records {
        writeln!(f, "{}", serde_json::to_string(r).unwrap()).unwrap();
    }
    (dir, JsonFileStore::new(path))
}

#[test]
fn file_store_and_in_memory_agree() {
    let records = march_records();
    let (_dir, store) = write_jsonl(&records);
    let loaded = store.fetch_records(&DateRange::default()).unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn full_pipeline_from_file() {
    let (_dir, store) = write_jsonl(&march_records());
    let report = AnalysisUseCase::new(&store)
        .execute(AnalysisRequest::default())
        .unwrap();

    assert_eq!(report.status, AnalysisStatus::Complete);
    assert_eq!(report.ai.sample_size, 12);
    assert_eq!(report.tally.total(), 12);
    assert_eq!(report.tally.ties, 1);

    let t = report.t_test.as_ref().unwrap();
    assert!(t.is_significant);
    assert!(t.degrees_of_freedom > 10.0 && t.degrees_of_freedom <= 22.0);

    let ci = report.mean_difference_interval.unwrap();
    assert!(ci.lower > 0.0, "interval should exclude zero when p < .05");
    assert!(ci.lower < report.mean_difference && report.mean_difference < ci.upper);

    let md = render_markdown(&report);
    assert!(md.contains(&report.journal_statement));

    let csv = ExportUseCase::export_analysis(&report, ExportFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn window_selects_subset() {
    let (_dir, store) = write_jsonl(&march_records());
    let range = DateRange::new(
        Some(datetime!(2024-03-05 12:00 UTC)),
        Some(datetime!(2024-03-11 12:00 UTC)),
    );
    let stats = StatisticsUseCase::new(&store)
        .execute(StatisticsRequest {
            range: range.clone(),
            options: AnalysisOptions::default(),
        })
        .unwrap();
    assert_eq!(stats.total_comparisons, 4);
    assert_eq!(stats.data_range, Some(range));
}

#[test]
fn criteria_are_aggregated_independently() {
    let (_dir, store) = write_jsonl(&march_records());
    let stats = StatisticsUseCase::new(&store)
        .execute(StatisticsRequest::default())
        .unwrap();
    let accuracy = stats.ai.criteria[&evalgate_types::Criterion::Accuracy];
    assert_relative_eq!(accuracy.mean, stats.ai.overall.mean - 1.0, epsilon = 1e-9);
}

#[test]
fn strict_and_graceful_agree_on_complete_data() {
    let records = march_records();
    let (_dir, store) = write_jsonl(&records);
    let graceful = AnalysisUseCase::new(&store)
        .execute(AnalysisRequest::default())
        .unwrap();
    let strict = compute_statistical_analysis(
        &records,
        &DateRange::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    assert_eq!(graceful, strict);
}

#[test]
fn p_and_critical_value_are_consistent() {
    for df in [1.0, 4.0, 8.0, 10.0, 30.0, 120.0] {
        let crit = t_critical(df, 0.05).unwrap();
        assert_relative_eq!(two_tailed_p(crit, df).unwrap(), 0.05, epsilon = 1e-6);
    }
}

#[test]
fn welch_reference_value() {
    let t = welch_t_test(
        &[80.0, 85.0, 90.0, 75.0, 95.0],
        &[60.0, 65.0, 70.0, 55.0, 75.0],
    )
    .unwrap();
    assert_relative_eq!(t.t_statistic, 4.0, epsilon = 1e-12);
    assert_relative_eq!(t.degrees_of_freedom, 8.0, epsilon = 1e-12);
    assert_relative_eq!(t.p_value, 0.003_949_8, epsilon = 1e-6);
}
