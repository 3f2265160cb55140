//! Graceful analysis, Markdown rendering and export over arbitrary records.

#![no_main]

use arbitrary::Arbitrary;
use evalgate_app::{ExportFormat, ExportUseCase, render_markdown};
use evalgate_domain::{AnalysisOptions, compose_report};
use evalgate_types::{ComparisonRecord, CriteriaScores, DateRange};
use libfuzzer_sys::fuzz_target;
use time::OffsetDateTime;

#[derive(Arbitrary, Debug)]
struct FuzzPair {
    ai: u8,
    baseline: u8,
    id: String,
}

fn score(v: u8) -> f64 {
    f64::from(v % 101)
}

fn flat(v: f64) -> CriteriaScores {
    CriteriaScores {
        accuracy: v,
        relevance: v,
        actionability: v,
        clarity: v,
        completeness: v,
    }
}

fuzz_target!(|pairs: Vec<FuzzPair>| {
    let records: Vec<ComparisonRecord> = pairs
        .into_iter()
        .map(|p| ComparisonRecord {
            id: p.id,
            created_at: OffsetDateTime::UNIX_EPOCH,
            ai_scores: flat(score(p.ai)),
            baseline_scores: flat(score(p.baseline)),
            ai_overall_score: score(p.ai),
            baseline_overall_score: score(p.baseline),
        })
        .collect();

    let report = compose_report(&records, &DateRange::default(), &AnalysisOptions::default())
        .expect("in-range records always compose");
    assert_eq!(report.tally.ai_wins + report.tally.baseline_wins + report.tally.ties, records.len());

    let md = render_markdown(&report);
    assert!(md.contains("evalgate"));

    for format in [ExportFormat::Csv, ExportFormat::Jsonl] {
        let out = ExportUseCase::export_analysis(&report, format).expect("export");
        assert_eq!(out.lines().count(), if format == ExportFormat::Csv { 4 } else { 3 });
    }
});
