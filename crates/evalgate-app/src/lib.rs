//! Application layer for evalgate.
//!
//! The app layer coordinates adapters and domain logic.
//! It does not parse CLI flags and it does not write files.

mod config;
mod export;
mod render;

pub use config::{analysis_options, load_config, parse_config};
pub use export::{AnalysisExportRow, ExportFormat, ExportUseCase, StatisticsExportRow};
pub use render::{render_markdown, render_statistics_markdown};

use anyhow::Context;
use evalgate_adapters::RecordStore;
use evalgate_domain::{
    AnalysisOptions, compose_report, compute_statistical_analysis, compute_statistics,
};
use evalgate_types::{ComparisonStatistics, DateRange, StatisticalAnalysisResult};
use std::time::Duration;
use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Build the reporting window from explicit bounds or a trailing duration.
///
/// `last` ends at `clock.now()` unless `end` is also given, in which case the
/// window is the `last` span ending at `end`. `last` and `start` are exclusive.
pub fn resolve_range(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    last: Option<Duration>,
    clock: &dyn Clock,
) -> anyhow::Result<DateRange> {
    let range = match (start, last) {
        (Some(_), Some(_)) => anyhow::bail!("--start and --last cannot be combined"),
        (_, Some(span)) => {
            let end = end.unwrap_or_else(|| clock.now());
            let span = time::Duration::try_from(span).context("window is too long")?;
            let start = end
                .checked_sub(span)
                .context("window reaches before the earliest representable date")?;
            DateRange::new(Some(start), Some(end))
        }
        (start, None) => DateRange::new(start, end),
    };

    if let (Some(s), Some(e)) = (range.start, range.end) {
        anyhow::ensure!(s <= e, "range start {s} is after range end {e}");
    }
    Ok(range)
}

/// Parse a humantime span such as `30d` or `12h`.
pub fn parse_window(s: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(s).with_context(|| format!("invalid window: {s:?}"))
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsRequest {
    pub range: DateRange,
    pub options: AnalysisOptions,
}

pub struct StatisticsUseCase<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> StatisticsUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn execute(&self, req: StatisticsRequest) -> anyhow::Result<ComparisonStatistics> {
        let records = self
            .store
            .fetch_records(&req.range)
            .context("failed to fetch comparison records")?;
        tracing::info!(records = records.len(), "computing comparison statistics");
        Ok(compute_statistics(&records, &req.range, &req.options)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub range: DateRange,
    pub options: AnalysisOptions,

    /// Fail instead of returning a partial report when the groups are too
    /// small or have no variance.
    pub strict: bool,
}

pub struct AnalysisUseCase<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> AnalysisUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn execute(&self, req: AnalysisRequest) -> anyhow::Result<StatisticalAnalysisResult> {
        let records = self
            .store
            .fetch_records(&req.range)
            .context("failed to fetch comparison records")?;
        tracing::info!(
            records = records.len(),
            strict = req.strict,
            "running statistical analysis"
        );

        let result = if req.strict {
            compute_statistical_analysis(&records, &req.range, &req.options)
        } else {
            compose_report(&records, &req.range, &req.options)
        };
        Ok(result?)
    }
}
