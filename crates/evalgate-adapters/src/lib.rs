//! Record store adapters for evalgate.
//!
//! In clean-arch terms: this is where we touch the world. Every store hands
//! back an owned, validated snapshot, so the engine never sees a record
//! change underneath it.

use evalgate_types::{ComparisonRecord, DateRange, ScoreRangeError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path} (line {line})")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    InvalidRecord(#[from] ScoreRangeError),
}

/// Source of comparison records.
///
/// Implementations filter inclusively on `created_at`, return records in no
/// particular order, and validate score ranges before returning.
pub trait RecordStore {
    fn fetch_records(&self, range: &DateRange) -> Result<Vec<ComparisonRecord>, AdapterError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn fetch_records(&self, range: &DateRange) -> Result<Vec<ComparisonRecord>, AdapterError> {
        (**self).fetch_records(range)
    }
}

fn snapshot<'a, I>(records: I, range: &DateRange) -> Result<Vec<ComparisonRecord>, AdapterError>
where
    I: IntoIterator<Item = &'a ComparisonRecord>,
{
    let mut out = Vec::new();
    for r in records {
        if range.contains(r.created_at) {
            r.validate()?;
            out.push(r.clone());
        }
    }
    Ok(out)
}

/// Holds records in memory. Used by tests and by callers that already have
/// the records loaded.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    records: Vec<ComparisonRecord>,
}

impl InMemoryStore {
    pub fn new(records: Vec<ComparisonRecord>) -> Self {
        Self { records }
    }
}

impl RecordStore for InMemoryStore {
    fn fetch_records(&self, range: &DateRange) -> Result<Vec<ComparisonRecord>, AdapterError> {
        snapshot(&self.records, range)
    }
}

/// Reads records from a file holding either a JSON array or JSON Lines.
///
/// The file is re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ComparisonRecord>, AdapterError> {
        let text = fs::read_to_string(&self.path).map_err(|source| AdapterError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_records(&self.path, &text)
    }
}

impl RecordStore for JsonFileStore {
    fn fetch_records(&self, range: &DateRange) -> Result<Vec<ComparisonRecord>, AdapterError> {
        let all = self.load()?;
        let records = snapshot(&all, range)?;
        tracing::debug!(
            path = %self.path.display(),
            loaded = all.len(),
            selected = records.len(),
            "fetched comparison records"
        );
        Ok(records)
    }
}

/// Parse a JSON array (first non-blank byte is `[`) or JSON Lines.
/// Blank lines in JSON Lines input are skipped.
pub fn parse_records(path: &Path, text: &str) -> Result<Vec<ComparisonRecord>, AdapterError> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|source| AdapterError::Parse {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        });
    }

    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l).map_err(|source| AdapterError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalgate_types::CriteriaScores;
    use std::io::Write;
    use time::OffsetDateTime;
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

    fn rec(id: &str, at: OffsetDateTime, ai: f64, baseline: f64) -> ComparisonRecord {
        ComparisonRecord {
            id: id.into(),
            created_at: at,
            ai_scores: flat(ai),
            baseline_scores: flat(baseline),
            ai_overall_score: ai,
            baseline_overall_score: baseline,
        }
    }

    fn sample() -> Vec<ComparisonRecord> {
        vec![
            rec("a", datetime!(2024-01-01 00:00 UTC), 80.0, 70.0),
            rec("b", datetime!(2024-01-15 12:00 UTC), 60.0, 65.0),
            rec("c", datetime!(2024-02-01 00:00 UTC), 90.0, 90.0),
        ]
    }

    #[test]
    fn unbounded_fetch_returns_everything() {
        let store = InMemoryStore::new(sample());
        assert_eq!(store.fetch_records(&DateRange::default()).unwrap().len(), 3);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let store = InMemoryStore::new(sample());
        let range = DateRange::new(
            Some(datetime!(2024-01-01 00:00 UTC)),
            Some(datetime!(2024-01-15 12:00 UTC)),
        );
        let ids: Vec<String> = store
            .fetch_records(&range)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn invalid_record_is_rejected_at_the_boundary() {
        let mut records = sample();
        records[1].ai_scores.accuracy = 140.0;
        let store = InMemoryStore::new(records);
        let err = store.fetch_records(&DateRange::default()).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidRecord(ref e) if e.record_id == "b"));
    }

    #[test]
    fn invalid_record_outside_range_is_ignored() {
        let mut records = sample();
        records[2].ai_overall_score = -3.0;
        let store = InMemoryStore::new(records);
        let range = DateRange::new(None, Some(datetime!(2024-01-31 00:00 UTC)));
        assert_eq!(store.fetch_records(&range).unwrap().len(), 2);
    }

    #[test]
    fn reads_json_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, serde_json::to_vec(&sample()).unwrap()).unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.fetch_records(&DateRange::default()).unwrap(), sample());
    }

    #[test]
    fn reads_json_lines_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let mut f = fs::File::create(&path).unwrap();
        for r in sample() {
            writeln!(f, "{}", serde_json::to_string(&r).unwrap()).unwrap();
            writeln!(f).unwrap();
        }
        drop(f);
        let store = JsonFileStore::new(&path);
        assert_eq!(store.fetch_records(&DateRange::default()).unwrap().len(), 3);
    }

    #[test]
    fn parse_error_reports_line() {
        let good = serde_json::to_string(&sample()[0]).unwrap();
        let text = format!("{good}\n{{not json}}\n");
        let err = parse_records(Path::new("x.jsonl"), &text).unwrap_err();
        assert!(matches!(err, AdapterError::Parse { line: 2, .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let store = JsonFileStore::new("/definitely/not/here.jsonl");
        assert!(matches!(
            store.fetch_records(&DateRange::default()),
            Err(AdapterError::Io { .. })
        ));
    }
}
