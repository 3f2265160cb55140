//! Win/loss/tie classification of paired overall scores.

use crate::DomainError;
use evalgate_types::{ComparisonOutcome, ComparisonRecord, TallyCounts};

/// Absolute score difference below which a pair counts as a tie.
///
/// The default is exact equality: overall scores are aggregated from five
/// sub-criteria upstream and rarely collide, so any fuzzy band is a product
/// decision and must be configured explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct TieTolerance(f64);

impl TieTolerance {
    pub const EXACT: TieTolerance = TieTolerance(0.0);

    pub fn new(epsilon: f64) -> Result<Self, DomainError> {
        if epsilon.is_finite() && epsilon >= 0.0 {
            Ok(Self(epsilon))
        } else {
            Err(DomainError::InvalidTieTolerance(epsilon))
        }
    }

    pub fn epsilon(self) -> f64 {
        self.0
    }

    pub fn is_tie(self, ai: f64, baseline: f64) -> bool {
        ai == baseline || (ai - baseline).abs() < self.0
    }
}

pub fn classify(ai: f64, baseline: f64, tolerance: TieTolerance) -> ComparisonOutcome {
    if tolerance.is_tie(ai, baseline) {
        ComparisonOutcome::Tie
    } else if ai > baseline {
        ComparisonOutcome::AiWins
    } else {
        ComparisonOutcome::BaselineWins
    }
}

/// Count outcomes over `(ai, baseline)` pairs.
///
/// The three counts always sum to the number of pairs.
pub fn tally<I>(pairs: I, tolerance: TieTolerance) -> TallyCounts
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut counts = TallyCounts::default();
    for (ai, baseline) in pairs {
        match classify(ai, baseline, tolerance) {
            ComparisonOutcome::AiWins => counts.ai_wins += 1,
            ComparisonOutcome::BaselineWins => counts.baseline_wins += 1,
            ComparisonOutcome::Tie => counts.ties += 1,
        }
    }
    counts
}

pub fn tally_records(records: &[ComparisonRecord], tolerance: TieTolerance) -> TallyCounts {
    tally(
        records
            .iter()
            .map(|r| (r.ai_overall_score, r.baseline_overall_score)),
        tolerance,
    )
}
