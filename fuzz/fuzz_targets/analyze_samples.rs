//! Structure-aware fuzzing of the inferential pipeline.
//!
//! Scores are folded into `[0, 100]` so every input is a legal sample; the
//! target checks that inference never panics and that its outputs are finite
//! and within their documented ranges.

#![no_main]

use arbitrary::Arbitrary;
use evalgate_significance::{InferenceOptions, infer};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    ai: Vec<u32>,
    baseline: Vec<u32>,
    scale: u8,
}

fn fold(raw: &[u32], scale: u8) -> Vec<f64> {
    let div = 10f64.powi(i32::from(scale % 7));
    raw.iter()
        .map(|&v| (f64::from(v) / div).rem_euclid(100.0))
        .collect()
}

fuzz_target!(|input: Input| {
    let ai = fold(&input.ai, input.scale);
    let baseline = fold(&input.baseline, input.scale);

    let Ok(inf) = infer(&ai, &baseline, &InferenceOptions::default()) else {
        return;
    };

    let t = inf.t_test;
    assert!(t.t_statistic.is_finite());
    assert!(t.degrees_of_freedom > 0.0);
    assert!((0.0..=1.0).contains(&t.p_value));
    assert_eq!(t.is_significant, t.p_value < t.significance_level);
    assert!(inf.effect_size.cohens_d.is_finite());
    assert!(inf.ai_interval.lower <= inf.ai_interval.upper);
    assert!(inf.mean_difference_interval.lower <= inf.mean_difference_interval.upper);
});
