//! TOML config parsing and option merging never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, Option<f64>)| {
    let (text, tie_epsilon) = data;
    if let Ok(cfg) = evalgate_app::parse_config(text)
        && let Ok(opts) = evalgate_app::analysis_options(&cfg, tie_epsilon)
    {
        let eps = opts.tie_tolerance.epsilon();
        assert!(eps.is_finite() && eps >= 0.0);
    }
});
