//! `evalgate.toml` loading.

use anyhow::Context;
use evalgate_domain::{AnalysisOptions, TieTolerance};
use evalgate_significance::InferenceOptions;
use evalgate_types::ConfigFile;
use std::path::Path;

pub fn parse_config(text: &str) -> anyhow::Result<ConfigFile> {
    Ok(toml::from_str(text)?)
}

pub fn load_config(path: &Path) -> anyhow::Result<ConfigFile> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Merge file settings with a command-line tie epsilon. The flag wins.
pub fn analysis_options(
    config: &ConfigFile,
    tie_epsilon: Option<f64>,
) -> anyhow::Result<AnalysisOptions> {
    let tie_tolerance = match tie_epsilon.or(config.analysis.tie_epsilon) {
        Some(eps) => TieTolerance::new(eps)?,
        None => TieTolerance::EXACT,
    };

    let mut inference = InferenceOptions::default();
    if let Some(threshold) = config.analysis.instability_threshold {
        anyhow::ensure!(
            threshold.is_finite() && threshold >= 0.0,
            "instability_threshold must be finite and non-negative, got {threshold}"
        );
        inference.instability_threshold = threshold;
    }

    Ok(AnalysisOptions {
        tie_tolerance,
        inference,
    })
}
