//! Pipeline configuration.
//!
//! Every optional artifact is resolved once, at startup. Explicit `*_PATH`
//! variables win; otherwise the model directory is probed for the
//! conventional file names. Model artifacts resolve to every existing
//! candidate so a loader can move on when the preferred one is broken.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::landmark_model::PresenceActivation;
use crate::sequence::DEFAULT_BATCH_SIZE;
use crate::tensor::DEFAULT_TARGET_LEN;

/// Directory searched for artifacts, relative to the working directory and
/// to its parent.
pub const DEFAULT_MODEL_DIR: &str = "ml_models/saved_models";

/// Performance model candidates, in order of preference.
pub const PERFORMANCE_MODEL_FILES: [&str; 2] = ["pose_model.onnx", "pose_model.json"];

/// Anomaly model candidates, in order of preference.
pub const ANOMALY_MODEL_FILES: [&str; 2] = ["cheat_detector.onnx", "cheat_detector.json"];

pub const NORMALIZATION_STATS_FILE: &str = "landmark_norm.json";

pub const LANDMARK_MODEL_FILE: &str = "pose_landmarker.onnx";

/// Inference pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Frames per normalized sequence
    pub target_len: usize,
    /// Frames decoded per parallel extraction round
    pub batch_size: usize,
    /// Wall-clock limit for decode + extraction
    pub decode_budget: Option<Duration>,
    /// Seed for the technique placeholder; entropy when unset
    pub technique_seed: Option<u64>,
    /// Existing performance model artifacts, most preferred first
    pub performance_models: Vec<PathBuf>,
    /// Existing anomaly model artifacts, most preferred first
    pub anomaly_models: Vec<PathBuf>,
    pub normalization_stats: Option<PathBuf>,
    pub landmark_model: Option<PathBuf>,
    /// Encoding of the landmark model's presence output
    pub presence_activation: PresenceActivation,
}

impl PipelineConfig {
    /// Defaults with no artifacts at all.
    pub fn bare() -> Self {
        Self {
            target_len: DEFAULT_TARGET_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
            ..Self::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("POSE_MODEL_DIR")
            .ok()
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir())
            .or_else(|| default_model_dir());

        let resolve = |var: &str, candidates: &[&str]| {
            explicit_path(var).or_else(|| {
                model_dir
                    .as_deref()
                    .and_then(|dir| probe(dir, candidates))
            })
        };
        let resolve_all = |var: &str, candidates: &[&str]| match explicit_path(var) {
            Some(path) => vec![path],
            None => model_dir
                .as_deref()
                .map(|dir| probe_all(dir, candidates))
                .unwrap_or_default(),
        };

        let config = Self {
            target_len: env_parse("POSE_TARGET_LEN")
                .filter(|&len: &usize| len > 0)
                .unwrap_or(DEFAULT_TARGET_LEN),
            batch_size: env_parse("EXTRACT_BATCH_SIZE")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            decode_budget: env_parse("DECODE_BUDGET_SECS")
                .filter(|&secs: &f64| secs.is_finite() && secs > 0.0)
                .map(Duration::from_secs_f64),
            technique_seed: env_parse("TECHNIQUE_SEED"),
            performance_models: resolve_all("PERFORMANCE_MODEL_PATH", &PERFORMANCE_MODEL_FILES),
            anomaly_models: resolve_all("ANOMALY_MODEL_PATH", &ANOMALY_MODEL_FILES),
            normalization_stats: resolve("LANDMARK_NORM_PATH", &[NORMALIZATION_STATS_FILE]),
            landmark_model: resolve("LANDMARK_MODEL_PATH", &[LANDMARK_MODEL_FILE]),
            presence_activation: env_parse("LANDMARK_PRESENCE_ACTIVATION").unwrap_or_default(),
        };

        info!(
            model_dir = ?model_dir,
            performance_models = ?config.performance_models,
            anomaly_models = ?config.anomaly_models,
            normalization_stats = ?config.normalization_stats,
            landmark_model = ?config.landmark_model,
            presence_activation = ?config.presence_activation,
            target_len = config.target_len,
            "Pipeline configuration resolved"
        );
        config
    }

    pub fn with_model_dir(mut self, dir: &Path) -> Self {
        self.performance_models = probe_all(dir, &PERFORMANCE_MODEL_FILES);
        self.anomaly_models = probe_all(dir, &ANOMALY_MODEL_FILES);
        self.normalization_stats = probe(dir, &[NORMALIZATION_STATS_FILE]);
        self.landmark_model = probe(dir, &[LANDMARK_MODEL_FILE]);
        self
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

fn explicit_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

fn default_model_dir() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_MODEL_DIR), Path::new("..").join(DEFAULT_MODEL_DIR)]
        .into_iter()
        .find(|dir| dir.is_dir())
}

/// First candidate that exists as a file in `dir`.
pub fn probe(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Every candidate that exists as a file in `dir`, in candidate order.
pub fn probe_all(dir: &Path, candidates: &[&str]) -> Vec<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_prefers_earlier_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pose_model.json"), "{}").unwrap();
        assert_eq!(
            probe(dir.path(), &PERFORMANCE_MODEL_FILES),
            Some(dir.path().join("pose_model.json"))
        );

        std::fs::write(dir.path().join("pose_model.onnx"), b"").unwrap();
        assert_eq!(
            probe(dir.path(), &PERFORMANCE_MODEL_FILES),
            Some(dir.path().join("pose_model.onnx"))
        );
    }

    #[test]
    fn test_model_dir_without_artifacts_resolves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::bare().with_model_dir(dir.path());
        assert!(config.performance_models.is_empty());
        assert!(config.anomaly_models.is_empty());
        assert!(config.normalization_stats.is_none());
        assert!(config.landmark_model.is_none());
        assert_eq!(config.target_len, DEFAULT_TARGET_LEN);
    }

    #[test]
    fn test_model_dir_picks_up_stats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(NORMALIZATION_STATS_FILE), "{}").unwrap();
        std::fs::write(dir.path().join("cheat_detector.json"), "{}").unwrap();
        let config = PipelineConfig::bare().with_model_dir(dir.path());
        assert_eq!(
            config.normalization_stats,
            Some(dir.path().join(NORMALIZATION_STATS_FILE))
        );
        assert_eq!(
            config.anomaly_models,
            vec![dir.path().join("cheat_detector.json")]
        );
    }

    #[test]
    fn test_model_dir_keeps_every_model_candidate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pose_model.json"), "{}").unwrap();
        std::fs::write(dir.path().join("pose_model.onnx"), b"").unwrap();
        let config = PipelineConfig::bare().with_model_dir(dir.path());
        assert_eq!(
            config.performance_models,
            vec![
                dir.path().join("pose_model.onnx"),
                dir.path().join("pose_model.json"),
            ]
        );
    }
}
