//! Anomaly ("cheat") detection over the pose tensor.

use std::path::PathBuf;

use tracing::warn;

use crate::models::{load_first_model, InputLayout, TensorModel};
use crate::tensor::PoseTensor;

/// Label emitted by outlier models for an anomalous sample.
const OUTLIER_LABEL: f32 = -1.0;

#[derive(Default)]
pub struct AnomalyDetector {
    model: Option<Box<dyn TensorModel>>,
}

impl AnomalyDetector {
    pub fn new(model: Option<Box<dyn TensorModel>>) -> Self {
        Self { model }
    }

    pub fn from_artifacts(candidates: &[PathBuf]) -> Self {
        Self {
            model: load_first_model(candidates, InputLayout::Frames, "anomaly"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// 1 when any sample is labelled an outlier, else 0. Unconfigured or
    /// failing models report 0.
    pub fn detect(&self, sequence: &PoseTensor) -> u8 {
        let Some(model) = &self.model else {
            return 0;
        };

        match model.run(sequence) {
            Ok(labels) => u8::from(labels.iter().any(|&label| label == OUTLIER_LABEL)),
            Err(e) => {
                warn!(backend = model.name(), error = %e, "Anomaly detection failed");
                crate::metrics::record_fallback("anomaly");
                0
            }
        }
    }
}
