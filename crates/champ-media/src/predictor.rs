//! Performance prediction: pose tensor to a quality estimate in [0, 1].

use std::path::PathBuf;

use tracing::warn;

use crate::models::{load_first_model, InputLayout, TensorModel};
use crate::tensor::PoseTensor;

/// Prediction used when no model is loaded or the model fails.
pub const DEFAULT_PREDICTION: f64 = 0.5;

/// Wraps an optional model; always produces a number.
#[derive(Default)]
pub struct PerformancePredictor {
    model: Option<Box<dyn TensorModel>>,
}

impl PerformancePredictor {
    pub fn new(model: Option<Box<dyn TensorModel>>) -> Self {
        Self { model }
    }

    /// Load the first candidate that loads. When none does the predictor
    /// stays unconfigured.
    pub fn from_artifacts(candidates: &[PathBuf]) -> Self {
        Self {
            model: load_first_model(candidates, InputLayout::Sequence, "performance"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Mean of the model outputs, clamped to [0, 1].
    pub fn predict(&self, sequence: &PoseTensor) -> f64 {
        let Some(model) = &self.model else {
            return DEFAULT_PREDICTION;
        };

        match model.run(sequence) {
            Ok(outputs) if !outputs.is_empty() => {
                let mean = outputs.iter().map(|&v| f64::from(v)).sum::<f64>() / outputs.len() as f64;
                if mean.is_finite() {
                    mean.clamp(0.0, 1.0)
                } else {
                    warn!(backend = model.name(), "Performance model produced a non-finite value");
                    crate::metrics::record_fallback("predictor");
                    DEFAULT_PREDICTION
                }
            }
            Ok(_) => {
                warn!(backend = model.name(), "Performance model produced no output");
                crate::metrics::record_fallback("predictor");
                DEFAULT_PREDICTION
            }
            Err(e) => {
                warn!(backend = model.name(), error = %e, "Performance prediction failed");
                crate::metrics::record_fallback("predictor");
                DEFAULT_PREDICTION
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};
    use ndarray::Array3;

    struct Fixed(Vec<f32>);

    impl TensorModel for Fixed {
        fn run(&self, _input: &PoseTensor) -> MediaResult<Vec<f32>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Failing;

    impl TensorModel for Failing {
        fn run(&self, _input: &PoseTensor) -> MediaResult<Vec<f32>> {
            Err(MediaError::inference_failed("boom"))
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn input() -> PoseTensor {
        Array3::zeros((120, 33, 3))
    }

    #[test]
    fn test_unconfigured_predicts_default() {
        let predictor = PerformancePredictor::default();
        assert!(!predictor.is_configured());
        assert_eq!(predictor.predict(&input()), DEFAULT_PREDICTION);
    }

    #[test]
    fn test_outputs_are_averaged() {
        let predictor = PerformancePredictor::new(Some(Box::new(Fixed(vec![0.2, 0.4, 0.9]))));
        assert!((predictor.predict(&input()) - 0.5).abs() < 1e-6);

        let single = PerformancePredictor::new(Some(Box::new(Fixed(vec![0.75]))));
        assert_eq!(single.predict(&input()), 0.75);
    }

    #[test]
    fn test_failures_predict_default() {
        for model in [
            Box::new(Failing) as Box<dyn TensorModel>,
            Box::new(Fixed(Vec::new())),
            Box::new(Fixed(vec![f32::NAN])),
        ] {
            let predictor = PerformancePredictor::new(Some(model));
            assert_eq!(predictor.predict(&input()), DEFAULT_PREDICTION);
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let predictor = PerformancePredictor::new(Some(Box::new(Fixed(vec![3.0]))));
        assert_eq!(predictor.predict(&input()), 1.0);
    }

    #[test]
    fn test_missing_artifact_leaves_predictor_unconfigured() {
        let predictor =
            PerformancePredictor::from_artifacts(&[PathBuf::from("/nonexistent/pose_model.onnx")]);
        assert!(!predictor.is_configured());
        assert!(!PerformancePredictor::from_artifacts(&[]).is_configured());
    }
}
