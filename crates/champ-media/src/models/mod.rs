//! Black-box model capability shared by the performance predictor and the
//! anomaly detector.
//!
//! A backend takes the fixed-length pose tensor and returns a flat vector of
//! outputs; callers decide what the numbers mean (mean quality, or per-sample
//! inlier/outlier labels). Backends are chosen once at startup from the model
//! artifact that was found:
//!
//! | Artifact | Backend |
//! |----------|---------|
//! | `*.onnx` | [`OnnxModel`] (ONNX Runtime) |
//! | `*.json` with `"kind": "linear"` | [`LinearModel`] |
//! | `*.json` with `"kind": "envelope"` | [`EnvelopeModel`] |

pub mod envelope;
pub mod linear;
pub mod onnx;

pub use envelope::EnvelopeModel;
pub use linear::LinearModel;
pub use onnx::OnnxModel;

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::tensor::{PoseTensor, NUM_COORDS, NUM_LANDMARKS};

/// Features per frame when a frame is flattened.
pub const FRAME_FEATURES: usize = NUM_LANDMARKS * NUM_COORDS;

/// How the pose tensor is presented to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// Whole sequence with a batch dimension of one: `[1, T, 33, 3]`.
    Sequence,
    /// One row per frame: `[T, 99]`.
    Frames,
}

/// A loaded model. Implementations are immutable after load and shared
/// across requests.
pub trait TensorModel: Send + Sync {
    fn run(&self, input: &PoseTensor) -> MediaResult<Vec<f32>>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonModel {
    Linear(LinearModel),
    Envelope(EnvelopeModel),
}

/// Load whichever backend matches the artifact.
pub fn load_model(path: &Path, layout: InputLayout) -> MediaResult<Box<dyn TensorModel>> {
    if !path.exists() {
        return Err(MediaError::model_not_found(path));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let model: Box<dyn TensorModel> = match extension.as_str() {
        "onnx" => Box::new(OnnxModel::load(path, layout)?),
        "json" => {
            let raw = std::fs::read_to_string(path)?;
            match serde_json::from_str::<JsonModel>(&raw)? {
                JsonModel::Linear(model) => Box::new(model.validated()?),
                JsonModel::Envelope(model) => Box::new(model.validated()?),
            }
        }
        other => {
            return Err(MediaError::UnsupportedModel(format!(
                "{} (extension {other:?})",
                path.display()
            )))
        }
    };

    info!(path = %path.display(), backend = model.name(), "Model loaded");
    Ok(model)
}

/// Load the first candidate that loads. Broken candidates are logged and
/// skipped; `None` when every one fails.
pub fn load_first_model(
    candidates: &[PathBuf],
    layout: InputLayout,
    role: &'static str,
) -> Option<Box<dyn TensorModel>> {
    for path in candidates {
        match load_model(path, layout) {
            Ok(model) => return Some(model),
            Err(e) => warn!(role, path = %path.display(), error = %e, "Skipping model artifact"),
        }
    }
    if !candidates.is_empty() {
        warn!(role, tried = candidates.len(), "No model artifact could be loaded");
    }
    None
}

/// Flatten each frame into a row of 99 features.
pub fn frames_as_rows(input: &PoseTensor) -> MediaResult<Array2<f32>> {
    let frames = input.len_of(ndarray::Axis(0));
    input
        .as_standard_layout()
        .into_owned()
        .into_shape((frames, FRAME_FEATURES))
        .map_err(|e| MediaError::shape_mismatch(format!("flatten frames: {e}")))
}
