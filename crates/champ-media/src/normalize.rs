//! Temporal normalization: optional standardization, then pad/truncate to a
//! fixed number of frames.

use std::path::Path;

use ndarray::{concatenate, s, Array2, Axis, Zip};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::tensor::{PoseTensor, DEFAULT_TARGET_LEN, NUM_COORDS, NUM_LANDMARKS};

/// Per-(landmark, coordinate) mean and standard deviation.
///
/// Values are kept flat as loaded; the broadcast shape is resolved when the
/// statistics are applied, so a bad file only disables standardization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl NormalizationStats {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Self {
        Self { mean, std }
    }

    /// Load `{"mean": [...], "std": [...]}`. Nested arrays are flattened in
    /// row-major order. Returns `Ok(None)` when either array is empty.
    pub fn load(path: &Path) -> MediaResult<Option<Self>> {
        let raw = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&raw)?;

        let mean = flatten_numbers(doc.get("mean"));
        let std = flatten_numbers(doc.get("std"));
        if mean.is_empty() || std.is_empty() {
            debug!(path = %path.display(), "Normalization file has no mean/std values");
            return Ok(None);
        }
        Ok(Some(Self { mean, std }))
    }

    /// Standardize every frame: `(x - mean) / std`, zero std entries count as 1.
    pub fn apply(&self, sequence: &PoseTensor) -> MediaResult<PoseTensor> {
        let mean = broadcast_shape(&self.mean, "mean")?;
        let std = broadcast_shape(&self.std, "std")?.mapv(|v| if v == 0.0 { 1.0 } else { v });

        let dim = sequence.dim();
        let frame_dim = (dim.1, dim.2);
        let mean = mean.broadcast(frame_dim).ok_or_else(|| {
            MediaError::shape_mismatch(format!("mean {:?} vs frame {:?}", mean.dim(), frame_dim))
        })?;
        let std = std.broadcast(frame_dim).ok_or_else(|| {
            MediaError::shape_mismatch(format!("std {:?} vs frame {:?}", std.dim(), frame_dim))
        })?;

        let mut out = sequence.clone();
        for mut frame in out.axis_iter_mut(Axis(0)) {
            Zip::from(&mut frame)
                .and(&mean)
                .and(&std)
                .for_each(|x, &m, &s| *x = (*x - m) / s);
        }
        Ok(out)
    }
}

/// Reshape flat statistics into something that broadcasts against (33, 3).
fn broadcast_shape(values: &[f32], name: &str) -> MediaResult<Array2<f32>> {
    let shape = match values.len() {
        n if n == NUM_LANDMARKS * NUM_COORDS => (NUM_LANDMARKS, NUM_COORDS),
        n if n == NUM_COORDS => (1, NUM_COORDS),
        1 => (1, 1),
        n => {
            return Err(MediaError::InvalidStats(format!(
                "{name} has {n} values, expected {}, {NUM_COORDS} or 1",
                NUM_LANDMARKS * NUM_COORDS
            )))
        }
    };
    Array2::from_shape_vec(shape, values.to_vec())
        .map_err(|e| MediaError::InvalidStats(format!("{name}: {e}")))
}

fn flatten_numbers(value: Option<&Value>) -> Vec<f32> {
    fn walk(value: &Value, out: &mut Vec<f32>) {
        match value {
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    out.push(f as f32);
                }
            }
            Value::Array(items) => items.iter().for_each(|item| walk(item, out)),
            _ => {}
        }
    }

    let mut out = Vec::new();
    if let Some(value) = value {
        walk(value, &mut out);
    }
    out
}

/// Keep the first `target_len` frames, or zero-pad at the end up to it.
pub fn pad_or_truncate(sequence: &PoseTensor, target_len: usize) -> PoseTensor {
    let len = sequence.len_of(Axis(0));
    if len == target_len {
        return sequence.clone();
    }
    if len > target_len {
        return sequence.slice(s![..target_len, .., ..]).to_owned();
    }

    let (_, landmarks, coords) = sequence.dim();
    let padding = PoseTensor::zeros((target_len - len, landmarks, coords));
    // Trailing dimensions match by construction.
    concatenate(Axis(0), &[sequence.view(), padding.view()])
        .unwrap_or_else(|_| PoseTensor::zeros((target_len, landmarks, coords)))
}

/// Fixes every sequence to the model input length.
#[derive(Debug, Clone)]
pub struct TemporalNormalizer {
    target_len: usize,
    stats: Option<NormalizationStats>,
}

impl Default for TemporalNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LEN, None)
    }
}

impl TemporalNormalizer {
    pub fn new(target_len: usize, stats: Option<NormalizationStats>) -> Self {
        Self { target_len, stats }
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn has_stats(&self) -> bool {
        self.stats.is_some()
    }

    /// Standardize (best effort) then pad/truncate. Never fails.
    pub fn normalize(&self, sequence: &PoseTensor) -> PoseTensor {
        let standardized = match &self.stats {
            Some(stats) => match stats.apply(sequence) {
                Ok(out) => Some(out),
                Err(e) => {
                    warn!(error = %e, "Skipping landmark standardization");
                    crate::metrics::record_fallback("normalize");
                    None
                }
            },
            None => None,
        };
        pad_or_truncate(standardized.as_ref().unwrap_or(sequence), self.target_len)
    }
}
