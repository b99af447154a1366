//! Per-frame outlier labeler stored as JSON.
//!
//! ```json
//! { "kind": "envelope", "mean": [...99...], "std": [...99...], "threshold": 4.0 }
//! ```
//!
//! A frame is an outlier (`-1`) when any feature lies more than `threshold`
//! standard deviations from its mean, otherwise an inlier (`1`). All-zero
//! frames (no pose, padding) are always inliers.

use serde::Deserialize;

use super::{frames_as_rows, TensorModel, FRAME_FEATURES};
use crate::error::{MediaError, MediaResult};
use crate::tensor::{is_zero_point, PoseTensor};

pub const INLIER: f32 = 1.0;
pub const OUTLIER: f32 = -1.0;

fn default_threshold() -> f32 {
    4.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvelopeModel {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl EnvelopeModel {
    pub fn new(mean: Vec<f32>, std: Vec<f32>, threshold: f32) -> Self {
        Self {
            mean,
            std,
            threshold,
        }
    }

    pub(crate) fn validated(self) -> MediaResult<Self> {
        if self.mean.len() != FRAME_FEATURES || self.std.len() != FRAME_FEATURES {
            return Err(MediaError::UnsupportedModel(format!(
                "envelope model needs {FRAME_FEATURES} mean/std values, got {}/{}",
                self.mean.len(),
                self.std.len()
            )));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(MediaError::UnsupportedModel(format!(
                "envelope threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(self)
    }

    fn label(&self, row: &[f32]) -> f32 {
        if is_zero_point(row) {
            return INLIER;
        }
        let outside = row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .any(|(&x, (&m, &s))| {
                let s = if s == 0.0 { 1.0 } else { s };
                ((x - m) / s).abs() > self.threshold
            });
        if outside {
            OUTLIER
        } else {
            INLIER
        }
    }
}

impl TensorModel for EnvelopeModel {
    fn run(&self, input: &PoseTensor) -> MediaResult<Vec<f32>> {
        let rows = frames_as_rows(input)?;
        Ok(rows
            .outer_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.label(slice),
                None => self.label(&row.to_vec()),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "envelope"
    }
}
