//! Linear scorer over pose features, stored as JSON.
//!
//! ```json
//! { "kind": "linear", "weights": [... 99 values ...], "bias": 0.0, "activation": "sigmoid" }
//! ```
//!
//! With 99 weights the model scores every frame independently. With
//! `T * 99` weights it scores the whole flattened sequence once.

use serde::Deserialize;

use super::{frames_as_rows, TensorModel, FRAME_FEATURES};
use crate::error::{MediaError, MediaResult};
use crate::tensor::PoseTensor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Identity,
}

impl Activation {
    fn apply(self, v: f32) -> f32 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-v).exp()),
            Self::Identity => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f32>,
    #[serde(default)]
    pub bias: f32,
    #[serde(default)]
    pub activation: Activation,
}

impl LinearModel {
    pub fn new(weights: Vec<f32>, bias: f32, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub(crate) fn validated(self) -> MediaResult<Self> {
        if self.weights.is_empty() || self.weights.len() % FRAME_FEATURES != 0 {
            return Err(MediaError::UnsupportedModel(format!(
                "linear model needs a multiple of {FRAME_FEATURES} weights, got {}",
                self.weights.len()
            )));
        }
        Ok(self)
    }

    fn score(&self, features: impl Iterator<Item = f32>) -> f32 {
        let dot: f32 = features.zip(&self.weights).map(|(x, w)| x * w).sum();
        self.activation.apply(dot + self.bias)
    }
}

impl TensorModel for LinearModel {
    fn run(&self, input: &PoseTensor) -> MediaResult<Vec<f32>> {
        if self.weights.len() == FRAME_FEATURES {
            let rows = frames_as_rows(input)?;
            return Ok(rows
                .outer_iter()
                .map(|row| self.score(row.iter().copied()))
                .collect());
        }

        if self.weights.len() != input.len() {
            return Err(MediaError::shape_mismatch(format!(
                "linear model expects {} values, input has {}",
                self.weights.len(),
                input.len()
            )));
        }
        Ok(vec![self.score(input.iter().copied())])
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
