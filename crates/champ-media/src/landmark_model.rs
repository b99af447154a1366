//! ONNX Runtime pose landmark backend (BlazePose full-body landmark model).
//!
//! The whole frame is resized to the model input (no person-detector ROI
//! stage), which is adequate for single-athlete clips. Landmark x/y come out
//! in input pixels and are normalized to [0, 1]; z is scaled by input width.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use crate::decode::Frame;
use crate::error::{MediaError, MediaResult};
use crate::landmarks::{Landmark, LandmarkExtractor};
use crate::models::onnx::create_session;
use crate::tensor::NUM_LANDMARKS;

/// Values per landmark in the model output: x, y, z, visibility, presence.
const VALUES_PER_LANDMARK: usize = 5;

/// Minimum pose presence score to accept a detection.
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Square model input size.
const INPUT_SIZE: u32 = 256;

/// How the presence output is encoded by the exported graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresenceActivation {
    /// Raw logit; a sigmoid is applied before thresholding.
    #[default]
    Logit,
    /// Already a probability in [0, 1].
    Probability,
}

impl PresenceActivation {
    /// Presence probability for a raw output value.
    pub fn probability(self, raw: f32) -> f32 {
        match self {
            Self::Logit => 1.0 / (1.0 + (-raw).exp()),
            Self::Probability => raw,
        }
    }

    pub fn accepts(self, raw: f32) -> bool {
        self.probability(raw) >= PRESENCE_THRESHOLD
    }
}

impl FromStr for PresenceActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logit" | "sigmoid" => Ok(Self::Logit),
            "probability" | "none" => Ok(Self::Probability),
            other => Err(format!("unknown presence activation: {other}")),
        }
    }
}

pub struct OrtPoseLandmarker {
    session: Mutex<Session>,
    landmarks_output: String,
    presence_output: Option<String>,
    activation: PresenceActivation,
}

impl OrtPoseLandmarker {
    pub fn load(model_path: &Path, activation: PresenceActivation) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::model_not_found(model_path));
        }
        let session = create_session(model_path)?;

        let mut names = session.outputs.iter().map(|o| o.name.clone());
        let landmarks_output = names
            .next()
            .ok_or_else(|| MediaError::inference_failed("Landmark model has no outputs"))?;
        let presence_output = names.next();

        info!(
            model_path = %model_path.display(),
            landmarks_output = %landmarks_output,
            presence_activation = ?activation,
            "Pose landmark model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            landmarks_output,
            presence_output,
            activation,
        })
    }

    fn preprocess(frame: &Frame) -> MediaResult<Value> {
        let rgb = RgbImage::from_raw(frame.width, frame.height, frame.to_rgb())
            .ok_or_else(|| MediaError::landmark_failed("Frame buffer does not match its size"))?;
        let resized = DynamicImage::ImageRgb8(rgb)
            .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
            .to_rgb8();

        // NHWC, values in [0, 1]
        let data: Vec<f32> = resized.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        let shape = vec![1usize, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];
        Tensor::from_array((shape, data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::landmark_failed(format!("ORT tensor: {e}")))
    }
}

impl LandmarkExtractor for OrtPoseLandmarker {
    fn detect(&self, frame: &Frame) -> MediaResult<Option<Vec<Landmark>>> {
        let input = Self::preprocess(frame)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::landmark_failed("ORT session poisoned"))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::landmark_failed(format!("ORT run failed: {e}")))?;

        if let Some(name) = &self.presence_output {
            if let Some(score) = outputs.get(name.as_str()) {
                let (_, data) = score
                    .try_extract_tensor::<f32>()
                    .map_err(|e| MediaError::landmark_failed(format!("ORT extract: {e}")))?;
                if data.first().is_some_and(|&p| !self.activation.accepts(p)) {
                    return Ok(None);
                }
            }
        }

        let raw = outputs
            .get(self.landmarks_output.as_str())
            .ok_or_else(|| MediaError::landmark_failed("ORT returned no landmark output"))?;
        let (_, data) = raw
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::landmark_failed(format!("ORT extract: {e}")))?;

        Ok(Some(decode_landmarks(data, INPUT_SIZE as f32)))
    }

    fn name(&self) -> &'static str {
        "ort_blazepose"
    }
}

/// Turn the flat `[N * 5]` output into normalized landmarks.
fn decode_landmarks(data: &[f32], input_size: f32) -> Vec<Landmark> {
    data.chunks_exact(VALUES_PER_LANDMARK)
        .take(NUM_LANDMARKS)
        .map(|v| Landmark {
            x: v[0] / input_size,
            y: v[1] / input_size,
            z: v[2] / input_size,
        })
        .collect()
}
