//! ONNX Runtime model backend.
//!
//! Execution providers:
//! - CUDA on Linux with NVIDIA GPU (when `cuda` feature enabled)
//! - CoreML on macOS
//! - CPU everywhere else

use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use super::{InputLayout, TensorModel, FRAME_FEATURES};
use crate::error::{MediaError, MediaResult};
use crate::tensor::PoseTensor;

/// Single-input, single-output ONNX graph over the pose tensor.
pub struct OnnxModel {
    session: Mutex<Session>,
    layout: InputLayout,
    output: String,
}

impl OnnxModel {
    pub fn load(model_path: &Path, layout: InputLayout) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::model_not_found(model_path));
        }
        let session = create_session(model_path)?;
        let output = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MediaError::inference_failed("Model has no outputs"))?;

        Ok(Self {
            session: Mutex::new(session),
            layout,
            output,
        })
    }

    fn input_value(&self, input: &PoseTensor) -> MediaResult<Value> {
        let (frames, landmarks, coords) = input.dim();
        let shape = match self.layout {
            InputLayout::Sequence => vec![1usize, frames, landmarks, coords],
            InputLayout::Frames => vec![frames, FRAME_FEATURES],
        };
        let data: Vec<f32> = input.iter().copied().collect();
        Tensor::from_array((shape, data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::inference_failed(format!("ORT tensor: {e}")))
    }
}

impl TensorModel for OnnxModel {
    fn run(&self, input: &PoseTensor) -> MediaResult<Vec<f32>> {
        let value = self.input_value(input)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::inference_failed("ORT session poisoned"))?;
        let outputs = session
            .run(ort::inputs![value])
            .map_err(|e| MediaError::inference_failed(format!("ORT run failed: {e}")))?;
        let output = outputs
            .get(self.output.as_str())
            .ok_or_else(|| MediaError::inference_failed("ORT returned no output"))?;

        // Regressors emit floats, sklearn-converted classifiers emit int64 labels.
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return Ok(data.to_vec());
        }
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return Ok(data.iter().map(|&v| v as f32).collect());
        }
        let (_, data) = output
            .try_extract_tensor::<i32>()
            .map_err(|e| MediaError::inference_failed(format!("ORT extract: {e}")))?;
        Ok(data.iter().map(|&v| v as f32).collect())
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Build a session with the best available execution provider.
pub(crate) fn create_session(model_path: &Path) -> MediaResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| MediaError::internal(format!("Failed to read model file: {e}")))?;

    let builder = Session::builder()
        .map_err(|e| MediaError::internal(format!("Failed to create session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::internal(format!("Failed to set optimization level: {e}")))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(model = %model_path.display(), "Using CUDA execution provider");
                return Ok(session);
            }
        }
        info!("CUDA execution provider not available, falling back");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!(model = %model_path.display(), "Using CoreML execution provider");
                return Ok(session);
            }
        }
        info!("CoreML execution provider not available, using CPU");
    }

    info!(model = %model_path.display(), "Using CPU execution provider");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| MediaError::internal(format!("Failed to load model: {e}")))
}
