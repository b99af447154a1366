//! Video-to-score inference pipeline for athlete movement clips.
//!
//! This crate provides:
//! - Frame decoding behind a swappable [`VideoDecoder`] (OpenCV when built
//!   with the `opencv` feature)
//! - Per-frame pose landmark extraction into fixed (33, 3) keypoint sets
//! - Temporal normalization to a fixed sequence length
//! - Heuristic biomechanical sub-scores with rating and feedback
//! - Model-backed performance prediction and anomaly detection
//! - Score fusion and end-to-end orchestration that never fails

pub mod analyzer;
pub mod anomaly;
pub mod config;
pub mod decode;
pub mod error;
pub mod fusion;
pub mod landmark_model;
pub mod landmarks;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod predictor;
pub mod sequence;
pub mod tensor;

pub use analyzer::{BiomechanicalAnalyzer, ConstantSampler, GaussianPlaceholder, TechniqueSampler};
pub use anomaly::AnomalyDetector;
pub use config::PipelineConfig;
pub use decode::{default_decoder, ChannelOrder, Frame, FrameSource, VideoDecoder};
pub use error::{MediaError, MediaResult};
pub use fusion::fuse_scores;
pub use landmark_model::{OrtPoseLandmarker, PresenceActivation};
pub use landmarks::{extract_keypoints, Landmark, LandmarkExtractor, NullLandmarkExtractor};
pub use models::{load_first_model, load_model, InputLayout, TensorModel};
pub use normalize::{NormalizationStats, TemporalNormalizer};
pub use pipeline::{InferencePipeline, InferencePipelineBuilder, PipelineCapabilities};
pub use predictor::PerformancePredictor;
pub use sequence::{DecodedSequence, SequenceBuilder, SequenceOutcome};
pub use tensor::{KeypointSet, PoseTensor, NUM_COORDS, NUM_LANDMARKS, ZERO_KEYPOINTS};
