//! Inference result returned to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

/// Basic properties of the decoded video.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoInfo {
    /// Number of frames actually decoded
    pub frame_count: u64,
    /// Duration in seconds (`frame_count / fps`, 0 when fps is unknown)
    pub duration: f64,
    /// Container frame rate
    pub fps: f64,
}

impl VideoInfo {
    pub fn new(frame_count: u64, fps: f64) -> Self {
        let duration = if fps > 0.0 {
            frame_count as f64 / fps
        } else {
            0.0
        };
        Self {
            frame_count,
            duration,
            fps,
        }
    }
}

/// Flat scoring payload consumed by the mobile client.
///
/// Immutable once built; the service layer keeps at most the latest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InferenceResult {
    /// Final fused score in [0, 100]
    pub score: f64,
    /// 1 when the anomaly detector flagged the movement
    pub cheat_detected: u8,
    pub analysis: AnalysisResult,
    pub video_info: VideoInfo,
}

impl InferenceResult {
    /// Stub returned when the process has no video-decode capability.
    pub fn unavailable() -> Self {
        Self::degraded(AnalysisResult::unavailable())
    }

    /// Result for a video that decoded to zero frames.
    pub fn no_data() -> Self {
        Self::degraded(AnalysisResult::no_data())
    }

    fn degraded(analysis: AnalysisResult) -> Self {
        Self {
            score: 0.0,
            cheat_detected: 0,
            analysis,
            video_info: VideoInfo::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.analysis.overall_rating.is_sentinel()
    }
}

/// Body of `GET /results/latest`: the last result, or a bare placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LatestResult {
    Available(InferenceResult),
    Empty { score: f64, cheat_detected: u8 },
}

impl LatestResult {
    pub fn empty() -> Self {
        Self::Empty {
            score: 0.0,
            cheat_detected: 0,
        }
    }
}
