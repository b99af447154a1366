//! Per-frame pose landmark extraction.
//!
//! Detection itself is an external capability behind [`LandmarkExtractor`].
//! Whatever the backend does, callers get a (33, 3) [`KeypointSet`]: a missing
//! detector, a detector error, no pose in frame, or no frame at all all yield
//! [`ZERO_KEYPOINTS`].

use tracing::debug;

use crate::decode::Frame;
use crate::error::MediaResult;
use crate::tensor::{KeypointSet, NUM_LANDMARKS, ZERO_KEYPOINTS};

/// One detected landmark, coordinates as emitted by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Pose detection backend.
pub trait LandmarkExtractor: Send + Sync {
    /// Detect a single pose. `Ok(None)` means no person was found.
    ///
    /// Backends may return fewer than 33 landmarks; extras are ignored.
    fn detect(&self, frame: &Frame) -> MediaResult<Option<Vec<Landmark>>>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Used when no landmark model is configured. Always finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLandmarkExtractor;

impl LandmarkExtractor for NullLandmarkExtractor {
    fn detect(&self, _frame: &Frame) -> MediaResult<Option<Vec<Landmark>>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Run the extractor and fold every failure mode into the zero set.
pub fn extract_keypoints(extractor: &dyn LandmarkExtractor, frame: Option<&Frame>) -> KeypointSet {
    let Some(frame) = frame else {
        return ZERO_KEYPOINTS;
    };

    match extractor.detect(frame) {
        Ok(Some(landmarks)) => to_keypoint_set(&landmarks),
        Ok(None) => ZERO_KEYPOINTS,
        Err(e) => {
            debug!(extractor = extractor.name(), error = %e, "Landmark detection failed, using zeros");
            crate::metrics::record_fallback("landmarks");
            ZERO_KEYPOINTS
        }
    }
}

/// Copy up to 33 landmarks into a fixed set; missing indices stay zero.
pub fn to_keypoint_set(landmarks: &[Landmark]) -> KeypointSet {
    let mut out = ZERO_KEYPOINTS;
    for (slot, lm) in out.iter_mut().zip(landmarks.iter().take(NUM_LANDMARKS)) {
        *slot = [lm.x, lm.y, lm.z];
    }
    out
}
