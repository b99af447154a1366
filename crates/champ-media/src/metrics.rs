//! Pipeline metrics, recorded through the `metrics` facade.
//!
//! Nothing is exported unless the host process installs a recorder.

use std::time::Duration;

use ::metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const VIDEOS_PROCESSED_TOTAL: &str = "champ_videos_processed_total";
    pub const FRAMES_DECODED_TOTAL: &str = "champ_frames_decoded_total";
    pub const STAGE_DURATION_SECONDS: &str = "champ_stage_duration_seconds";
    pub const FALLBACKS_TOTAL: &str = "champ_fallbacks_total";
    pub const CHEAT_DETECTED_TOTAL: &str = "champ_cheat_detected_total";
}

/// Record a finished video. `outcome` is `scored`, `no_data` or `unavailable`.
pub fn record_video_processed(outcome: &'static str) {
    counter!(names::VIDEOS_PROCESSED_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_frames(count: u64) {
    counter!(names::FRAMES_DECODED_TOTAL).increment(count);
}

pub fn record_stage_duration(stage: &'static str, elapsed: Duration) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(elapsed.as_secs_f64());
}

/// A stage swallowed an error and used its default.
pub fn record_fallback(stage: &'static str) {
    counter!(names::FALLBACKS_TOTAL, "stage" => stage).increment(1);
}

pub fn record_cheat_detected() {
    counter!(names::CHEAT_DETECTED_TOTAL).increment(1);
}
