//! Video bytes to an ordered (T, 33, 3) pose tensor.
//!
//! The upload is spooled to a request-scoped temp file for the decoder, read
//! frame by frame, and landmark extraction fans out over small batches of
//! frames with rayon. `collect` keeps batch order, so the tensor stays in
//! temporal order. The temp file is removed when the builder returns,
//! whichever way it returns.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use champ_models::VideoInfo;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::decode::{Frame, FrameSource, VideoDecoder};
use crate::error::MediaResult;
use crate::landmarks::{extract_keypoints, LandmarkExtractor};
use crate::tensor::{stack_keypoints, KeypointSet, PoseTensor};

/// Frames decoded before each parallel extraction round.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Keypoints of every decoded frame plus container metadata.
#[derive(Debug, Clone)]
pub struct DecodedSequence {
    pub tensor: PoseTensor,
    pub frame_count: u64,
    pub fps: f64,
}

impl DecodedSequence {
    pub fn video_info(&self) -> VideoInfo {
        VideoInfo::new(self.frame_count, self.fps)
    }
}

#[derive(Debug, Clone)]
pub enum SequenceOutcome {
    Decoded(DecodedSequence),
    /// The container could not be opened or yielded no frames.
    NoData,
}

pub struct SequenceBuilder {
    decoder: Arc<dyn VideoDecoder>,
    extractor: Arc<dyn LandmarkExtractor>,
    batch_size: usize,
    decode_budget: Option<Duration>,
}

impl SequenceBuilder {
    pub fn new(decoder: Arc<dyn VideoDecoder>, extractor: Arc<dyn LandmarkExtractor>) -> Self {
        Self {
            decoder,
            extractor,
            batch_size: DEFAULT_BATCH_SIZE,
            decode_budget: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Stop decoding once this much wall time has passed; frames read so far
    /// are kept.
    pub fn with_decode_budget(mut self, budget: Option<Duration>) -> Self {
        self.decode_budget = budget;
        self
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    /// Decode `video` and extract one keypoint set per frame.
    pub fn build(&self, video: &[u8]) -> MediaResult<SequenceOutcome> {
        let mut temp = tempfile::Builder::new()
            .prefix("champ-upload-")
            .suffix(".mp4")
            .tempfile()?;
        temp.write_all(video)?;
        temp.flush()?;

        let outcome = self.build_from_path(temp.path());

        if let Err(e) = temp.close() {
            debug!(error = %e, "Failed to remove temporary video");
        }
        outcome
    }

    /// Decode an existing file. The caller owns the file.
    pub fn build_from_path(&self, path: &Path) -> MediaResult<SequenceOutcome> {
        let mut source = match self.decoder.open(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(decoder = self.decoder.name(), error = %e, "Could not open video");
                return Ok(SequenceOutcome::NoData);
            }
        };
        let fps = source.fps();

        let started_at = Instant::now();
        let keypoints = self.extract_all(source.as_mut(), started_at);
        let frame_count = keypoints.len() as u64;
        crate::metrics::record_frames(frame_count);
        crate::metrics::record_stage_duration("decode_extract", started_at.elapsed());

        if keypoints.is_empty() {
            info!(decoder = self.decoder.name(), "Video yielded no frames");
            return Ok(SequenceOutcome::NoData);
        }

        info!(
            frames = frame_count,
            fps,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            extractor = self.extractor.name(),
            "Pose sequence built"
        );

        Ok(SequenceOutcome::Decoded(DecodedSequence {
            tensor: stack_keypoints(&keypoints),
            frame_count,
            fps,
        }))
    }

    fn extract_all(&self, source: &mut dyn FrameSource, started_at: Instant) -> Vec<KeypointSet> {
        let mut keypoints = Vec::new();
        let mut batch: Vec<Frame> = Vec::with_capacity(self.batch_size);

        loop {
            if let Some(budget) = self.decode_budget {
                if started_at.elapsed() >= budget {
                    warn!(
                        elapsed = ?started_at.elapsed(),
                        frames = keypoints.len() + batch.len(),
                        "Stopping decode early due to wall-clock budget"
                    );
                    crate::metrics::record_fallback("decode_budget");
                    break;
                }
            }

            match source.next_frame() {
                Ok(Some(frame)) => {
                    batch.push(frame);
                    if batch.len() >= self.batch_size {
                        keypoints.extend(self.extract_batch(&batch));
                        batch.clear();
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        error = %e,
                        frame = keypoints.len() + batch.len(),
                        "Frame decode failed, ending sequence"
                    );
                    break;
                }
            }
        }

        if !batch.is_empty() {
            keypoints.extend(self.extract_batch(&batch));
        }
        keypoints
    }

    fn extract_batch(&self, frames: &[Frame]) -> Vec<KeypointSet> {
        let extractor = self.extractor.as_ref();
        frames
            .par_iter()
            .map(|frame| extract_keypoints(extractor, Some(frame)))
            .collect()
    }
}
