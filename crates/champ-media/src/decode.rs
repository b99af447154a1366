//! Video decoding strategy.
//!
//! Decoding is an environment capability: builds with the `opencv` feature get
//! [`OpenCvDecoder`], everything else has no decoder and the pipeline answers
//! with the stub result. Tests inject their own [`VideoDecoder`].

use std::path::Path;

use crate::error::MediaResult;

/// Byte order of a packed 8-bit, 3-channel pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// One decoded image. Dropped as soon as its landmarks are extracted.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
    /// Row-major HWC bytes, `width * height * 3` long
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            order,
            data,
        }
    }

    /// Pixel data as RGB, converting from BGR when needed.
    pub fn to_rgb(&self) -> Vec<u8> {
        match self.order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        }
    }
}

/// An opened video yielding frames in temporal order.
pub trait FrameSource {
    /// Container frame rate, 0 when unknown.
    fn fps(&self) -> f64;

    /// Next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> MediaResult<Option<Frame>>;
}

/// Opens video files for sequential decoding.
pub trait VideoDecoder: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;

    /// Decoder name for logging.
    fn name(&self) -> &'static str;
}

/// The decoder compiled into this build, if any.
pub fn default_decoder() -> Option<std::sync::Arc<dyn VideoDecoder>> {
    #[cfg(feature = "opencv")]
    {
        Some(std::sync::Arc::new(opencv_backend::OpenCvDecoder))
    }
    #[cfg(not(feature = "opencv"))]
    {
        None
    }
}

#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvDecoder;

#[cfg(feature = "opencv")]
mod opencv_backend {
    use std::path::Path;

    use opencv::core::Mat;
    use opencv::prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst};
    use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS};
    use tracing::debug;

    use super::{ChannelOrder, Frame, FrameSource, VideoDecoder};
    use crate::error::{MediaError, MediaResult};

    /// OpenCV `VideoCapture` decoder. Frames come out as BGR.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct OpenCvDecoder;

    impl VideoDecoder for OpenCvDecoder {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
            let path_str = path
                .to_str()
                .ok_or_else(|| MediaError::open_failed("Non UTF-8 video path"))?;

            let cap = VideoCapture::from_file(path_str, CAP_ANY)
                .map_err(|e| MediaError::open_failed(format!("{e}")))?;
            if !cap.is_opened().unwrap_or(false) {
                return Err(MediaError::open_failed(format!(
                    "Failed to open video file: {path_str}"
                )));
            }

            let fps = cap.get(CAP_PROP_FPS).unwrap_or(0.0);
            debug!(path = path_str, fps, "Video opened");
            Ok(Box::new(OpenCvFrames { cap, fps }))
        }

        fn name(&self) -> &'static str {
            "opencv"
        }
    }

    struct OpenCvFrames {
        cap: VideoCapture,
        fps: f64,
    }

    impl FrameSource for OpenCvFrames {
        fn fps(&self) -> f64 {
            if self.fps.is_finite() && self.fps > 0.0 {
                self.fps
            } else {
                0.0
            }
        }

        fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
            let mut mat = Mat::default();
            let ok = self
                .cap
                .read(&mut mat)
                .map_err(|e| MediaError::decode_failed(format!("{e}")))?;
            if !ok || mat.empty() {
                return Ok(None);
            }
            mat_to_frame(&mat).map(Some)
        }
    }

    fn mat_to_frame(mat: &Mat) -> MediaResult<Frame> {
        if mat.channels() != 3 {
            return Err(MediaError::decode_failed(format!(
                "Expected 3-channel frame, got {}",
                mat.channels()
            )));
        }
        let width = mat.cols() as u32;
        let height = mat.rows() as u32;

        // Rows may be padded; clone into a continuous buffer first.
        let continuous;
        let mat = if mat.is_continuous() {
            mat
        } else {
            continuous = mat
                .try_clone()
                .map_err(|e| MediaError::decode_failed(format!("Mat clone: {e}")))?;
            &continuous
        };

        let data = mat
            .data_bytes()
            .map_err(|e| MediaError::decode_failed(format!("Mat data: {e}")))?
            .to_vec();
        Ok(Frame::new(width, height, ChannelOrder::Bgr, data))
    }
}
