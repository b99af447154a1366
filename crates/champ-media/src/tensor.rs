//! Keypoint sets and the (T, 33, 3) pose tensor.

use ndarray::{Array3, ArrayView2, Axis};

/// Landmarks per frame (MediaPipe / BlazePose topology).
pub const NUM_LANDMARKS: usize = 33;

/// Coordinates per landmark: x, y, z.
pub const NUM_COORDS: usize = 3;

/// Frames fed to the models after temporal normalization.
pub const DEFAULT_TARGET_LEN: usize = 120;

/// Landmark indices used by the analyzer.
pub mod landmark {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
}

/// One frame's landmarks. The fixed array type keeps the shape at (33, 3)
/// no matter what the detector produced.
pub type KeypointSet = [[f32; NUM_COORDS]; NUM_LANDMARKS];

/// Time-indexed keypoints, shape (T, 33, 3).
pub type PoseTensor = Array3<f32>;

/// The all-zero sentinel emitted when no pose is available.
pub const ZERO_KEYPOINTS: KeypointSet = [[0.0; NUM_COORDS]; NUM_LANDMARKS];

/// Stack per-frame keypoint sets into a tensor, preserving order.
pub fn stack_keypoints(frames: &[KeypointSet]) -> PoseTensor {
    Array3::from_shape_fn((frames.len(), NUM_LANDMARKS, NUM_COORDS), |(t, j, c)| {
        frames[t][j][c]
    })
}

/// True when every coordinate of the landmark row is exactly zero.
#[inline]
pub fn is_zero_point(point: &[f32]) -> bool {
    point.iter().all(|&v| v == 0.0)
}

/// Landmarks of a frame that carry any non-zero coordinate.
pub fn visible_points<'a, 'b>(frame: &'a ArrayView2<'b, f32>) -> impl Iterator<Item = [f32; 3]> + 'a {
    frame.axis_iter(Axis(0)).filter_map(|row| {
        let point = [row[0], row[1], row[2]];
        (!is_zero_point(&point)).then_some(point)
    })
}
