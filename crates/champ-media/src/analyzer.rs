//! Biomechanical analysis: four heuristic sub-scores over the pose tensor.
//!
//! All scores are in [0, 100] and fall back to [`DEFAULT_SUB_SCORE`] when a
//! sequence carries too little signal. Zero rows (no pose, padding) are never
//! counted as observations.

use std::sync::{Arc, Mutex};

use champ_models::AnalysisResult;
use ndarray::{ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tensor::{landmark, visible_points, PoseTensor};

/// Sub-score used when there is nothing to measure.
pub const DEFAULT_SUB_SCORE: f64 = 50.0;

/// Shoulder height difference (in coordinate units) that zeroes alignment.
const FORM_SCALE: f64 = 100.0;

/// Positional variance that zeroes consistency.
const CONSISTENCY_SCALE: f64 = 1000.0;

/// Multiplier from mean centroid displacement to power score.
const POWER_SCALE: f64 = 10.0;

/// Frames need more visible landmarks than this to get a technique score.
const TECHNIQUE_MIN_POINTS: usize = 5;

/// Joints tracked for consistency: shoulders and hips.
const CONSISTENCY_JOINTS: [usize; 4] = [
    landmark::LEFT_SHOULDER,
    landmark::RIGHT_SHOULDER,
    landmark::LEFT_HIP,
    landmark::RIGHT_HIP,
];

/// Per-frame technique score source.
///
/// Technique has no real model yet; production draws a noisy placeholder,
/// tests swap in something deterministic.
pub trait TechniqueSampler: Send + Sync {
    /// Raw score for one frame. Callers clamp to [0, 100].
    fn sample(&self) -> f64;
}

/// `60 + N(0, 10)` per frame.
pub struct GaussianPlaceholder {
    rng: Mutex<StdRng>,
}

impl GaussianPlaceholder {
    pub const MEAN: f64 = 60.0;
    pub const STD_DEV: f64 = 10.0;

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl TechniqueSampler for GaussianPlaceholder {
    fn sample(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        // Box-Muller; u1 in (0, 1] keeps ln finite.
        let u1: f64 = 1.0 - rng.random::<f64>();
        let u2: f64 = rng.random();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        Self::MEAN + Self::STD_DEV * z
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSampler(pub f64);

impl TechniqueSampler for ConstantSampler {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Scores a normalized pose tensor.
#[derive(Clone)]
pub struct BiomechanicalAnalyzer {
    sampler: Arc<dyn TechniqueSampler>,
}

impl Default for BiomechanicalAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(GaussianPlaceholder::from_entropy()))
    }
}

impl std::fmt::Debug for BiomechanicalAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiomechanicalAnalyzer").finish_non_exhaustive()
    }
}

impl BiomechanicalAnalyzer {
    pub fn new(sampler: Arc<dyn TechniqueSampler>) -> Self {
        Self { sampler }
    }

    pub fn analyze(&self, sequence: &PoseTensor) -> AnalysisResult {
        AnalysisResult::from_scores(
            analyze_form(sequence),
            analyze_consistency(sequence),
            analyze_power(sequence),
            self.analyze_technique(sequence),
        )
    }

    /// Mean placeholder score over frames with enough visible landmarks.
    pub fn analyze_technique(&self, sequence: &PoseTensor) -> f64 {
        let scores: Vec<f64> = sequence
            .axis_iter(Axis(0))
            .filter(|frame| visible_points(frame).count() > TECHNIQUE_MIN_POINTS)
            .map(|_| self.sampler.sample().clamp(0.0, 100.0))
            .collect();
        mean(&scores).unwrap_or(DEFAULT_SUB_SCORE)
    }
}

/// Shoulder levelness averaged over frames where both shoulders are visible.
pub fn analyze_form(sequence: &PoseTensor) -> f64 {
    let scores: Vec<f64> = sequence
        .axis_iter(Axis(0))
        .filter_map(|frame| {
            let left = frame.row(landmark::LEFT_SHOULDER);
            let right = frame.row(landmark::RIGHT_SHOULDER);
            if row_is_zero(&left) || row_is_zero(&right) {
                return None;
            }
            let diff = (f64::from(left[1]) - f64::from(right[1])).abs();
            Some((1.0 - diff / FORM_SCALE).clamp(0.0, 1.0) * 100.0)
        })
        .collect();
    mean(&scores).unwrap_or(DEFAULT_SUB_SCORE)
}

/// Positional stability of shoulders and hips in the image plane.
pub fn analyze_consistency(sequence: &PoseTensor) -> f64 {
    if sequence.len_of(Axis(0)) < 2 {
        return DEFAULT_SUB_SCORE;
    }

    let scores: Vec<f64> = CONSISTENCY_JOINTS
        .iter()
        .filter_map(|&joint| {
            let track = sequence.index_axis(Axis(1), joint);
            let (xs, ys): (Vec<f64>, Vec<f64>) = track
                .axis_iter(Axis(0))
                .filter(|p| !(p[0] == 0.0 && p[1] == 0.0))
                .map(|p| (f64::from(p[0]), f64::from(p[1])))
                .unzip();
            if xs.len() < 2 {
                return None;
            }
            let variance = (population_variance(&xs) + population_variance(&ys)) / 2.0;
            Some((1.0 - variance / CONSISTENCY_SCALE).max(0.0))
        })
        .collect();

    mean(&scores).map_or(DEFAULT_SUB_SCORE, |m| m * 100.0)
}

/// Mean frame-to-frame displacement of the visible-landmark centroid.
pub fn analyze_power(sequence: &PoseTensor) -> f64 {
    if sequence.len_of(Axis(0)) < 2 {
        return DEFAULT_SUB_SCORE;
    }

    let centroids: Vec<Option<[f64; 3]>> = sequence
        .axis_iter(Axis(0))
        .map(|frame| centroid(visible_points(&frame)))
        .collect();

    let displacements: Vec<f64> = centroids
        .windows(2)
        .filter_map(|pair| match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) if !is_origin(&prev) && !is_origin(&curr) => Some(
                prev.iter()
                    .zip(&curr)
                    .map(|(a, b)| (b - a).powi(2))
                    .sum::<f64>()
                    .sqrt(),
            ),
            _ => None,
        })
        .collect();

    mean(&displacements).map_or(DEFAULT_SUB_SCORE, |m| (m * POWER_SCALE).clamp(0.0, 100.0))
}

fn row_is_zero(row: &ArrayView1<f32>) -> bool {
    row.iter().all(|&v| v == 0.0)
}

fn is_origin(point: &[f64; 3]) -> bool {
    point.iter().all(|&v| v == 0.0)
}

fn centroid(points: impl Iterator<Item = [f32; 3]>) -> Option<[f64; 3]> {
    let mut sum = [0.0f64; 3];
    let mut count = 0usize;
    for point in points {
        for (acc, v) in sum.iter_mut().zip(point) {
            *acc += f64::from(v);
        }
        count += 1;
    }
    (count > 0).then(|| sum.map(|v| v / count as f64))
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn population_variance(values: &[f64]) -> f64 {
    let Some(m) = mean(values) else {
        return 0.0;
    };
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
