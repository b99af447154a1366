//! Final score fusion.

use champ_models::AnalysisResult;

/// Share of the model prediction in a clean score.
pub const PREDICTION_WEIGHT: f64 = 0.6;
/// Share of the weighted sub-scores in a clean score.
pub const ANALYSIS_WEIGHT: f64 = 0.4;
/// Multiplier applied to the prediction when an anomaly was detected.
pub const CHEAT_PENALTY: f64 = 0.3;

const FORM_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.25;
const POWER_WEIGHT: f64 = 0.25;
const TECHNIQUE_WEIGHT: f64 = 0.2;

/// Weighted blend of the four sub-scores.
pub fn weighted_analysis(analysis: &AnalysisResult) -> f64 {
    FORM_WEIGHT * analysis.form_score
        + CONSISTENCY_WEIGHT * analysis.consistency_score
        + POWER_WEIGHT * analysis.power_score
        + TECHNIQUE_WEIGHT * analysis.technique_score
}

/// Combine prediction, analysis and anomaly flag into a score in [0, 100].
///
/// A flagged movement ignores the analysis entirely and keeps 30% of the
/// predicted score.
pub fn fuse_scores(prediction: f64, analysis: &AnalysisResult, cheat_detected: u8) -> f64 {
    let predicted = prediction * 100.0;
    let score = if cheat_detected == 1 {
        predicted * CHEAT_PENALTY
    } else {
        predicted * PREDICTION_WEIGHT + weighted_analysis(analysis) * ANALYSIS_WEIGHT
    };
    score.clamp(0.0, 100.0)
}
