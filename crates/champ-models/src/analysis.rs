//! Biomechanical analysis result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rating::PerformanceRating;

/// Sub-scores below this value produce a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

pub const FORM_RECOMMENDATION: &str = "Focus on improving your posture and body alignment";
pub const CONSISTENCY_RECOMMENDATION: &str = "Work on maintaining consistent movement patterns";
pub const POWER_RECOMMENDATION: &str = "Increase your explosive power and speed";
pub const TECHNIQUE_RECOMMENDATION: &str = "Practice proper technique and form";
pub const POSITIVE_RECOMMENDATION: &str = "Great job! Keep up the excellent work";

pub const NO_CAMERA_RECOMMENDATION: &str = "Camera not available for analysis";
pub const NO_DATA_RECOMMENDATION: &str = "No video data detected";

/// Four 0-100 sub-scores plus the derived rating and feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub form_score: f64,
    pub consistency_score: f64,
    pub power_score: f64,
    pub technique_score: f64,
    pub overall_rating: PerformanceRating,
    pub recommendations: Vec<String>,
}

impl AnalysisResult {
    /// Build a result from sub-scores, deriving rating and recommendations.
    pub fn from_scores(form: f64, consistency: f64, power: f64, technique: f64) -> Self {
        let overall = (form + consistency + power + technique) / 4.0;

        let mut recommendations = Vec::new();
        for (score, message) in [
            (form, FORM_RECOMMENDATION),
            (consistency, CONSISTENCY_RECOMMENDATION),
            (power, POWER_RECOMMENDATION),
            (technique, TECHNIQUE_RECOMMENDATION),
        ] {
            if score < RECOMMENDATION_THRESHOLD {
                recommendations.push(message.to_string());
            }
        }
        if recommendations.is_empty() {
            recommendations.push(POSITIVE_RECOMMENDATION.to_string());
        }

        Self {
            form_score: form,
            consistency_score: consistency,
            power_score: power,
            technique_score: technique,
            overall_rating: PerformanceRating::from_score(overall),
            recommendations,
        }
    }

    /// Analysis placeholder used when the process cannot decode video at all.
    pub fn unavailable() -> Self {
        Self::sentinel(PerformanceRating::NoAnalysisAvailable, NO_CAMERA_RECOMMENDATION)
    }

    /// Analysis placeholder used when decoding yielded zero frames.
    pub fn no_data() -> Self {
        Self::sentinel(PerformanceRating::NoData, NO_DATA_RECOMMENDATION)
    }

    fn sentinel(rating: PerformanceRating, message: &str) -> Self {
        Self {
            form_score: 0.0,
            consistency_score: 0.0,
            power_score: 0.0,
            technique_score: 0.0,
            overall_rating: rating,
            recommendations: vec![message.to_string()],
        }
    }

    /// Mean of the four sub-scores.
    pub fn overall_score(&self) -> f64 {
        (self.form_score + self.consistency_score + self.power_score + self.technique_score) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendations_follow_sub_score_order() {
        let analysis = AnalysisResult::from_scores(10.0, 90.0, 69.9, 0.0);
        assert_eq!(
            analysis.recommendations,
            vec![
                FORM_RECOMMENDATION.to_string(),
                POWER_RECOMMENDATION.to_string(),
                TECHNIQUE_RECOMMENDATION.to_string(),
            ]
        );
        assert_eq!(analysis.overall_rating, PerformanceRating::NeedsImprovement);
    }

    #[test]
    fn test_all_strong_scores_get_single_positive_message() {
        let analysis = AnalysisResult::from_scores(70.0, 95.0, 88.0, 91.0);
        assert_eq!(analysis.recommendations, vec![POSITIVE_RECOMMENDATION.to_string()]);
        assert_eq!(analysis.overall_rating, PerformanceRating::Excellent);
    }

    #[test]
    fn test_sentinels_have_one_message_and_zero_scores() {
        let no_data = AnalysisResult::no_data();
        assert_eq!(no_data.overall_rating, PerformanceRating::NoData);
        assert_eq!(no_data.recommendations, vec![NO_DATA_RECOMMENDATION.to_string()]);
        assert_eq!(no_data.overall_score(), 0.0);

        let unavailable = AnalysisResult::unavailable();
        assert_eq!(unavailable.overall_rating, PerformanceRating::NoAnalysisAvailable);
        assert_eq!(unavailable.recommendations.len(), 1);
    }
}
