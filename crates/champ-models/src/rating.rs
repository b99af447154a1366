//! Qualitative performance rating tiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall rating derived from the mean of the four analysis sub-scores.
///
/// The last two variants are sentinels used by degraded results and never
/// come out of [`PerformanceRating::from_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PerformanceRating {
    #[serde(rename = "Elite")]
    Elite,
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    /// Decoding produced zero frames.
    #[serde(rename = "No Data")]
    NoData,
    /// No video-decode capability in this process.
    #[serde(rename = "No Analysis Available")]
    NoAnalysisAvailable,
}

impl PerformanceRating {
    /// Map an overall score (0-100) to its tier. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Elite
        } else if score >= 80.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elite => "Elite",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::NeedsImprovement => "Needs Improvement",
            Self::NoData => "No Data",
            Self::NoAnalysisAvailable => "No Analysis Available",
        }
    }

    /// Returns true for the degraded-mode sentinels.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoData | Self::NoAnalysisAvailable)
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(PerformanceRating::from_score(90.0), PerformanceRating::Elite);
        assert_eq!(PerformanceRating::from_score(80.0), PerformanceRating::Excellent);
        assert_eq!(PerformanceRating::from_score(70.0), PerformanceRating::Good);
        assert_eq!(PerformanceRating::from_score(60.0), PerformanceRating::Average);
        assert_eq!(
            PerformanceRating::from_score(59.999),
            PerformanceRating::NeedsImprovement
        );
        assert_eq!(PerformanceRating::from_score(100.0), PerformanceRating::Elite);
        assert_eq!(
            PerformanceRating::from_score(0.0),
            PerformanceRating::NeedsImprovement
        );
    }

    #[test]
    fn test_serializes_as_display_string() {
        let json = serde_json::to_string(&PerformanceRating::NeedsImprovement).unwrap();
        assert_eq!(json, "\"Needs Improvement\"");

        let parsed: PerformanceRating = serde_json::from_str("\"No Analysis Available\"").unwrap();
        assert_eq!(parsed, PerformanceRating::NoAnalysisAvailable);
        assert!(parsed.is_sentinel());
    }
}
