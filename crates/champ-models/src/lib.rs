//! Shared data models for the talent assessment backend.
//!
//! This crate provides Serde-serializable types for:
//! - Inference results returned to the mobile client
//! - Biomechanical analysis and performance rating tiers
//! - Leaderboard and athlete listings
//! - OTP / token authentication payloads

pub mod analysis;
pub mod athlete;
pub mod auth;
pub mod rating;
pub mod result;

// Re-export common types
pub use analysis::AnalysisResult;
pub use athlete::{demo_athletes, demo_leaderboard, Athlete, LeaderboardEntry};
pub use auth::{
    LoginRequest, OtpSentResponse, OtpVerificationRequest, PhoneNumberRequest, TokenResponse,
    TokenStatus,
};
pub use rating::PerformanceRating;
pub use result::{InferenceResult, LatestResult, VideoInfo};
