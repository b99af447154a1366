//! Axum HTTP API for the talent assessment backend.
//!
//! This crate provides:
//! - Video upload scoring backed by `champ-media`
//! - Latest result, leaderboard and athlete listings
//! - Phone OTP sign-in with HS256 access tokens
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{OtpError, OtpStore, TokenIssuer};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, LatestResultSlot};
