//! Result, leaderboard and athlete listings.

use axum::extract::State;
use axum::Json;
use champ_models::{demo_athletes, demo_leaderboard, Athlete, LatestResult, LeaderboardEntry};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub items: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct AthletesResponse {
    pub athletes: Vec<Athlete>,
}

/// Latest scored upload, or `{"score": 0.0, "cheat_detected": 0}`.
pub async fn latest_result(State(state): State<AppState>) -> Json<LatestResult> {
    Json(state.latest.snapshot().await)
}

pub async fn leaderboard() -> Json<LeaderboardResponse> {
    Json(LeaderboardResponse {
        items: demo_leaderboard(),
    })
}

pub async fn athletes() -> Json<AthletesResponse> {
    Json(AthletesResponse {
        athletes: demo_athletes(),
    })
}
