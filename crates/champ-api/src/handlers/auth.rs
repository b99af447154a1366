//! OTP sign-in, demo login and token checks.

use axum::extract::{Query, State};
use axum::Json;
use champ_models::{
    LoginRequest, OtpSentResponse, OtpVerificationRequest, PhoneNumberRequest, TokenResponse,
    TokenStatus,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::OtpError;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Dialling prefix shown in OTP messages.
const COUNTRY_CODE: &str = "+91";

const DEMO_EMAIL: &str = "demo@gochamp.com";
const DEMO_PASSWORD: &str = "demo123";

async fn issue_otp(
    state: &AppState,
    request: PhoneNumberRequest,
    verb: &str,
    kind: &'static str,
) -> ApiResult<Json<OtpSentResponse>> {
    request.validate().map_err(ApiError::BadRequest)?;

    let otp = state.otp.issue(&request.phone_number).await;
    metrics::record_otp_issued(kind);
    info!(phone_number = %request.phone_number, kind, "OTP issued");

    Ok(Json(OtpSentResponse {
        message: format!("OTP {verb} to {COUNTRY_CODE}{}", request.phone_number),
        phone_number: request.phone_number,
        otp,
    }))
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<PhoneNumberRequest>,
) -> ApiResult<Json<OtpSentResponse>> {
    issue_otp(&state, request, "sent", "send").await
}

/// Same as [`send_otp`]; any pending code is replaced.
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(request): Json<PhoneNumberRequest>,
) -> ApiResult<Json<OtpSentResponse>> {
    issue_otp(&state, request, "resent", "resend").await
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<OtpVerificationRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if let Err(e) = state.otp.verify(&request.phone_number, &request.otp).await {
        let outcome = match e {
            OtpError::NotFound => "not_found",
            OtpError::Expired => "expired",
            OtpError::TooManyAttempts => "locked",
            OtpError::Mismatch { .. } => "mismatch",
        };
        metrics::record_otp_verification(outcome);
        warn!(phone_number = %request.phone_number, outcome, "OTP rejected");
        return Err(e.into());
    }
    metrics::record_otp_verification("verified");

    let access_token = state.tokens.issue(&request.phone_number)?;
    Ok(Json(TokenResponse {
        success: None,
        message: "OTP verified successfully".to_string(),
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.expires_in(),
    }))
}

/// Demo email/password login.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if request.email != DEMO_EMAIL || request.password != DEMO_PASSWORD {
        metrics::record_login(false);
        return Err(ApiError::unauthorized("Invalid email or password"));
    }
    metrics::record_login(true);

    let access_token = state.tokens.issue(&request.email)?;
    Ok(Json(TokenResponse {
        success: Some(true),
        message: "Login successful".to_string(),
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.expires_in(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

pub async fn verify_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<TokenStatus>> {
    let claims = state.tokens.verify(&query.token)?;
    Ok(Json(TokenStatus {
        valid: true,
        phone_number: claims.sub,
    }))
}
