//! Authentication request/response payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of digits in a national phone number.
pub const PHONE_NUMBER_DIGITS: usize = 10;

fn validate_phone_number(phone_number: &str) -> Result<(), String> {
    let valid = phone_number.len() == PHONE_NUMBER_DIGITS
        && phone_number.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err("Invalid phone number. Please enter a 10-digit number.".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhoneNumberRequest {
    pub phone_number: String,
}

impl PhoneNumberRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_phone_number(&self.phone_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OtpVerificationRequest {
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response to send/resend OTP. The code is echoed back for demo clients.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OtpSentResponse {
    pub message: String,
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TokenStatus {
    pub valid: bool,
    pub phone_number: String,
}
