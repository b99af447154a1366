//! Phone OTP sign-in and HS256 access tokens.
//!
//! OTPs live in process memory only; a restart invalidates every pending
//! code. Each phone number has at most one live code, replaced on resend.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Digits in a generated OTP.
pub const OTP_LENGTH: usize = 6;

/// Upper bound on pending codes before expired ones are swept.
const MAX_PENDING_OTPS: usize = 10_000;

/// Why an OTP was rejected. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("OTP not found. Please request a new OTP.")]
    NotFound,

    #[error("OTP has expired. Please request a new OTP.")]
    Expired,

    #[error("Too many failed attempts. Please request a new OTP.")]
    TooManyAttempts,

    #[error("Invalid OTP. {remaining} attempts remaining.")]
    Mismatch { remaining: u32 },
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: Instant,
    attempts: u32,
}

/// In-memory OTP store keyed by phone number.
pub struct OtpStore {
    entries: Mutex<HashMap<String, OtpEntry>>,
    ttl: Duration,
    max_attempts: u32,
    max_pending: usize,
}

impl OtpStore {
    pub fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_attempts,
            max_pending: MAX_PENDING_OTPS,
        }
    }

    /// Override the pending-code bound. Zero is treated as one.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    /// Generate a fresh code for `phone_number`, replacing any pending one.
    pub async fn issue(&self, phone_number: &str) -> String {
        let code = generate_otp();
        let entry = OtpEntry {
            code: code.clone(),
            expires_at: Instant::now() + self.ttl,
            attempts: 0,
        };
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(phone_number) && entries.len() >= self.max_pending {
            self.sweep(&mut entries);
        }
        entries.insert(phone_number.to_string(), entry);
        debug!(phone_number, "OTP issued");
        code
    }

    /// Drop expired codes; if still full, drop the codes closest to expiry.
    fn sweep(&self, entries: &mut HashMap<String, OtpEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at >= now);

        if entries.len() >= self.max_pending {
            let mut oldest: Vec<_> = entries
                .iter()
                .map(|(phone, entry)| (phone.clone(), entry.expires_at))
                .collect();
            oldest.sort_by_key(|(_, expires_at)| *expires_at);

            let to_remove = entries.len() + 1 - self.max_pending;
            for (phone, _) in oldest.into_iter().take(to_remove) {
                entries.remove(&phone);
            }
            warn!(removed = to_remove, "OTP store at capacity, evicted oldest codes");
        }
    }

    /// Check a code. Success, expiry and lockout all consume the entry;
    /// a wrong guess only counts an attempt.
    pub async fn verify(&self, phone_number: &str, code: &str) -> Result<(), OtpError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(phone_number).ok_or(OtpError::NotFound)?;

        if Instant::now() > entry.expires_at {
            entries.remove(phone_number);
            return Err(OtpError::Expired);
        }

        if entry.attempts >= self.max_attempts {
            entries.remove(phone_number);
            return Err(OtpError::TooManyAttempts);
        }

        if entry.code != code {
            entry.attempts += 1;
            return Err(OtpError::Mismatch {
                remaining: self.max_attempts.saturating_sub(entry.attempts),
            });
        }

        entries.remove(phone_number);
        Ok(())
    }

    pub async fn pending(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn generate_otp() -> String {
    let max = 10u32.pow(OTP_LENGTH as u32);
    format!("{:0width$}", rand::rng().random_range(0..max), width = OTP_LENGTH)
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Phone number or email of the signed-in user
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Token lifetime in seconds, as reported to clients.
    pub fn expires_in(&self) -> u64 {
        self.ttl.as_secs()
    }

    pub fn issue(&self, subject: &str) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                ApiError::unauthorized("Invalid token")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> OtpStore {
        OtpStore::new(Duration::from_secs(300), 3)
    }

    #[test]
    fn test_generated_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_correct_code_is_single_use() {
        let store = store();
        let code = store.issue("9876543210").await;
        assert_eq!(store.verify("9876543210", &code).await, Ok(()));
        assert_eq!(
            store.verify("9876543210", &code).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_wrong_guesses_count_down_then_lock_out() {
        let store = store();
        let code = store.issue("9876543210").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for remaining in [2, 1, 0] {
            assert_eq!(
                store.verify("9876543210", wrong).await,
                Err(OtpError::Mismatch { remaining })
            );
        }
        // Even the right code is refused once attempts are used up.
        assert_eq!(
            store.verify("9876543210", &code).await,
            Err(OtpError::TooManyAttempts)
        );
        assert_eq!(store.pending().await, 0);
    }

    #[tokio::test]
    async fn test_expired_code_is_removed() {
        let store = OtpStore::new(Duration::ZERO, 3);
        let code = store.issue("9876543210").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(
            store.verify("9876543210", &code).await,
            Err(OtpError::Expired)
        );
        assert_eq!(store.pending().await, 0);
    }

    #[tokio::test]
    async fn test_resend_replaces_code_and_resets_attempts() {
        let store = store();
        let first = store.issue("9876543210").await;
        let wrong = if first == "000000" { "111111" } else { "000000" };
        let _ = store.verify("9876543210", wrong).await;

        let second = store.issue("9876543210").await;
        assert_eq!(store.pending().await, 1);
        assert_eq!(store.verify("9876543210", &second).await, Ok(()));
    }

    #[tokio::test]
    async fn test_abandoned_codes_are_swept_when_full() {
        let store = OtpStore::new(Duration::ZERO, 3).with_max_pending(2);
        store.issue("9000000001").await;
        store.issue("9000000002").await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        store.issue("9000000003").await;
        assert_eq!(store.pending().await, 1);
    }

    #[tokio::test]
    async fn test_full_store_evicts_oldest_live_code() {
        let store = store().with_max_pending(2);
        let first = store.issue("9000000001").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.issue("9000000002").await;
        let third = store.issue("9000000003").await;

        assert_eq!(store.pending().await, 2);
        assert_eq!(
            store.verify("9000000001", &first).await,
            Err(OtpError::NotFound)
        );
        assert_eq!(store.verify("9000000003", &third).await, Ok(()));
    }

    #[tokio::test]
    async fn test_resend_at_capacity_does_not_evict() {
        let store = store().with_max_pending(1);
        store.issue("9000000001").await;
        let code = store.issue("9000000001").await;
        assert_eq!(store.pending().await, 1);
        assert_eq!(store.verify("9000000001", &code).await, Ok(()));
    }

    #[test]
    fn test_token_round_trip() {
        let issuer = TokenIssuer::new("secret", Duration::from_secs(1800));
        let token = issuer.issue("9876543210").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "9876543210");
        assert_eq!(claims.exp - claims.iat, 1800);
        assert_eq!(issuer.expires_in(), 1800);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let ours = TokenIssuer::new("secret", Duration::from_secs(1800));
        let theirs = TokenIssuer::new("other", Duration::from_secs(1800));
        let token = theirs.issue("9876543210").unwrap();
        assert!(matches!(ours.verify(&token), Err(ApiError::Unauthorized(_))));
        assert!(ours.verify("not-a-jwt").is_err());
    }
}
