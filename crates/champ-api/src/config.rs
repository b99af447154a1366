//! API configuration.

use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is unset. Rejected in production.
pub const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Key clients by `X-Forwarded-For`/`X-Real-IP`. Only safe behind a
    /// proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// OTP lifetime
    pub otp_ttl: Duration,
    /// Wrong guesses allowed per OTP
    pub otp_max_attempts: u32,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            trust_proxy_headers: false,
            max_body_size: 100 * 1024 * 1024, // 100MB
            environment: "development".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(30 * 60),
            otp_ttl: Duration::from_secs(5 * 60),
            otp_max_attempts: 3,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.trust_proxy_headers),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.jwt_secret),
            access_token_ttl: env_parse("ACCESS_TOKEN_TTL_MINUTES")
                .map(|m: u64| Duration::from_secs(m * 60))
                .unwrap_or(defaults.access_token_ttl),
            otp_ttl: env_parse("OTP_TTL_MINUTES")
                .map(|m: u64| Duration::from_secs(m * 60))
                .unwrap_or(defaults.otp_ttl),
            otp_max_attempts: env_parse("OTP_MAX_ATTEMPTS").unwrap_or(defaults.otp_max_attempts),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Refuse to start production with the built-in signing secret.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT_SECRET must be set in production".to_string());
        }
        if self.otp_max_attempts == 0 {
            return Err("OTP_MAX_ATTEMPTS must be at least 1".to_string());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}
