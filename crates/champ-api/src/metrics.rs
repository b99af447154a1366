//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder. Returns a handle that renders
/// the scrape body, which also includes the pipeline's `champ_*` metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "champ_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "champ_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "champ_http_requests_in_flight";

    // Uploads
    pub const UPLOADS_TOTAL: &str = "champ_uploads_total";
    pub const UPLOAD_BYTES: &str = "champ_upload_bytes";

    // Auth
    pub const OTP_ISSUED_TOTAL: &str = "champ_otp_issued_total";
    pub const OTP_VERIFICATIONS_TOTAL: &str = "champ_otp_verifications_total";
    pub const LOGINS_TOTAL: &str = "champ_logins_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "champ_rate_limit_hits_total";
}

/// Routes served by this API. Anything else is labelled `unmatched` so a
/// scanner cannot blow up label cardinality.
const KNOWN_ROUTES: &[&str] = &[
    "/",
    "/upload_video/",
    "/results/latest",
    "/results/leaderboard",
    "/results/athletes",
    "/send-otp",
    "/resend-otp",
    "/verify-otp",
    "/verify-token",
    "/login",
    "/health",
    "/healthz",
    "/ready",
    "/metrics",
];

fn route_label(path: &str) -> &'static str {
    KNOWN_ROUTES
        .iter()
        .copied()
        .find(|route| *route == path)
        .unwrap_or("unmatched")
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted upload and its size.
pub fn record_upload(bytes: usize) {
    counter!(names::UPLOADS_TOTAL).increment(1);
    histogram!(names::UPLOAD_BYTES).record(bytes as f64);
}

/// Record an OTP being sent. `kind` is `send` or `resend`.
pub fn record_otp_issued(kind: &'static str) {
    counter!(names::OTP_ISSUED_TOTAL, "kind" => kind).increment(1);
}

/// Record an OTP check. `outcome` is `verified`, `not_found`, `expired`,
/// `locked` or `mismatch`.
pub fn record_otp_verification(outcome: &'static str) {
    counter!(names::OTP_VERIFICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "rejected" };
    counter!(names::LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("endpoint", route_label(path).to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/upload_video/"), "/upload_video/");
        assert_eq!(route_label("/results/latest"), "/results/latest");
        assert_eq!(route_label("/wp-admin/setup.php"), "unmatched");
        assert_eq!(route_label("/results/latest/extra"), "unmatched");
    }
}
