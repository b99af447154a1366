//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use champ_api::{create_router, ApiConfig, AppState};
use champ_media::{
    ChannelOrder, ConstantSampler, Frame, FrameSource, InferencePipeline, MediaResult,
    VideoDecoder,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "champ-test-boundary";

struct StillDecoder;

struct StillSource {
    remaining: usize,
}

impl FrameSource for StillSource {
    fn fps(&self) -> f64 {
        30.0
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(Frame::new(1, 1, ChannelOrder::Bgr, vec![0, 0, 0])))
    }
}

impl VideoDecoder for StillDecoder {
    fn open(&self, _path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(StillSource { remaining: 60 }))
    }

    fn name(&self) -> &'static str {
        "still"
    }
}

fn stub_app() -> Router {
    app_with(ApiConfig::default(), InferencePipeline::builder().without_decoder().build())
}

fn app_with(config: ApiConfig, pipeline: InferencePipeline) -> Router {
    create_router(AppState::new(config, Arc::new(pipeline)), None)
}

fn decoding_pipeline() -> InferencePipeline {
    InferencePipeline::builder()
        .decoder(Arc::new(StillDecoder))
        .technique_sampler(Arc::new(ConstantSampler(50.0)))
        .build()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(field: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"clip.mp4\"\r\n\
             Content-Type: video/mp4\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload_video/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let response = stub_app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"message": "Welcome to Sports Talent Assessment API"})
    );

    let response = stub_app().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_stub_pipeline_as_degraded() {
    let response = stub_app().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["pipeline"]["decoder"], Value::Null);
    assert_eq!(body["pipeline"]["target_len"], 120);
}

#[tokio::test]
async fn test_latest_result_starts_as_placeholder() {
    let response = stub_app().oneshot(get("/results/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"score": 0.0, "cheat_detected": 0})
    );
}

#[tokio::test]
async fn test_upload_without_decoder_returns_stub_and_becomes_latest() {
    let app = stub_app();

    let response = app
        .clone()
        .oneshot(multipart_upload("file", b"not really a video"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["score"], 0.0);
    assert_eq!(body["cheat_detected"], 0);
    assert_eq!(body["analysis"]["overall_rating"], "No Analysis Available");
    assert_eq!(
        body["analysis"]["recommendations"],
        json!(["Camera not available for analysis"])
    );
    assert_eq!(
        body["video_info"],
        json!({"frame_count": 0, "duration": 0.0, "fps": 0.0})
    );

    let latest = body_json(app.oneshot(get("/results/latest")).await.unwrap()).await;
    assert_eq!(latest, body);
}

#[tokio::test]
async fn test_upload_scores_decoded_video() {
    let app = app_with(ApiConfig::default(), decoding_pipeline());

    let response = app
        .oneshot(multipart_upload("file", b"\x00\x00\x00\x18ftypmp42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!((body["score"].as_f64().unwrap() - 50.0).abs() < 1e-6);
    assert_eq!(body["cheat_detected"], 0);
    assert_eq!(body["video_info"]["frame_count"], 60);
    assert_eq!(body["video_info"]["duration"], 2.0);
    assert_eq!(body["analysis"]["overall_rating"], "Needs Improvement");
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let response = stub_app()
        .oneshot(multipart_upload("video", b"bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Missing 'file' field");
}

#[tokio::test]
async fn test_static_listings() {
    let body = body_json(stub_app().oneshot(get("/results/leaderboard")).await.unwrap()).await;
    let items = body["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert_eq!(items[0]["rank"], 1);
    assert!(items[0]["color"].as_str().unwrap().starts_with('#'));

    let body = body_json(stub_app().oneshot(get("/results/athletes")).await.unwrap()).await;
    assert!(body["athletes"][0]["sport"].is_string());
}

#[tokio::test]
async fn test_invalid_phone_number_is_rejected() {
    let response = stub_app()
        .oneshot(post_json("/send-otp", json!({"phone_number": "12345"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Invalid phone number. Please enter a 10-digit number."
    );
}

#[tokio::test]
async fn test_otp_sign_in_flow() {
    let app = stub_app();

    let response = app
        .clone()
        .oneshot(post_json("/send-otp", json!({"phone_number": "9876543210"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sent = body_json(response).await;
    assert_eq!(sent["message"], "OTP sent to +919876543210");
    assert_eq!(sent["phone_number"], "9876543210");
    let otp = sent["otp"].as_str().unwrap().to_string();
    assert_eq!(otp.len(), 6);

    let response = app
        .clone()
        .oneshot(post_json(
            "/verify-otp",
            json!({"phone_number": "9876543210", "otp": otp}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await;
    assert_eq!(token["message"], "OTP verified successfully");
    assert_eq!(token["token_type"], "bearer");
    assert_eq!(token["expires_in"], 1800);
    assert!(token.get("success").is_none());

    let access_token = token["access_token"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get(&format!("/verify-token?token={access_token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"valid": true, "phone_number": "9876543210"})
    );

    // The code is single use.
    let response = app
        .oneshot(post_json(
            "/verify-otp",
            json!({"phone_number": "9876543210", "otp": otp}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "OTP not found. Please request a new OTP."
    );
}

#[tokio::test]
async fn test_wrong_otp_counts_down() {
    let app = stub_app();
    let sent = body_json(
        app.clone()
            .oneshot(post_json("/resend-otp", json!({"phone_number": "9123456780"})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(sent["message"], "OTP resent to +919123456780");
    let wrong = if sent["otp"] == "000000" { "111111" } else { "000000" };

    let response = app
        .oneshot(post_json(
            "/verify-otp",
            json!({"phone_number": "9123456780", "otp": wrong}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Invalid OTP. 2 attempts remaining."
    );
}

#[tokio::test]
async fn test_demo_login() {
    let response = stub_app()
        .oneshot(post_json(
            "/login",
            json!({"email": "demo@gochamp.com", "password": "demo123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");

    let response = stub_app()
        .oneshot(post_json(
            "/login",
            json!({"email": "demo@gochamp.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "Invalid email or password");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let response = stub_app()
        .oneshot(get("/verify-token?token=abc.def.ghi"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "Invalid token");
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        trust_proxy_headers: true,
        ..ApiConfig::default()
    };
    let app = app_with(config, InferencePipeline::builder().without_decoder().build());

    let from = |ip: &str| {
        Request::builder()
            .uri("/results/athletes")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(from("203.0.113.9")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(from("203.0.113.9")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "1");

    let other = app.oneshot(from("203.0.113.10")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_spoofed_forwarded_for_shares_the_peer_bucket() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..ApiConfig::default()
    };
    let app = app_with(config, InferencePipeline::builder().without_decoder().build());
    let peer: SocketAddr = "192.0.2.10:50000".parse().unwrap();

    let spoofed = |ip: &str| {
        Request::builder()
            .uri("/results/athletes")
            .header("x-forwarded-for", ip)
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(spoofed("203.0.113.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(spoofed("203.0.113.2")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_probes_are_not_rate_limited() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        trust_proxy_headers: true,
        ..ApiConfig::default()
    };
    let app = app_with(config, InferencePipeline::builder().without_decoder().build());

    for _ in 0..3 {
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
