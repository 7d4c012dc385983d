//! Live status lookups against a local room info endpoint

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cogbot::{LiveChecker, LiveStatusSource, TikTokStatusApi};

mod common;

async fn room(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("uniqueId").map(String::as_str) {
        Some("streamer") => Json(serde_json::json!({
            "data": {"liveRoom": {"status": 2}, "user": {"roomId": "1"}}
        }))
        .into_response(),
        Some("sleeper") => Json(serde_json::json!({
            "data": {"liveRoom": {"status": 4}, "user": {"roomId": "2"}}
        }))
        .into_response(),
        Some("ghost") => Json(serde_json::json!({"statusCode": 19881007})).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn api() -> TikTokStatusApi {
    let base = common::serve(Router::new().route("/room", get(room))).await;
    TikTokStatusApi::new(reqwest::Client::new(), format!("{base}/room"))
}

#[tokio::test]
async fn live_account_detected() {
    assert!(api().await.is_live("streamer").await.unwrap());
}

#[tokio::test]
async fn leading_at_is_ignored() {
    assert!(api().await.is_live("@streamer").await.unwrap());
}

#[tokio::test]
async fn offline_account_detected() {
    assert!(!api().await.is_live("sleeper").await.unwrap());
}

#[tokio::test]
async fn missing_room_data_is_an_error() {
    assert!(api().await.is_live("ghost").await.is_err());
}

#[tokio::test]
async fn server_error_is_an_error() {
    assert!(api().await.is_live("anyone").await.is_err());
}

#[tokio::test]
async fn checker_reports_failures_as_offline() {
    let checker = LiveChecker::new(Arc::new(api().await));

    assert!(checker.is_account_online("streamer").await);
    assert!(!checker.is_account_online("anyone").await);
    assert_eq!(checker.last_status("streamer").await, Some(true));
    assert_eq!(checker.last_status("anyone").await, None);
}

#[tokio::test]
async fn slow_endpoint_times_out_as_offline() {
    let router = Router::new().route(
        "/room",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        }),
    );
    let base = common::serve(router).await;
    let api =
        TikTokStatusApi::with_timeout(format!("{base}/room"), Duration::from_millis(100)).unwrap();

    let started = Instant::now();
    assert!(matches!(api.is_live("streamer").await, Err(cogbot::Error::Http(_))));
    assert!(!LiveChecker::new(Arc::new(api)).is_account_online("streamer").await);
    assert!(started.elapsed() < Duration::from_secs(4));
}
