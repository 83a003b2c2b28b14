mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_short_text_is_synthesized_directly() {
    let app = test_app(Options::default());

    let response = send(
        &app,
        json_request("POST", "/api/tts", json!({ "text": "Good morning." })),
    )
    .await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["audio_url"], "https://audio.test/0.mp3");
}

#[tokio::test]
async fn test_text_longer_than_one_chunk_is_rejected() {
    let app = test_app(Options::default());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/tts",
            json!({ "text": "This sentence is comfortably longer than forty characters." }),
        ),
    )
    .await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_text_is_rejected() {
    let app = test_app(Options::default());

    let response = send(&app, json_request("POST", "/api/tts", json!({ "text": " " }))).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_failure_maps_to_bad_gateway() {
    let app = test_app(Options {
        tts_fails: true,
        ..Options::default()
    });

    let response = send(&app, json_request("POST", "/api/tts", json!({ "text": "Hi." }))).await;
    assert_status(&response, StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("voice unavailable"));
}

#[tokio::test]
async fn test_voices_are_listed() {
    let app = test_app(Options::default());

    let response = send(&app, empty_request("GET", "/api/voices")).await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["voiceId"], "en-UK-hazel");
    assert_eq!(json[0]["displayName"], "Hazel");
}

#[tokio::test]
async fn test_static_directory_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fallback.mp3"), b"ID3-fallback").unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>murmur</html>").unwrap();

    let app = test_app(Options {
        static_dir: Some(dir.path().to_path_buf()),
        ..Options::default()
    });

    let response = send(&app, empty_request("GET", "/static/fallback.mp3")).await;
    assert_status(&response, StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ID3-fallback");

    let response = send(&app, empty_request("GET", "/")).await;
    assert_status(&response, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_static_directory_is_skipped() {
    let app = test_app(Options::default());

    let response = send(&app, empty_request("GET", "/static/fallback.mp3")).await;
    assert_status(&response, StatusCode::NOT_FOUND);
}
