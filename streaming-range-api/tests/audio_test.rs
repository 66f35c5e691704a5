mod common;

use axum::http::{header, StatusCode};
use common::{body_bytes, body_json, FakeChannelMonitor, FakeDatabase, TestApp};

fn app() -> TestApp {
    TestApp::spawn(FakeDatabase::healthy(), FakeChannelMonitor::default())
}

#[tokio::test]
async fn serves_mp3_with_audio_headers() {
    let app = app();
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    app.write_audio("daily-roundup.mp3", &payload);

    let response = app.get("/api/audio/daily-roundup.mp3").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(headers[header::CONTENT_LENGTH], "4096");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"daily-roundup.mp3\""
    );
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400");

    let body = body_bytes(response).await;
    let on_disk = std::fs::metadata(app.audio_dir.path().join("daily-roundup.mp3"))
        .unwrap()
        .len();
    assert_eq!(body.len() as u64, on_disk);
    assert_eq!(body, payload);
}

#[tokio::test]
async fn encoded_traversal_is_invalid_filename() {
    let app = app();

    for uri in [
        "/api/audio/..%2Fsecret.mp3",
        "/api/audio/%2E%2E%2Fsecret.mp3",
        "/api/audio/nested%2Ftrack.mp3",
        "/api/audio/..",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid filename", "{uri}");
    }
}

#[tokio::test]
async fn undecodable_filename_is_invalid_json_error() {
    let app = app();

    let response = app.get("/api/audio/%FF.mp3").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid filename");
}

#[tokio::test]
async fn non_mp3_is_unsupported_even_when_present() {
    let app = app();
    app.write_audio("notes.txt", b"plain text");

    let response = app.get("/api/audio/notes.txt").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Only MP3 files are supported");
}

#[tokio::test]
async fn absent_file_is_not_found() {
    let app = app();

    let response = app.get("/api/audio/missing.mp3").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Audio file not found");
}

#[tokio::test]
async fn audio_does_not_depend_on_database() {
    let app = TestApp::spawn(FakeDatabase::down(), FakeChannelMonitor::default());
    app.write_audio("intro.mp3", b"ID3");

    let response = app.get("/api/audio/intro.mp3").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.db.calls(), 0);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = app();

    let response = app.get("/api/audio/missing.mp3").await;

    assert!(response.headers().contains_key("x-request-id"));
}
