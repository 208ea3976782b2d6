//! End-to-end `POST /run` tests against fake transcoder and host.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{FakeTranscoder, TestApp, body_json};
use shorts_publisher::infrastructure::youtube::host::PrivacyStatus;

fn json_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn media_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4-bytes".to_vec()))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_missing_video_is_rejected() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(json_request(json!({"username": "alice"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "kind": "client_input",
            "error": "No valid video input provided"
        })
    );
    assert!(app.transcoder.calls.lock().unwrap().is_empty());
    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_url_video_with_watermark_and_subtitle() {
    let server = media_server().await;
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(json_request(json!({
            "video_url": format!("{}/clip.mp4", server.uri()),
            "username": "alice",
            "subtitle_text": "Hello",
            "title": "My clip",
            "tags": "funny, cats"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "message": "YouTube Short processed and uploaded successfully",
            "video_id": "vid123",
            "video_url": "https://www.youtube.com/watch?v=vid123"
        })
    );

    let outputs: Vec<String> = app
        .transcoder
        .outputs()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(outputs, vec!["watermark_video.mp4", "subtitle_video.mp4"]);

    let calls = app.transcoder.calls.lock().unwrap();
    assert!(calls[0].iter().any(|a| a.contains("Sumber: @alice")));
    assert!(calls[1].iter().any(|a| a.contains("text='Hello'")));

    let uploads = app.host.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (metadata, bytes) = &uploads[0];
    assert_eq!(metadata.title, "My clip");
    assert_eq!(metadata.tags, vec!["funny", "cats"]);
    assert_eq!(metadata.category_id, "22");
    assert!(!metadata.made_for_kids);
    assert_eq!(bytes.as_slice(), b"fake-mp4-bytes");

    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_no_transforms_uploads_the_input() {
    let server = media_server().await;
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(json_request(json!({
            "video_url": format!("{}/clip.mp4", server.uri())
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.transcoder.calls.lock().unwrap().is_empty());

    let uploads = app.host.uploads.lock().unwrap();
    assert_eq!(uploads[0].0.title, "YouTube Short");
    assert_eq!(uploads[0].0.privacy_status, PrivacyStatus::Public);
    assert_eq!(uploads[0].1.as_slice(), b"fake-mp4-bytes");
}

#[tokio::test]
async fn test_raw_video_body_takes_metadata_from_query() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/run?title=Raw%20upload&privacy_status=unlisted&shorts_format=true")
        .header("content-type", "video/mp4")
        .body(Body::from(&b"raw-video"[..]))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let outputs = app.transcoder.outputs();
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].ends_with("shorts_video.mp4"));

    let uploads = app.host.uploads.lock().unwrap();
    assert_eq!(uploads[0].0.title, "Raw upload");
    assert_eq!(uploads[0].0.privacy_status, PrivacyStatus::Unlisted);
    assert_eq!(uploads[0].1.as_slice(), b"raw-video");
}

#[tokio::test]
async fn test_raw_audio_alone_is_rejected() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "audio/mpeg")
        .body(Body::from(&b"raw-audio"[..]))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_multipart_upload_with_audio_ducks_first() {
    let app = TestApp::new();
    let boundary = "X-SHORTS-BOUNDARY";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"video_file\"; filename=\"clip.MP4\"\r\n\
         Content-Type: video/mp4\r\n\r\n\
         multipart-video\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"audio_file\"; filename=\"music.mp3\"\r\n\
         Content-Type: audio/mpeg\r\n\r\n\
         multipart-audio\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\r\n\
         From the form\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"playlist_id\"\r\n\r\n\
         PL9\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let calls = app.transcoder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].iter().any(|a| a.ends_with("input_audio.mp3")));
    assert!(calls[0].iter().any(|a| a.contains("amix=inputs=2")));

    let uploads = app.host.uploads.lock().unwrap();
    assert_eq!(uploads[0].0.title, "From the form");
    assert_eq!(uploads[0].1.as_slice(), b"multipart-video");
    assert_eq!(
        app.host.playlist_items.lock().unwrap().as_slice(),
        &[("PL9".to_string(), "vid123".to_string())]
    );
}

#[tokio::test]
async fn test_disallowed_extension_is_ignored() {
    let app = TestApp::new();
    let boundary = "X-SHORTS-BOUNDARY";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"video_file\"; filename=\"clip.exe\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         not-a-video\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No valid video input provided");
    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_download_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(json_request(json!({
            "video_url": format!("{}/gone.mp4", server.uri())
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "download");
    assert!(app.host.uploads.lock().unwrap().is_empty());
    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_transcode_failure_names_the_stage() {
    let server = media_server().await;
    let app = TestApp::with_transcoder(FakeTranscoder {
        fail_on: Some("Sumber"),
        ..FakeTranscoder::default()
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request(json!({
            "video_url": format!("{}/clip.mp4", server.uri()),
            "username": "alice",
            "subtitle_text": "never rendered"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "transcode");
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to add watermark:")
    );
    assert_eq!(app.transcoder.calls.lock().unwrap().len(), 1);
    assert!(app.host.uploads.lock().unwrap().is_empty());
    assert_eq!(app.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_empty_video_fails_validation() {
    let app = TestApp::new();

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "video/mp4")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid video file"));
}

#[tokio::test]
async fn test_form_encoded_request() {
    let server = media_server().await;
    let app = TestApp::new();

    let body = format!(
        "video_url={}%2Fclip.mp4&subtitle_text=Halo&privacy_status=private",
        server.uri().replace(':', "%3A").replace('/', "%2F")
    );
    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.transcoder.calls.lock().unwrap().len(), 1);
    assert_eq!(
        app.host.uploads.lock().unwrap()[0].0.privacy_status,
        PrivacyStatus::Private
    );
}
