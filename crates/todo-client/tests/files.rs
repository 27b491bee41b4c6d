//! File upload and download helpers, including the 401 refresh path.

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{Harness, REFRESH_PATH, envelope, token_envelope, unauthorized_body};
use serde_json::{Value, json};
use todo_client::{Error, FileUpload, RequestOptions};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPLOAD_PATH: &str = "/api/files/upload";
const DOWNLOAD_PATH: &str = "/api/files/download";

async fn mount_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope("new", "refresh-2")))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_stale(server: &MockServer, route: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(unauthorized_body()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_replays_multipart_after_refresh() {
    let h = Harness::start(Some("old"), Some("refresh-1")).await;

    mount_stale(&h.server, UPLOAD_PATH).await;
    mount_refresh(&h.server).await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(header("authorization", "Bearer new"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(envelope(json!({ "url": "/static/todos/1/photo.png" }))),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let response: Value = h
        .client
        .upload_file(
            "files/upload",
            FileUpload::new("photo.png", b"png-bytes".to_vec()),
            Some("todos/1"),
            RequestOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(response["payload"]["url"], "/static/todos/1/photo.png");

    // Both attempts carry the complete form.
    let uploads: Vec<_> = h
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == UPLOAD_PATH)
        .collect();
    assert_eq!(uploads.len(), 2);
    for upload in &uploads {
        let content_type = upload.headers["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8_lossy(&upload.body);
        assert!(body.contains(r#"name="file"; filename="photo.png""#));
        assert!(body.contains("Content-Type: image/png"));
        assert!(body.contains("png-bytes"));
        assert!(body.contains(r#"name="path""#));
        assert!(body.contains("todos/1"));
    }

    h.server.verify().await;
}

#[tokio::test]
async fn test_upload_without_target_sends_file_only() {
    let h = Harness::start(Some("tok"), Some("ref")).await;

    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(json!(null))))
        .expect(1)
        .mount(&h.server)
        .await;

    let _: Value = h
        .client
        .upload_file(
            "files/upload",
            FileUpload::new("notes", b"plain".to_vec()).with_mime_type("text/plain"),
            None,
            RequestOptions::default(),
        )
        .await
        .unwrap();

    let request = &h.server.received_requests().await.unwrap()[0];
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("Content-Type: text/plain"));
    assert!(!body.contains(r#"name="path""#));

    h.server.verify().await;
}

#[tokio::test]
async fn test_download_decodes_after_refresh() {
    let h = Harness::start(Some("old"), Some("refresh-1")).await;

    mount_stale(&h.server, DOWNLOAD_PATH).await;
    mount_refresh(&h.server).await;
    Mock::given(method("POST"))
        .and(path(DOWNLOAD_PATH))
        .and(header("authorization", "Bearer new"))
        .and(body_json(json!({ "key": "todos/1/photo.png" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!(STANDARD.encode(b"\x89PNG")))),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let file = h
        .client
        .download_file(
            "files/download",
            &json!({ "key": "todos/1/photo.png" }),
            Some("photo.png"),
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(file.bytes, b"\x89PNG");
    assert_eq!(file.mime_type, "image/png");
    assert_eq!(file.file_name.as_deref(), Some("photo.png"));
    assert_eq!(
        h.authorizations(DOWNLOAD_PATH).await,
        vec![Some("Bearer old".to_string()), Some("Bearer new".to_string())]
    );

    h.server.verify().await;
}

#[tokio::test]
async fn test_download_without_payload_is_decode_error() {
    let h = Harness::start(Some("tok"), Some("ref")).await;

    Mock::given(method("POST"))
        .and(path(DOWNLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(null))))
        .mount(&h.server)
        .await;

    let result = h
        .client
        .download_file("files/download", &json!({}), None, RequestOptions::default())
        .await;
    assert!(matches!(result, Err(Error::Decode(_))));
}

#[tokio::test]
async fn test_download_rejects_invalid_base64() {
    let h = Harness::start(Some("tok"), Some("ref")).await;

    Mock::given(method("POST"))
        .and(path(DOWNLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!("not base64!"))))
        .mount(&h.server)
        .await;

    let result = h
        .client
        .download_file("files/download", &json!({}), Some("a.pdf"), RequestOptions::default())
        .await;
    assert!(matches!(result, Err(Error::Decode(_))));
}
