use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use multifile_forms::{create_app, AppConfig, AppState, FieldRules};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "X-MULTIFILE-BOUNDARY";

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn file_part<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "files",
        filename: Some(filename),
        content_type: None,
        data,
    }
}

async fn post_upload(app: Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();

    (status, json)
}

fn default_app() -> Router {
    create_app(AppState::default())
}

fn app_with_field(rules: FieldRules) -> Router {
    let mut config = AppConfig::default();
    config.uploads.fields = vec![rules];
    create_app(AppState::new(config))
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = default_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["upload_fields"][0], "files");
}

#[tokio::test]
async fn test_accepts_valid_files() {
    let (status, json) = post_upload(
        default_app(),
        &[
            file_part("notes.txt", b"hello"),
            file_part("photo.png", b"\x89PNG...."),
            Part {
                name: "caption",
                filename: None,
                content_type: None,
                data: b"holiday",
            },
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["accepted"].as_array().unwrap().len(), 2);
    assert_eq!(json["accepted"][0]["filename"], "notes.txt");
    assert_eq!(json["accepted"][0]["content_type"], "text/plain");
    assert_eq!(json["accepted"][0]["size"], 5);
    assert_eq!(json["accepted"][1]["content_type"], "image/png");
    assert_eq!(json["total_size"], 13);
}

#[tokio::test]
async fn test_rejects_disallowed_extension() {
    let (status, json) = post_upload(default_app(), &[file_part("tool.exe", b"MZ")]).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = json["validation"]["errors"]["files"][0].as_str().unwrap();
    assert!(message.starts_with("Files does not have an approved extension/s:"), "{}", message);
    assert_eq!(
        json["validation"]["field_errors"]["files"]["error_codes"][0],
        "files_allowed"
    );
}

#[tokio::test]
async fn test_empty_file_input_is_missing() {
    let (status, json) = post_upload(
        default_app(),
        &[Part {
            name: "files",
            filename: Some(""),
            content_type: Some("application/octet-stream"),
            data: b"",
        }],
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["validation"]["errors"]["files"][0],
        "Please select from 1 to 10 files."
    );
}

#[tokio::test]
async fn test_optional_field_accepts_empty_submission() {
    let mut rules = FieldRules::named("files");
    rules.min_files = 0;
    rules.max_files = 2;

    let (status, json) = post_upload(
        app_with_field(rules),
        &[Part {
            name: "files",
            filename: Some(""),
            content_type: Some("application/octet-stream"),
            data: b"",
        }],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert!(json["accepted"].as_array().unwrap().is_empty());
    assert_eq!(json["total_size"], 0);
}

#[tokio::test]
async fn test_rejects_oversized_file() {
    let mut rules = FieldRules::named("files");
    rules.max_file_size = 4;

    let (status, json) = post_upload(app_with_field(rules), &[file_part("big.bin", b"12345")]).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["validation"]["errors"]["files"][0],
        "Independent file maximum size must be 4 bytes."
    );
}

#[tokio::test]
async fn test_rejects_aggregate_over_limit() {
    let mut rules = FieldRules::named("files");
    rules.max_total_size = 8;

    let (status, json) = post_upload(
        app_with_field(rules),
        &[file_part("a.bin", b"12345"), file_part("b.bin", b"12345")],
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["validation"]["errors"]["files"][0],
        "Total upload maximum size must be 8 bytes."
    );
}

#[tokio::test]
async fn test_large_file_spools_to_disk() {
    let mut config = AppConfig::default();
    config.uploads.spool_threshold_bytes = 16;
    config.uploads.fields = vec![FieldRules::named("files")];
    let app = create_app(AppState::new(config));

    let data = vec![b'z'; 4096];
    let (status, json) = post_upload(app, &[file_part("blob.bin", &data)]).await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["accepted"][0]["size"], 4096);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from("this is not multipart"))
        .unwrap();

    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
