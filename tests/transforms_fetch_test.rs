//! Fetching transforms against mocked remote resources.

use alchemy::error::ErrorKind;
use alchemy::prelude::*;
use base64::Engine;
use std::collections::BTreeMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

fn ctx() -> TransformContext {
    TransformContext::new("fetch-test")
}

#[tokio::test]
async fn image_urls_are_inlined_as_base64() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/webp"))
        .mount(&mock_server)
        .await;

    let parts = vec![
        MaterialPart::text("Describe this."),
        MaterialPart::image_url(format!("{}/cat.png", mock_server.uri())),
        MaterialPart::image_base64("image/gif", "R0lG"),
    ];
    let out = image_url_to_base64().apply(parts, &ctx()).await.unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[0], MaterialPart::text("Describe this."));
    assert_eq!(
        out[1],
        MaterialPart::image_base64(
            "image/webp",
            base64::engine::general_purpose::STANDARD.encode(PNG_BYTES)
        )
    );
    assert_eq!(out[2], MaterialPart::image_base64("image/gif", "R0lG"));
}

#[tokio::test]
async fn images_without_content_type_default_to_png() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&mock_server)
        .await;

    let parts = vec![MaterialPart::image_url(format!("{}/raw", mock_server.uri()))];
    let out = image_url_to_base64().apply(parts, &ctx()).await.unwrap();

    assert_eq!(out, vec![MaterialPart::image_base64("image/png", "AQID")]);
}

#[tokio::test]
async fn image_fetch_failures_name_the_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let parts = vec![MaterialPart::image_url(format!(
        "{}/missing.png",
        mock_server.uri()
    ))];
    let err = image_url_to_base64().apply(parts, &ctx()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transform);
    let message = err.to_string();
    assert!(message.contains("404"), "{message}");
    assert!(message.contains("Not Found"), "{message}");
}

#[tokio::test]
async fn documents_become_text_parts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("remote body"))
        .mount(&mock_server)
        .await;

    let metadata = BTreeMap::from([
        ("author".to_string(), "Ada".to_string()),
        ("year".to_string(), "1843".to_string()),
    ]);
    let parts = vec![
        MaterialPart::document_url(format!("{}/notes.txt", mock_server.uri())),
        MaterialPart::document_with_metadata("Notes on the engine", metadata),
        MaterialPart::document_text("plain"),
        MaterialPart::audio_url("https://example.com/a.mp3"),
    ];
    let out = document_to_text().apply(parts, &ctx()).await.unwrap();

    assert_eq!(out[0], MaterialPart::text("remote body"));
    assert_eq!(
        out[1],
        MaterialPart::text("[author: Ada, year: 1843]\nNotes on the engine")
    );
    assert_eq!(out[2], MaterialPart::text("plain"));
    assert_eq!(out[3].part_type(), "audio");
}

#[tokio::test]
async fn document_fetch_failures_abort() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let parts = vec![MaterialPart::document_url(format!(
        "{}/private.txt",
        mock_server.uri()
    ))];
    let err = document_to_text().apply(parts, &ctx()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transform);
    assert!(err.to_string().contains("403 Forbidden"));
}

#[tokio::test]
async fn parsed_pipelines_run_in_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abcdefghijklmnop"))
        .mount(&mock_server)
        .await;

    let transforms = parse_transforms([
        "document-to-text",
        "truncate:4:...",
        "prepend:Summarize:",
        "filter:text",
    ])
    .unwrap();
    let parts = vec![
        MaterialPart::document_url(format!("{}/doc.txt", mock_server.uri())),
        MaterialPart::image_url("https://example.com/x.png"),
    ];
    let out = alchemy::transforms::run_transforms(&transforms, parts, &ctx())
        .await
        .unwrap();

    assert_eq!(
        out,
        vec![MaterialPart::text("Summarize:"), MaterialPart::text("abcd...")]
    );
}
