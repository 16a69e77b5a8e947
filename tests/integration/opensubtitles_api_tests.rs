/*!
 * Integration tests for the OpenSubtitles client against a local mock server
 */

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wheresthejump::errors::ProviderError;
use wheresthejump::providers::opensubtitles::OpenSubtitles;
use wheresthejump::providers::SubtitleSource;
use crate::common;

fn client_for(server: &MockServer) -> OpenSubtitles {
    OpenSubtitles::new("test-key", server.uri(), "en", "wheresthejump-tests/1.0", 5)
}

async fn mount_search(server: &MockServer, file_id: u64) {
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .and(query_param("imdb_id", "0078748"))
        .and(query_param("languages", "en"))
        .and(header("Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "data": [
                { "attributes": { "download_count": 120000, "files": [ { "file_id": file_id } ] } }
            ]
        })))
        .mount(server)
        .await;
}

/// Search, download link and file download chain into the subtitle bytes
#[tokio::test]
async fn test_fetch_subtitle_withAvailableSubtitle_shouldReturnContent() {
    let server = MockServer::start().await;
    mount_search(&server, 4242).await;

    Mock::given(method("POST"))
        .and(path("/download"))
        .and(body_json(json!({ "file_id": 4242 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "link": format!("{}/files/alien.srt", server.uri()),
            "remaining": 19,
            "message": "Your quota will be renewed in 23 hours"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/alien.srt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::downloaded_track_srt()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let content = client.fetch_subtitle("https://www.imdb.com/title/tt0078748/").await.unwrap();

    assert_eq!(client.name(), "OpenSubtitles");
    assert_eq!(String::from_utf8_lossy(&content), common::downloaded_track_srt());
}

/// An empty search result means no subtitle exists
#[tokio::test]
async fn test_search_withNoResults_shouldReturnNotFound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 0, "data": [] })))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_subtitle("tt0078748").await;

    assert!(matches!(result, Err(ProviderError::NotFound(_))));
}

/// Zero remaining downloads stops before the file is fetched
#[tokio::test]
async fn test_request_download_withNoRemainingQuota_shouldReturnQuotaExceeded() {
    let server = MockServer::start().await;
    mount_search(&server, 7).await;

    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "link": format!("{}/files/never.srt", server.uri()),
            "remaining": 0,
            "message": "You have downloaded your allowed 20 subtitles for 24h"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/never.srt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_subtitle("tt0078748").await;

    match result {
        Err(ProviderError::QuotaExceeded(message)) => assert!(message.contains("allowed 20 subtitles")),
        other => panic!("expected QuotaExceeded, got {:?}", other),
    }
}

/// A 406 on the download endpoint is also a spent quota
#[tokio::test]
async fn test_request_download_withNotAcceptable_shouldReturnQuotaExceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(406).set_body_string("download limit reached"))
        .mount(&server)
        .await;

    let result = client_for(&server).request_download(1).await;

    assert!(matches!(result, Err(ProviderError::QuotaExceeded(_))));
}

/// A rejected key is an authentication error, which is fatal for a batch
#[tokio::test]
async fn test_search_withUnauthorized_shouldReturnAuthenticationError() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let error = client_for(&server).search("tt0078748").await.unwrap_err();

    assert!(matches!(error, ProviderError::AuthenticationError(_)));
    assert!(error.is_fatal());
}

/// Other failures carry the status code
#[tokio::test]
async fn test_search_withServerError_shouldReturnApiError() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let error = client_for(&server).search("tt0078748").await.unwrap_err();

    match error {
        ProviderError::ApiError { status_code, message } => {
            assert_eq!(status_code, 500);
            assert_eq!(message, "boom");
        },
        other => panic!("expected ApiError, got {:?}", other),
    }
}

/// Garbage bodies are parse errors, not panics
#[tokio::test]
async fn test_search_withMalformedBody_shouldReturnParseError() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subtitles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).search("tt0078748").await;

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}
