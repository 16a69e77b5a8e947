use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, Deserialize};
use reqwest::{Client, Response, StatusCode};
use log::{debug, error, info};

use crate::app_config::OpenSubtitlesConfig;
use crate::errors::ProviderError;
use crate::providers::{normalize_imdb_id, SubtitleSource};

/// OpenSubtitles client for the REST API v1
#[derive(Debug)]
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
    /// Subtitle language to search for
    language: String,
    /// User agent header value
    user_agent: String,
}

/// Search response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matching subtitles, best first
    #[serde(default)]
    pub data: Vec<SubtitleResult>,
}

/// Single search hit
#[derive(Debug, Deserialize)]
pub struct SubtitleResult {
    /// Subtitle metadata
    pub attributes: SubtitleAttributes,
}

/// Search hit metadata
#[derive(Debug, Deserialize)]
pub struct SubtitleAttributes {
    /// Files making up the subtitle
    #[serde(default)]
    pub files: Vec<SubtitleFile>,

    /// Popularity, as reported by the API
    #[serde(default)]
    pub download_count: u64,
}

/// A downloadable subtitle file
#[derive(Debug, Deserialize)]
pub struct SubtitleFile {
    /// Id used to request a download link
    pub file_id: u64,
}

/// Download link request
#[derive(Debug, Serialize)]
pub struct DownloadRequest {
    /// File to download
    pub file_id: u64,
}

/// Download link response
#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    /// Temporary URL of the subtitle file
    pub link: String,

    /// Downloads left in the current quota window
    pub remaining: i64,

    /// Optional message from the API
    #[serde(default)]
    pub message: Option<String>,
}

impl OpenSubtitles {
    /// Create a new OpenSubtitles client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        language: impl Into<String>,
        user_agent: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            language: language.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Create a client from configuration and a resolved API key
    pub fn from_config(config: &OpenSubtitlesConfig, api_key: impl Into<String>) -> Self {
        Self::new(
            api_key,
            config.endpoint.clone(),
            config.language.clone(),
            config.user_agent.clone(),
            config.timeout_secs,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Find the most downloaded subtitle file for a movie
    pub async fn search(&self, imdb_id: &str) -> Result<u64, ProviderError> {
        let imdb_id = normalize_imdb_id(imdb_id);
        let numeric_id = imdb_id.trim_start_matches("tt");

        debug!("Searching subtitles for {}", imdb_id);
        let response = self.client.get(self.url("subtitles"))
            .header("Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .query(&[
                ("imdb_id", numeric_id),
                ("languages", self.language.as_str()),
                ("order_by", "download_count"),
                ("order_direction", "desc"),
                ("type", "movie"),
            ])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        let search: SearchResponse = response.json().await
            .map_err(|e| ProviderError::ParseError(format!("search response: {}", e)))?;

        search.data.first()
            .and_then(|hit| hit.attributes.files.first())
            .map(|file| file.file_id)
            .ok_or_else(|| ProviderError::NotFound(format!("no {} subtitles for IMDb {}", self.language, imdb_id)))
    }

    /// Ask for a download link for a file
    pub async fn request_download(&self, file_id: u64) -> Result<DownloadResponse, ProviderError> {
        let response = self.client.post(self.url("download"))
            .header("Api-Key", &self.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .json(&DownloadRequest { file_id })
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        let download: DownloadResponse = response.json().await
            .map_err(|e| ProviderError::ParseError(format!("download response: {}", e)))?;

        debug!("Download link for file {} ({} downloads remaining)", file_id, download.remaining);
        if download.remaining <= 0 {
            let message = download.message
                .unwrap_or_else(|| "no downloads remaining".to_string());
            return Err(ProviderError::QuotaExceeded(message));
        }

        Ok(download)
    }

    /// Fetch the subtitle file behind a download link
    pub async fn download_link(&self, link: &str) -> Result<Bytes, ProviderError> {
        let response = self.client.get(link)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::check_status(response).await?;
        response.bytes().await
            .map_err(|e| ProviderError::RequestFailed(format!("reading subtitle body: {}", e)))
    }

    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_connect() || e.is_timeout() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("OpenSubtitles API error ({}): {}", status, error_text);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(error_text),
            // OpenSubtitles answers 406 once the daily download quota is spent
            StatusCode::NOT_ACCEPTABLE => ProviderError::QuotaExceeded(error_text),
            _ => ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            },
        })
    }
}

#[async_trait]
impl SubtitleSource for OpenSubtitles {
    fn name(&self) -> &str {
        "OpenSubtitles"
    }

    async fn fetch_subtitle(&self, imdb_id: &str) -> Result<Bytes, ProviderError> {
        let file_id = self.search(imdb_id).await?;
        let download = self.request_download(file_id).await?;

        info!("Downloading subtitles for {}", normalize_imdb_id(imdb_id));
        self.download_link(&download.link).await
    }
}
