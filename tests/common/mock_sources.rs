/*!
 * Mock subtitle source for testing batch behavior without the network.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use wheresthejump::errors::ProviderError;
use wheresthejump::providers::{normalize_imdb_id, SubtitleSource};

/// Canned reply for one IMDb id
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this SRT content
    Subtitle(String),
    /// No subtitles exist
    NotFound,
    /// Download quota is used up
    QuotaExceeded,
    /// Server error
    ServerError,
}

/// Mock source answering from a fixed table; unknown ids are `NotFound`
#[derive(Debug, Default)]
pub struct MockSubtitleSource {
    replies: HashMap<String, MockReply>,
    calls: AtomicUsize,
}

impl MockSubtitleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reply for an IMDb id
    pub fn with_reply(mut self, imdb_id: &str, reply: MockReply) -> Self {
        self.replies.insert(normalize_imdb_id(imdb_id), reply);
        self
    }

    /// Number of fetches made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubtitleSource for MockSubtitleSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_subtitle(&self, imdb_id: &str) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.replies.get(&normalize_imdb_id(imdb_id)) {
            Some(MockReply::Subtitle(content)) => Ok(Bytes::from(content.clone())),
            Some(MockReply::QuotaExceeded) => Err(ProviderError::QuotaExceeded("no downloads remaining".to_string())),
            Some(MockReply::ServerError) => Err(ProviderError::ApiError {
                status_code: 500,
                message: "internal error".to_string(),
            }),
            Some(MockReply::NotFound) | None => Err(ProviderError::NotFound(imdb_id.to_string())),
        }
    }
}
