/*!
 * Remote subtitle sources.
 *
 * - OpenSubtitles: REST API v1 client, searched by IMDb id
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for services that hand out subtitle files for a movie
///
/// Implementations are treated as opaque byte sources; callers own caching
/// and decide how to react to each error kind.
#[async_trait]
pub trait SubtitleSource: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Download the preferred subtitle file for a movie
    ///
    /// # Arguments
    /// * `imdb_id` - IMDb title id, with or without the `tt` prefix
    ///
    /// # Returns
    /// * `Result<Bytes, ProviderError>` - Raw subtitle file content or an error
    async fn fetch_subtitle(&self, imdb_id: &str) -> Result<Bytes, ProviderError>;
}

/// IMDb id in its canonical `tt`-prefixed form; title page URLs are accepted too
pub fn normalize_imdb_id(imdb_id: &str) -> String {
    let trimmed = imdb_id.trim();
    let trimmed = trimmed.strip_prefix("https://www.imdb.com/title/")
        .or_else(|| trimmed.strip_prefix("http://www.imdb.com/title/"))
        .unwrap_or(trimmed)
        .trim_matches(|c: char| c == '/' || c == '#');
    if trimmed.starts_with("tt") {
        trimmed.to_string()
    } else {
        format!("tt{}", trimmed)
    }
}

pub mod opensubtitles;
