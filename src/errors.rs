/*!
 * Error types for the wheresthejump application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a remote subtitle source
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// No subtitle exists for the requested movie
    #[error("No subtitles found: {0}")]
    NotFound(String),

    /// The download quota is used up; every further call fails the same way
    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    /// Whether this error should stop a whole batch rather than a single movie
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_) | Self::AuthenticationError(_))
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubtitleError {
    /// A cue ends before it starts
    #[error("Invalid cue {seq_num}: end {end_ms}ms is before start {start_ms}ms")]
    InvalidCue {
        /// Sequence number of the offending cue
        seq_num: usize,
        /// Start time in ms
        start_ms: u64,
        /// End time in ms
        end_ms: u64,
    },

    /// A timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The input held no usable cues
    #[error("No valid subtitle entries were found")]
    NoEntries,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Input needed to process a movie is missing
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
