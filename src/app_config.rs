use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::warn;

use crate::file_utils::FileManager;

/// Environment variable that supplies the OpenSubtitles API key
pub const API_KEY_ENV: &str = "OPENSUB_API_KEY";

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Timeline merge settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Jump-scare annotation settings
    #[serde(default)]
    pub annotations: AnnotationConfig,

    /// OpenSubtitles client settings
    #[serde(default)]
    pub opensubtitles: OpenSubtitlesConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Timeline merge configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    // @field: Overlap tolerance in ms
    #[serde(default = "default_tolerance_ms")]
    pub tolerance_ms: u64,

    // @field: Appended to the local file stem to name the merged file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    // @field: Directory holding local annotation tracks
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
}

impl MergeConfig {
    /// Tolerance as a duration
    pub fn tolerance(&self) -> Duration {
        Duration::from_millis(self.tolerance_ms)
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            tolerance_ms: default_tolerance_ms(),
            output_suffix: default_output_suffix(),
            local_dir: default_local_dir(),
        }
    }
}

/// Jump-scare annotation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnnotationConfig {
    // @field: Warning window before each jump scare, in ms
    #[serde(default = "default_lead_in_ms")]
    pub lead_in_ms: u64,

    // @field: Cue text for major jump scares
    #[serde(default = "default_major_label")]
    pub major_label: String,

    // @field: Cue text for minor jump scares
    #[serde(default = "default_minor_label")]
    pub minor_label: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: default_lead_in_ms(),
            major_label: default_major_label(),
            minor_label: default_minor_label(),
        }
    }
}

/// OpenSubtitles service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenSubtitlesConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// REST API base URL
    #[serde(default = "default_opensubtitles_endpoint")]
    pub endpoint: String,

    /// Subtitle language to search for
    #[serde(default = "default_language")]
    pub language: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory where downloaded subtitles are cached, keyed by IMDb id
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OpenSubtitlesConfig {
    /// Configured key, falling back to the environment when empty
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty())
    }
}

impl Default for OpenSubtitlesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_opensubtitles_endpoint(),
            language: default_language(),
            user_agent: default_user_agent(),
            download_dir: default_download_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_tolerance_ms() -> u64 {
    500
}

fn default_output_suffix() -> String {
    "_merged".to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("srt")
}

fn default_lead_in_ms() -> u64 {
    5000
}

fn default_major_label() -> String {
    "Upcoming jump scare (Major)".to_string()
}

fn default_minor_label() -> String {
    "Upcoming jump scare (Minor)".to_string()
}

fn default_opensubtitles_endpoint() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_user_agent() -> String {
    "wheresthejump/1.0".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloaded_subs")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load the config file, or write a default one when it does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(path.as_ref(), &json)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.annotations.lead_in_ms == 0 {
            return Err(anyhow!("Annotation lead-in must be greater than zero"));
        }

        if self.annotations.major_label.trim().is_empty() || self.annotations.minor_label.trim().is_empty() {
            return Err(anyhow!("Annotation labels must not be empty"));
        }

        if self.opensubtitles.language.trim().is_empty() {
            return Err(anyhow!("Subtitle language must not be empty"));
        }

        if self.opensubtitles.endpoint.trim().is_empty() {
            return Err(anyhow!("OpenSubtitles endpoint must not be empty"));
        }

        if self.merge.output_suffix.is_empty() {
            return Err(anyhow!("Merged output suffix must not be empty"));
        }

        Ok(())
    }

    /// Validation for workflows that download subtitles
    pub fn validate_for_download(&self) -> Result<String> {
        self.validate()?;
        self.opensubtitles.resolved_api_key().ok_or_else(|| {
            anyhow!("OpenSubtitles API key is required: set opensubtitles.api_key or {}", API_KEY_ENV)
        })
    }
}
