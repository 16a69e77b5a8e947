use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::jump_scares;
use crate::manifest::{Manifest, MovieRecord};
use crate::providers::{normalize_imdb_id, SubtitleSource};
use crate::subtitle_processor::SubtitleCollection;

// @module: Application controller for annotation, download and merge workflows

/// What happened to one movie of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum MovieOutcome {
    /// A merged file was written
    Merged(PathBuf),
    /// A merged file already existed and was kept
    AlreadyMerged(PathBuf),
}

/// Counters for a finished batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub merged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Counters for one merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub local_cues: usize,
    pub downloaded_cues: usize,
    pub merged_cues: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;

        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Merge two SRT files and write the result to `output`
    pub fn merge_files(&self, local: &Path, downloaded: &Path, output: &Path) -> Result<MergeReport> {
        let local_track = SubtitleCollection::from_srt_file(local)?;
        let downloaded_track = SubtitleCollection::from_srt_file(downloaded)?;

        let merged = local_track.merge_with(&downloaded_track, self.config.merge.tolerance())
            .with_context(|| format!("Failed to merge {} with {}", local.display(), downloaded.display()))?;
        merged.write_to_srt(output)?;

        let report = MergeReport {
            local_cues: local_track.len(),
            downloaded_cues: downloaded_track.len(),
            merged_cues: merged.len(),
        };
        info!("Merged subtitles written to {} ({} cues)", output.display(), report.merged_cues);

        Ok(report)
    }

    /// Build a local jump-scare track from a movie page (file path or http(s) URL)
    pub async fn annotate(&self, source: &str, output: &Path) -> Result<usize> {
        let html = self.load_page(source).await?;
        let scares = jump_scares::parse_jump_scares(&html);
        if scares.is_empty() {
            return Err(anyhow!("No jump scare timestamps found in {}", source));
        }

        let track = jump_scares::annotations_to_collection(&scares, output.to_path_buf(), &self.config.annotations);
        track.write_to_srt(output)?;
        info!("Wrote {} jump scare cues to {}", track.len(), output.display());

        Ok(track.len())
    }

    async fn load_page(&self, source: &str) -> Result<String> {
        let is_web = url::Url::parse(source)
            .map(|u| u.scheme() == "http" || u.scheme() == "https")
            .unwrap_or(false);

        if !is_web {
            return FileManager::read_to_string(source);
        }

        let client = Client::builder()
            .user_agent(self.config.opensubtitles.user_agent.clone())
            .timeout(Duration::from_secs(self.config.opensubtitles.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let response = client.get(source).send().await
            .with_context(|| format!("Failed to fetch page: {}", source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Failed to fetch page {}: HTTP {}", source, status));
        }

        response.text().await
            .with_context(|| format!("Failed to read page body: {}", source))
    }

    /// Path of the cached download for a movie
    pub fn downloaded_path(&self, imdb_id: &str) -> PathBuf {
        self.config.opensubtitles.download_dir
            .join(format!("{}.srt", normalize_imdb_id(imdb_id)))
    }

    /// Download the subtitle for a movie unless a non-empty copy is cached
    pub async fn fetch_subtitle(&self, source: &dyn SubtitleSource, imdb_id: &str) -> Result<PathBuf, AppError> {
        let out_path = self.downloaded_path(imdb_id);
        if FileManager::non_empty_file(&out_path) {
            debug!("Using cached subtitle {}", out_path.display());
            return Ok(out_path);
        }

        let content = source.fetch_subtitle(imdb_id).await?;
        if content.is_empty() {
            return Err(AppError::MissingData(format!("{} returned an empty subtitle for {}", source.name(), imdb_id)));
        }

        FileManager::write_atomic(&out_path, &content)?;
        info!("Saved: {}", out_path.display());

        Ok(out_path)
    }

    /// Download and merge the subtitles of one movie
    pub async fn process_movie(&self, source: &dyn SubtitleSource, record: &MovieRecord, force_overwrite: bool) -> Result<MovieOutcome, AppError> {
        let imdb_id = record.imdb()
            .ok_or_else(|| AppError::MissingData(format!("{} has no IMDb id", record.title)))?;

        let local = record.resolve_local_srt(&self.config.merge.local_dir)?;
        if !FileManager::file_exists(&local) {
            return Err(AppError::MissingData(format!("local track not found: {}", local.display())));
        }

        let output = FileManager::merged_output_path(&local, &self.config.merge.output_suffix);
        if output.exists() && !force_overwrite {
            debug!("Skipping {}, merged file exists (use -f to force overwrite)", record.title);
            return Ok(MovieOutcome::AlreadyMerged(output));
        }

        let downloaded = self.fetch_subtitle(source, &imdb_id).await?;
        self.merge_files(&local, &downloaded, &output)?;

        Ok(MovieOutcome::Merged(output))
    }

    /// Download and merge every movie of a manifest, recording results in it
    ///
    /// A failing movie is logged and left without a merged path. Quota and
    /// authentication errors stop the batch, since every later call would fail
    /// the same way.
    pub async fn run_batch(&self, source: &dyn SubtitleSource, manifest_path: &Path, force_overwrite: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let mut manifest = Manifest::load(manifest_path)?;
        let mut summary = BatchSummary::default();

        let progress_bar = ProgressBar::new(manifest.movies.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} movies ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("=> "));

        info!("Processing {} movies with {}", manifest.movies.len(), source.name());

        for i in 0..manifest.movies.len() {
            let record = manifest.movies[i].clone();
            progress_bar.set_message(record.title.clone());

            match self.process_movie(source, &record, force_overwrite).await {
                Ok(MovieOutcome::Merged(path)) => {
                    manifest.movies[i].merged_srt = Some(path);
                    summary.merged += 1;
                },
                Ok(MovieOutcome::AlreadyMerged(path)) => {
                    manifest.movies[i].merged_srt = Some(path);
                    summary.skipped += 1;
                },
                Err(AppError::Provider(e)) if e.is_fatal() => {
                    progress_bar.abandon();
                    error!("Stopping batch at {}: {}", record.title, e);
                    manifest.save(manifest_path)?;
                    return Err(AppError::Provider(e).into());
                },
                Err(e) => {
                    warn!("Failed for {}: {}", record.title, e);
                    manifest.movies[i].merged_srt = None;
                    summary.failed += 1;
                },
            }

            manifest.save(manifest_path)?;
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        info!(
            "Batch complete in {}: {} merged, {} already merged, {} failed",
            Self::format_duration(start_time.elapsed()),
            summary.merged,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
