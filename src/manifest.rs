/*!
 * Batch manifest: the list of movies to process and their progress.
 *
 * Stored as a JSON array of records. The batch controller fills in
 * `merged_srt` and rewrites the file after every movie.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::providers::normalize_imdb_id;

/// One movie to merge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    /// Movie title
    pub title: String,

    /// IMDb id; rows without one cannot be downloaded for
    #[serde(default)]
    pub imdb_id: Option<String>,

    /// Path of the local jump-scare track
    #[serde(default)]
    pub local_srt: Option<PathBuf>,

    /// Link the local track was published under; its file name locates the
    /// track in the local directory when `local_srt` is absent
    #[serde(default)]
    pub srt_link: Option<String>,

    /// Path of the merged output, once produced
    #[serde(default)]
    pub merged_srt: Option<PathBuf>,
}

impl MovieRecord {
    /// Canonical IMDb id, if any
    pub fn imdb(&self) -> Option<String> {
        self.imdb_id.as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(normalize_imdb_id)
    }

    /// Where the local track lives
    pub fn resolve_local_srt(&self, local_dir: &Path) -> Result<PathBuf> {
        if let Some(path) = &self.local_srt {
            return Ok(path.clone());
        }

        match &self.srt_link {
            Some(link) if !link.trim().is_empty() => {
                let file_name = FileManager::file_name_from_link(link.trim())?;
                Ok(local_dir.join(file_name))
            },
            _ => Ok(local_dir.join(format!("{}.srt", self.title))),
        }
    }
}

/// All movies of a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Manifest {
    pub movies: Vec<MovieRecord>,
}

impl Manifest {
    /// Read a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Write the manifest, replacing the file only once fully written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize manifest")?;
        FileManager::write_atomic(path, json.as_bytes())
    }
}
