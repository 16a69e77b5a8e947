use anyhow::{Result, Context, anyhow};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: File exists and holds at least one byte
    pub fn non_empty_file<P: AsRef<Path>>(path: P) -> bool {
        fs::metadata(path.as_ref())
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @generates: Output path for a merged subtitle next to the local one
    // @params: local_file, suffix
    pub fn merged_output_path<P: AsRef<Path>>(local_file: P, suffix: &str) -> PathBuf {
        let local_file = local_file.as_ref();
        let stem = local_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push_str(suffix);
        output_filename.push_str(".srt");

        local_file.with_file_name(output_filename)
    }

    /// Last path segment of a subtitle link, used as the local file name
    pub fn file_name_from_link(link: &str) -> Result<String> {
        let parsed = url::Url::parse(link)
            .with_context(|| format!("Invalid subtitle link: {}", link))?;

        parsed.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|segment| segment.to_string())
            .ok_or_else(|| anyhow!("Subtitle link has no file name: {}", link))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Write bytes through a temporary file in the same directory, then rename
    /// it over the target, so readers never observe a partial file
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
        temp.persist(path)
            .map_err(|e| anyhow!("Failed to move temporary file to {}: {}", path.display(), e.error))?;

        Ok(())
    }
}
