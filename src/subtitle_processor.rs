use std::path::{Path, PathBuf};
use std::time::Duration;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use log::{warn, debug};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::merge;

// @module: Subtitle reading, writing and manipulation

// @const: SRT timing line regex, tolerates '.' as millisecond separator
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @struct: Single subtitle entry (a cue)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without validation
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range (zero-length allowed) and non-empty text
    pub fn new_validated(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Result<Self> {
        let entry = SubtitleEntry::new(seq_num, start_time_ms, end_time_ms, text.trim().to_string());
        entry.validate()?;

        if entry.text.is_empty() {
            return Err(anyhow!("Empty subtitle text for entry {}", seq_num));
        }

        Ok(entry)
    }

    /// Check the `end >= start` invariant
    pub fn validate(&self) -> Result<(), SubtitleError> {
        if self.end_time_ms < self.start_time_ms {
            return Err(SubtitleError::InvalidCue {
                seq_num: self.seq_num,
                start_ms: self.start_time_ms,
                end_ms: self.end_time_ms,
            });
        }
        Ok(())
    }

    /// Display lines of the cue, in order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Length of the cue in ms
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Whether `other`, widened by `tolerance` on both sides, overlaps this cue
    pub fn overlaps_within(&self, other: &SubtitleEntry, tolerance: Duration) -> bool {
        let tolerance_ms = u64::try_from(tolerance.as_millis()).unwrap_or(u64::MAX);
        other.end_time_ms.saturating_add(tolerance_ms) >= self.start_time_ms
            && other.start_time_ms.saturating_sub(tolerance_ms) <= self.end_time_ms
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()).into());
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()).into());
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

/// A track: subtitle entries read from (or destined for) one file
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries, in file order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create an empty subtitle collection
    pub fn new(source_file: PathBuf) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Create a collection from already built entries
    pub fn from_entries(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection {
            source_file,
            entries,
        }
    }

    /// Read and parse an SRT file
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        let entries = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        debug!("Loaded {} entries from {}", entries.len(), path.display());
        Ok(Self::from_entries(path.to_path_buf(), entries))
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection holds no cues
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable sort by start time, then renumber
    pub fn sort_by_start(&mut self) {
        self.entries.sort_by_key(|entry| entry.start_time_ms);
        self.renumber();
    }

    /// Renumber entries to ensure sequential order
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }
    }

    /// Merge a downloaded track into this (local) one
    pub fn merge_with(&self, downloaded: &SubtitleCollection, tolerance: Duration) -> Result<SubtitleCollection, SubtitleError> {
        let entries = merge::merge(self.entries.clone(), downloaded.entries.clone(), tolerance)?;
        Ok(SubtitleCollection::from_entries(self.source_file.clone(), entries))
    }

    /// Serialize to SRT with sequential indices starting at 1
    pub fn to_srt_string(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("{}\n", i + 1));
            out.push_str(&format!("{} --> {}\n", entry.format_start_time(), entry.format_end_time()));
            out.push_str(&entry.text);
            out.push_str("\n\n");
        }
        out
    }

    /// Write subtitles to an SRT file; the target is replaced only once fully written
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        FileManager::write_atomic(path, self.to_srt_string().as_bytes())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }

    /// Parse SRT format string into subtitle entries, in file order
    ///
    /// A block of text that follows a finished cue without its own index and
    /// timing line is folded back into that cue after a blank line. This is how
    /// merged cues, whose text contains blank lines, read back as one cue.
    /// A number only counts as an index when a timing line follows it.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        let content = content.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = content.lines().map(str::trim).collect();
        let mut entries: Vec<SubtitleEntry> = Vec::new();

        // Whether stray text may still be folded into the last entry
        let mut can_fold = false;
        let mut i = 0;

        while i < lines.len() {
            if lines[i].is_empty() {
                i += 1;
                continue;
            }

            let Some((index, timing_line)) = Self::cue_header(&lines, i) else {
                let block_end = Self::block_end(&lines, i);
                let block = lines[i..block_end].join("\n");
                match entries.last_mut() {
                    Some(last) if can_fold => {
                        last.text.push_str("\n\n");
                        last.text.push_str(&block);
                    },
                    _ => warn!("Unexpected text at line {} before sequence number or timestamp: {}", i + 1, lines[i]),
                }
                i = block_end;
                continue;
            };

            let text_start = timing_line + 1;
            let text_end = Self::block_end(&lines, text_start);
            let seq_num = index.unwrap_or(entries.len() + 1);
            let text = lines[text_start..text_end].join("\n");
            i = text_end;
            can_fold = false;

            let (start_ms, end_ms) = match Self::parse_timing_line(lines[timing_line]) {
                Ok(times) => times,
                Err(e) => {
                    warn!("Invalid timestamp format at line {}: {}", timing_line + 1, e);
                    continue;
                }
            };

            if text.is_empty() {
                warn!("Skipping subtitle entry {} without text", seq_num);
                continue;
            }

            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, text) {
                Ok(entry) => {
                    entries.push(entry);
                    can_fold = true;
                },
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        }

        if entries.is_empty() {
            warn!("No valid subtitle entries found in content");
            return Err(SubtitleError::NoEntries.into());
        }

        let overlap_count = entries.windows(2)
            .filter(|pair| pair[0].end_time_ms > pair[1].start_time_ms)
            .count();
        if overlap_count > 0 {
            debug!("Found {} overlapping subtitle entries", overlap_count);
        }

        Ok(entries)
    }

    // Index (if any) and position of the timing line of a cue starting at `i`
    fn cue_header(lines: &[&str], i: usize) -> Option<(Option<usize>, usize)> {
        if TIMESTAMP_REGEX.is_match(lines[i]) {
            return Some((None, i));
        }

        let index = lines[i].parse::<usize>().ok()?;
        match lines.get(i + 1) {
            Some(next) if TIMESTAMP_REGEX.is_match(next) => Some((Some(index), i + 1)),
            _ => None,
        }
    }

    // First line after `start` that ends a text block: a blank line or the next cue
    fn block_end(lines: &[&str], start: usize) -> usize {
        (start..lines.len())
            .find(|&j| lines[j].is_empty() || Self::cue_header(lines, j).is_some())
            .unwrap_or(lines.len())
    }

    // Start and end of a `start --> end` line; trailing position hints are ignored
    fn parse_timing_line(line: &str) -> Result<(u64, u64)> {
        let (start, end) = line.split_once("-->")
            .ok_or_else(|| SubtitleError::InvalidTimestamp(line.to_string()))?;
        let end = end.split_whitespace().next()
            .ok_or_else(|| SubtitleError::InvalidTimestamp(line.to_string()))?;

        Ok((SubtitleEntry::parse_timestamp(start)?, SubtitleEntry::parse_timestamp(end)?))
    }
}
