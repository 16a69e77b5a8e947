/*!
 * Jump-scare annotations read from a movie page.
 *
 * Every paragraph that carries an `HH:MM:SS` timestamp marks one jump scare.
 * Paragraphs with bold text mark major scares; the rest are minor. Each
 * annotation becomes a cue that opens a fixed lead-in window before the
 * scare and closes on it.
 */

use std::path::PathBuf;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use log::{debug, warn};

use crate::app_config::AnnotationConfig;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p").unwrap()
});

static BOLD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("strong, b").unwrap()
});

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})").unwrap()
});

/// One annotated jump scare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpScare {
    /// Moment of the scare, ms since media start
    pub timestamp_ms: u64,
    /// Whether the page marks it as major
    pub is_major: bool,
    /// Paragraph text with markup removed
    pub label: String,
}

impl JumpScare {
    /// Cue announcing this scare: `[timestamp - lead_in, timestamp]`, clamped at zero
    pub fn to_entry(&self, seq_num: usize, config: &AnnotationConfig) -> SubtitleEntry {
        let text = if self.is_major {
            config.major_label.clone()
        } else {
            config.minor_label.clone()
        };

        SubtitleEntry::new(
            seq_num,
            self.timestamp_ms.saturating_sub(config.lead_in_ms),
            self.timestamp_ms,
            text,
        )
    }
}

/// Extract jump scares from page HTML, in page order
pub fn parse_jump_scares(html: &str) -> Vec<JumpScare> {
    let document = Html::parse_document(html);
    let mut scares = Vec::new();

    for paragraph in document.select(&PARAGRAPH_SELECTOR) {
        let label = plain_text(&paragraph);

        let timestamp_ms = match TIME_REGEX.captures(&label) {
            Some(time) => {
                let component = |idx: usize| time.get(idx).and_then(|m| m.as_str().parse::<u64>().ok());
                match (component(1), component(2), component(3)) {
                    (Some(h), Some(m), Some(s)) if m < 60 && s < 60 => (h * 3600 + m * 60 + s) * 1000,
                    _ => {
                        warn!("Ignoring paragraph with invalid time: {}", label);
                        continue;
                    }
                }
            },
            None => continue,
        };

        scares.push(JumpScare {
            timestamp_ms,
            is_major: paragraph.select(&BOLD_SELECTOR).next().is_some(),
            label,
        });
    }

    debug!(
        "Found {} jump scares ({} major)",
        scares.len(),
        scares.iter().filter(|s| s.is_major).count()
    );
    scares
}

/// Build the local annotation track for a page
pub fn annotations_to_collection(scares: &[JumpScare], source_file: PathBuf, config: &AnnotationConfig) -> SubtitleCollection {
    let entries = scares.iter()
        .enumerate()
        .map(|(i, scare)| scare.to_entry(i + 1, config))
        .collect();

    SubtitleCollection::from_entries(source_file, entries)
}

// Whitespace-collapsed text content of an element
fn plain_text(element: &ElementRef) -> String {
    element.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
