/*!
 * Tests for jump-scare annotations
 */

use std::path::PathBuf;
use wheresthejump::app_config::AnnotationConfig;
use wheresthejump::jump_scares::{annotations_to_collection, parse_jump_scares, JumpScare};
use crate::common;

/// Paragraphs with a time become annotations, in page order
#[test]
fn test_parse_jump_scares_withMoviePage_shouldFindTimedParagraphs() {
    let scares = parse_jump_scares(common::movie_page_html());

    assert_eq!(scares.len(), 3);
    assert_eq!(scares[0].timestamp_ms, 12_000);
    assert!(!scares[0].is_major);
    assert_eq!(scares[0].label, "00:00:12 – A cat jumps out of the cupboard.");

    assert_eq!(scares[1].timestamp_ms, (45 * 60 + 30) * 1000);
    assert!(scares[1].is_major);

    assert_eq!(scares[2].timestamp_ms, 3_000);
}

/// Pages without timestamps yield nothing
#[test]
fn test_parse_jump_scares_withNoTimes_shouldReturnEmpty() {
    assert!(parse_jump_scares("<p>Nothing scary here.</p><div>00:10:00</div>").is_empty());
}

/// Paragraphs with an omitted closing tag stay separate
#[test]
fn test_parse_jump_scares_withUnclosedParagraph_shouldKeepBothScares() {
    let scares = parse_jump_scares("<p>00:10:00 – Door slam<p><strong>00:20:00 – Cat</strong></p>");

    assert_eq!(scares.len(), 2);
    assert_eq!(scares[0].timestamp_ms, 600_000);
    assert!(!scares[0].is_major);
    assert_eq!(scares[0].label, "00:10:00 – Door slam");
    assert_eq!(scares[1].timestamp_ms, 1_200_000);
    assert!(scares[1].is_major);
}

/// Times glued to surrounding text are still found
#[test]
fn test_parse_jump_scares_withTimeInsideWord_shouldMatch() {
    let scares = parse_jump_scares("<p>Scare at00:12:34sharp</p><p><b>01:00:00</b></p>");

    assert_eq!(scares.len(), 2);
    assert_eq!(scares[0].timestamp_ms, (12 * 60 + 34) * 1000);
    assert!(scares[1].is_major);
}

/// A major scare opens a five second window that ends on the scare
#[test]
fn test_to_entry_withMajorScare_shouldUseLeadInWindow() {
    let scare = JumpScare {
        timestamp_ms: (12 * 60 + 34) * 1000,
        is_major: true,
        label: "00:12:34".to_string(),
    };

    let entry = scare.to_entry(1, &AnnotationConfig::default());

    assert_eq!(entry.format_start_time(), "00:12:29,000");
    assert_eq!(entry.format_end_time(), "00:12:34,000");
    assert_eq!(entry.text, "Upcoming jump scare (Major)");
}

/// Scares in the first seconds clamp the window at zero
#[test]
fn test_to_entry_withEarlyScare_shouldClampStartAtZero() {
    let scare = JumpScare { timestamp_ms: 3_000, is_major: false, label: String::new() };

    let entry = scare.to_entry(1, &AnnotationConfig::default());

    assert_eq!(entry.start_time_ms, 0);
    assert_eq!(entry.end_time_ms, 3_000);
    assert_eq!(entry.text, "Upcoming jump scare (Minor)");
}

/// Configured labels and lead-in are honored
#[test]
fn test_annotations_to_collection_withCustomConfig_shouldApplyIt() {
    let config = AnnotationConfig {
        lead_in_ms: 2_000,
        major_label: "BIG".to_string(),
        minor_label: "small".to_string(),
    };
    let scares = parse_jump_scares(common::movie_page_html());

    let track = annotations_to_collection(&scares, PathBuf::from("Alien.srt"), &config);

    assert_eq!(track.len(), 3);
    assert_eq!(track.entries[0].start_time_ms, 10_000);
    assert_eq!(track.entries[0].text, "small");
    assert_eq!(track.entries[1].text, "BIG");
    let seq: Vec<usize> = track.entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(seq, vec![1, 2, 3]);
}
