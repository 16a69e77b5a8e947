/*!
 * Timeline merge of a local annotation track with a downloaded subtitle track.
 *
 * Each local cue, in input order, absorbs every not yet consumed downloaded
 * cue that overlaps it once widened by the tolerance. The combined cue keeps
 * the local cue's interval. Downloaded cues left unclaimed pass through
 * unchanged, and the result is stably sorted by start time.
 *
 * Assignment is greedy: a downloaded cue belongs to the first local cue that
 * reaches it, even if a later local cue overlaps it more tightly.
 */

use std::time::Duration;
use log::debug;

use crate::errors::SubtitleError;
use crate::subtitle_processor::SubtitleEntry;

/// Tolerance used when none is configured
pub const DEFAULT_TOLERANCE: Duration = Duration::from_millis(500);

/// Separator placed between the texts of a combined cue
pub const TEXT_SEPARATOR: &str = "\n\n";

/// Merge `downloaded` into `local`.
///
/// Fails only if a cue in either track ends before it starts; such input is
/// rejected as-is rather than clamped.
pub fn merge(
    local: Vec<SubtitleEntry>,
    downloaded: Vec<SubtitleEntry>,
    tolerance: Duration,
) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    for entry in local.iter().chain(downloaded.iter()) {
        entry.validate()?;
    }

    let local_count = local.len();
    let downloaded_count = downloaded.len();
    let mut consumed = vec![false; downloaded_count];
    let mut merged = Vec::with_capacity(local_count + downloaded_count);
    let mut combined_count = 0;

    for mut local_entry in local {
        let matches: Vec<usize> = downloaded.iter()
            .enumerate()
            .filter(|(i, dl)| !consumed[*i] && local_entry.overlaps_within(dl, tolerance))
            .map(|(i, _)| i)
            .collect();

        if matches.is_empty() {
            merged.push(local_entry);
            continue;
        }

        let mut text = local_entry.text.trim().to_string();
        for i in matches {
            consumed[i] = true;
            text.push_str(TEXT_SEPARATOR);
            text.push_str(downloaded[i].text.trim());
        }
        local_entry.text = text;
        merged.push(local_entry);
        combined_count += 1;
    }

    let absorbed = consumed.iter().filter(|used| **used).count();
    merged.extend(
        downloaded.into_iter()
            .zip(consumed)
            .filter_map(|(entry, used)| (!used).then_some(entry)),
    );

    // sort_by_key is stable: local-derived cues stay ahead on equal starts
    merged.sort_by_key(|entry| entry.start_time_ms);
    for (i, entry) in merged.iter_mut().enumerate() {
        entry.seq_num = i + 1;
    }

    debug!(
        "Merged {} local and {} downloaded cues into {} ({} combined, {} downloaded absorbed)",
        local_count, downloaded_count, merged.len(), combined_count, absorbed
    );

    Ok(merged)
}
