//! Sentinel-bounded merge of regenerated function files.
//!
//! The machine-generated region of a function file is bounded by two literal
//! marker lines. Merging keeps everything before the begin marker and after
//! the end marker from the prior file and splices the freshly generated
//! region in between, which is what preserves hand-added code across every
//! regeneration. A prior file without both markers is entirely foreign and
//! is overwritten wholesale.

use crate::openapi::emit::functions::{GENERATED_BEGIN, GENERATED_END};

/// What the merge decided to do with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No prior file existed; the fresh text is written verbatim.
    Created,
    /// The prior file had both markers; its bounded region was replaced.
    Merged,
    /// The prior file lacked a marker and was overwritten wholesale.
    Overwritten,
    /// The result is byte-identical to the prior file.
    Unchanged,
}

/// Merge freshly generated text with the prior file contents, if any.
/// Returns the text to write and what happened.
pub fn merge_generated(prior: Option<&str>, fresh: &str) -> (String, MergeOutcome) {
    let Some(prior) = prior else {
        return (fresh.to_string(), MergeOutcome::Created);
    };

    let Some((prior_head, prior_tail)) = split_at_markers(prior) else {
        if prior == fresh {
            return (fresh.to_string(), MergeOutcome::Unchanged);
        }
        return (fresh.to_string(), MergeOutcome::Overwritten);
    };

    // The fresh text always carries both markers; fall back to a plain
    // overwrite if that invariant is ever violated.
    let Some(fresh_region) = marked_region(fresh) else {
        return (fresh.to_string(), MergeOutcome::Overwritten);
    };

    let merged = format!("{prior_head}{fresh_region}{prior_tail}");
    if merged == prior {
        (merged, MergeOutcome::Unchanged)
    } else {
        (merged, MergeOutcome::Merged)
    }
}

/// Split a prior file into (head before begin marker, tail after end marker).
/// Returns `None` when either marker is missing or out of order.
fn split_at_markers(text: &str) -> Option<(&str, &str)> {
    let begin = marker_line_span(text, GENERATED_BEGIN)?;
    let end_search = &text[begin.1..];
    let end = marker_line_span(end_search, GENERATED_END)?;
    Some((&text[..begin.0], &end_search[end.1..]))
}

/// The marked region of a text, begin line through end line inclusive.
fn marked_region(text: &str) -> Option<&str> {
    let begin = marker_line_span(text, GENERATED_BEGIN)?;
    let end_search = &text[begin.1..];
    let end = marker_line_span(end_search, GENERATED_END)?;
    Some(&text[begin.0..begin.1 + end.1])
}

/// Byte span (start, end-inclusive-of-newline) of the line holding a marker.
fn marker_line_span(text: &str, marker: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']).trim() == marker {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}
