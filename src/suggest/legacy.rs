//! Conversion of line-number suggestions into anchor patches.
//!
//! Line content is read from the document text as it was before any patch
//! of the batch is applied. The line numbers are trusted as-is.

use super::schema::{LegacyFixSuggestion, LegacyOperation, PatchOp, PatchSuggestion};
use super::validator::parse_array;

/// Parse sanitized text as a JSON array of legacy suggestions.
///
/// Returns `None` when the text is not a JSON array. Elements that do not
/// have the legacy shape (including unknown operations) are dropped.
pub fn parse_legacy_fixes(json_text: &str) -> Option<Vec<LegacyFixSuggestion>> {
    let elements = parse_array(json_text)?;
    Some(
        elements
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
    )
}

/// Convert legacy entries to anchor patches against `original_text`.
pub fn convert_legacy_to_patches(
    original_text: &str,
    fixes: &[LegacyFixSuggestion],
) -> Vec<PatchSuggestion> {
    let lines: Vec<&str> = original_text.split('\n').collect();
    fixes.iter().map(|fix| convert_one(&lines, fix)).collect()
}

fn convert_one(lines: &[&str], fix: &LegacyFixSuggestion) -> PatchSuggestion {
    let start = fix.start_line.max(1);
    let end = start.max(fix.end_line.unwrap_or(fix.start_line));
    // Both are >= 1 here
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    let end = usize::try_from(end).unwrap_or(usize::MAX);

    let line = |idx: usize| lines.get(idx).copied().unwrap_or_default().to_string();
    let suggested = || fix.suggested_fix.clone().unwrap_or_default();

    let op = match fix.operation {
        LegacyOperation::Replace => PatchOp::Replace {
            target: line_span(lines, start, end),
            replacement: suggested(),
        },
        LegacyOperation::Delete => PatchOp::Delete {
            target: line_span(lines, start, end),
        },
        LegacyOperation::Insert => PatchOp::InsertBefore {
            anchor: line(start.saturating_sub(2)),
            insertion: suggested(),
        },
        LegacyOperation::Append => PatchOp::InsertAfter {
            anchor: line(end - 1),
            insertion: suggested(),
        },
    };

    PatchSuggestion::new(op, fix.issue.clone())
}

/// Lines `start..=end` (one-based) joined with newlines; out-of-range lines are omitted.
fn line_span(lines: &[&str], start: usize, end: usize) -> String {
    let from = (start - 1).min(lines.len());
    let to = end.min(lines.len());
    lines[from..to].join("\n")
}
