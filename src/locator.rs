//! Resolve a patch's target/anchor snippet to a byte range in the current text.
//!
//! Matching is exact: case-sensitive, whitespace-sensitive, no line ending
//! normalization. A located patch is only valid for the text it was located
//! in and must be recomputed after every mutation.

use crate::buffer::TextRange;
use crate::suggest::{PatchKind, PatchSuggestion};
use thiserror::Error;

/// A patch resolved against one document snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatedPatch {
    /// Span of the matched `target` (replace, delete)
    Target { range: TextRange },
    /// Span of the matched `anchor` (insert_before, insert_after)
    Anchor { anchor_range: TextRange },
}

impl LocatedPatch {
    /// The matched span, whichever variant this is.
    pub fn matched(&self) -> TextRange {
        match *self {
            LocatedPatch::Target { range } => range,
            LocatedPatch::Anchor { anchor_range } => anchor_range,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("snippet is empty")]
    EmptySnippet,

    #[error("occurrence {requested} requested but only {found} found")]
    NotFound { requested: usize, found: usize },

    #[error("occurrence index {index} selects no match")]
    NegativeOccurrence { index: i64 },
}

/// Locate `patch` in `text`, honouring its `occurrence_index`.
pub fn locate(text: &str, patch: &PatchSuggestion) -> Result<LocatedPatch, LocateError> {
    let snippet = patch.snippet();
    let n = usize::try_from(patch.occurrence_index).map_err(|_| LocateError::NegativeOccurrence {
        index: patch.occurrence_index,
    })?;
    let start = nth_index_of(text, snippet, n)?;
    let range = TextRange::from_offset_len(start, snippet.len());

    Ok(match patch.kind() {
        PatchKind::Replace | PatchKind::Delete => LocatedPatch::Target { range },
        PatchKind::InsertAfter | PatchKind::InsertBefore => {
            LocatedPatch::Anchor { anchor_range: range }
        }
    })
}

/// Byte offset of the `n`th (zero-based) occurrence of `needle`.
///
/// Each search starts one character after the previous match's start, so
/// `n + 1` sequential searches are made.
pub fn nth_index_of(haystack: &str, needle: &str, n: usize) -> Result<usize, LocateError> {
    if needle.is_empty() {
        return Err(LocateError::EmptySnippet);
    }

    let mut from = 0;
    let mut found = None;
    for seen in 0..=n {
        let pos = match haystack.get(from..).and_then(|rest| rest.find(needle)) {
            Some(idx) => from + idx,
            None => {
                return Err(LocateError::NotFound {
                    requested: n,
                    found: seen,
                })
            }
        };
        found = Some(pos);
        // Step past the first character of this match
        from = pos + haystack[pos..].chars().next().map_or(1, char::len_utf8);
    }

    found.ok_or(LocateError::NotFound {
        requested: n,
        found: 0,
    })
}

/// Document line most similar to the first line of `snippet`, with its
/// zero-based line number and Jaro-Winkler score. Indentation is ignored.
///
/// Diagnostic only: used to explain a failed exact match to a human.
pub fn closest_line<'a>(text: &'a str, snippet: &str) -> Option<(usize, &'a str, f64)> {
    let probe = snippet.lines().map(str::trim).find(|line| !line.is_empty())?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx, line, strsim::jaro_winkler(probe, line.trim())))
        .max_by(|a, b| a.2.total_cmp(&b.2))
}
