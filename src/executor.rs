//! Turn a located patch into exactly one buffer mutation.

use crate::buffer::TextBuffer;
use crate::edit::{Edit, EditError, EditResult};
use crate::locator::LocatedPatch;
use crate::suggest::{PatchOp, PatchSuggestion};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} patch cannot be executed against a located {located}")]
pub struct KindMismatch {
    pub kind: &'static str,
    pub located: &'static str,
}

/// Build the single [`Edit`] that applies `patch` at `located`.
///
/// Replace and delete edits carry the target snippet as expected before-text,
/// so a range that no longer covers the target is refused by the buffer.
///
/// - replace: the target span becomes `replacement` plus a newline
/// - delete: the target span is removed
/// - insert_before: `insertion` plus a newline at the anchor start
/// - insert_after: `insertion` plus a newline at the anchor end
pub fn build_edit(
    located: &LocatedPatch,
    patch: &PatchSuggestion,
) -> Result<Edit, KindMismatch> {
    let mismatch = |located: &'static str| KindMismatch {
        kind: patch.kind().as_str(),
        located,
    };

    match (&patch.op, *located) {
        (PatchOp::Replace { replacement, .. }, LocatedPatch::Target { range }) => Ok(Edit::new(
            range.start,
            range.end,
            format!("{replacement}\n"),
            patch.snippet(),
        )),
        (PatchOp::Delete { .. }, LocatedPatch::Target { range }) => Ok(Edit::new(
            range.start,
            range.end,
            String::new(),
            patch.snippet(),
        )),
        (PatchOp::InsertBefore { insertion, .. }, LocatedPatch::Anchor { anchor_range }) => {
            Ok(Edit::insert(anchor_range.start, format!("{insertion}\n")))
        }
        (PatchOp::InsertAfter { insertion, .. }, LocatedPatch::Anchor { anchor_range }) => {
            Ok(Edit::insert(anchor_range.end, format!("{insertion}\n")))
        }
        (_, LocatedPatch::Target { .. }) => Err(mismatch("target")),
        (_, LocatedPatch::Anchor { .. }) => Err(mismatch("anchor")),
    }
}

/// Apply `patch` at `located` to `buffer` as one atomic edit.
pub fn execute<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    located: &LocatedPatch,
    patch: &PatchSuggestion,
) -> Result<EditResult, ExecuteError> {
    let edit = build_edit(located, patch)?;
    Ok(buffer.apply_edit(&edit)?)
}

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error(transparent)]
    KindMismatch(#[from] KindMismatch),

    #[error(transparent)]
    Edit(#[from] EditError),
}
