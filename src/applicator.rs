//! Sequential applier - drives a patch list one patch at a time.
//!
//! For each patch, in input order:
//! - locate it against the buffer's *current* text
//! - on a miss, report it and move on
//! - otherwise preview it, wait for a decision, apply or skip, clear the preview
//!
//! Ranges are never carried from one patch to the next: every applied patch can
//! shift or rewrite the text the following patches are searched in.

use crate::buffer::TextBuffer;
use crate::edit::{EditError, EditResult};
use crate::executor::{execute, ExecuteError};
use crate::locator::locate;
use crate::review::{Decision, PatchPreview, Reviewer};
use crate::suggest::{PatchKind, PatchSuggestion};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Shared stop flag checked before each patch starts.
///
/// Raising it never interrupts a patch that is already being applied.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// Applied and the document changed
    Applied,
    /// Apply was chosen but the span already held the new text
    AlreadyApplied,
    /// Skip was chosen, or no decision was made
    Skipped,
    /// The target/anchor was not in the current text
    NotFound { reason: String },
    /// The batch stopped before this patch was reached
    NotAttempted,
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatus::Applied => write!(f, "applied"),
            PatchStatus::AlreadyApplied => write!(f, "already applied"),
            PatchStatus::Skipped => write!(f, "skipped"),
            PatchStatus::NotFound { reason } => write!(f, "not found ({reason})"),
            PatchStatus::NotAttempted => write!(f, "not attempted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub index: usize,
    pub kind: PatchKind,
    pub issue: String,
    pub status: PatchStatus,
}

/// Per-patch outcomes of a finished batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "ApplyReport should be checked for not-found patches"]
pub struct ApplyReport {
    pub outcomes: Vec<PatchOutcome>,
}

impl ApplyReport {
    fn count(&self, pred: impl Fn(&PatchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Applied))
    }

    pub fn already_applied(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::AlreadyApplied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Skipped))
    }

    pub fn not_found(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::NotFound { .. }))
    }

    pub fn not_attempted(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::NotAttempted))
    }
}

/// A buffer mutation failed. The document state is uncertain, so the batch
/// stopped at this patch.
#[derive(Error, Debug)]
#[error("patch {} ({issue}) could not be applied: {source}", .index + 1)]
pub struct ApplyError {
    pub index: usize,
    pub issue: String,
    #[source]
    pub source: EditError,
    /// Outcomes of the patches before the failing one
    pub completed: Vec<PatchOutcome>,
}

/// Runs a patch list against one buffer it exclusively borrows.
pub struct SequentialApplier<'a, B: ?Sized, R: ?Sized> {
    buffer: &'a mut B,
    reviewer: &'a mut R,
    abort: AbortSignal,
}

impl<'a, B, R> SequentialApplier<'a, B, R>
where
    B: TextBuffer + ?Sized,
    R: Reviewer + ?Sized,
{
    pub fn new(buffer: &'a mut B, reviewer: &'a mut R) -> Self {
        Self {
            buffer,
            reviewer,
            abort: AbortSignal::new(),
        }
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    /// Process `patches` strictly in order.
    ///
    /// Locate misses are recorded and do not stop the batch. A buffer
    /// mutation failure stops it and is returned as an error.
    pub fn run(mut self, patches: &[PatchSuggestion]) -> Result<ApplyReport, ApplyError> {
        let mut outcomes = Vec::with_capacity(patches.len());

        for (index, patch) in patches.iter().enumerate() {
            let status = if self.abort.is_raised() {
                tracing::debug!(index, "abort raised, not attempting patch");
                PatchStatus::NotAttempted
            } else {
                match self.process(index, patches.len(), patch) {
                    Ok(status) => status,
                    Err(source) => {
                        tracing::error!(index, issue = %patch.issue, error = %source, "buffer mutation failed");
                        return Err(ApplyError {
                            index,
                            issue: patch.issue.clone(),
                            source,
                            completed: outcomes,
                        });
                    }
                }
            };

            outcomes.push(PatchOutcome {
                index,
                kind: patch.kind(),
                issue: patch.issue.clone(),
                status,
            });
        }

        Ok(ApplyReport { outcomes })
    }

    fn process(
        &mut self,
        index: usize,
        total: usize,
        patch: &PatchSuggestion,
    ) -> Result<PatchStatus, EditError> {
        let kind = patch.kind();

        let located = match locate(self.buffer.text(), patch) {
            Ok(located) => located,
            Err(err) => {
                tracing::warn!(index, %kind, issue = %patch.issue, reason = %err, "could not locate patch in document");
                self.reviewer.not_found(patch, self.buffer.text(), &err);
                return Ok(PatchStatus::NotFound {
                    reason: err.to_string(),
                });
            }
        };

        let range = located.matched();
        tracing::debug!(index, %kind, start = range.start, end = range.end, "patch located");

        let preview = PatchPreview {
            index,
            total,
            patch,
            located,
            start: self.buffer.position_at(range.start),
            end: self.buffer.position_at(range.end),
            document: self.buffer.text(),
        };
        self.reviewer.preview(&preview);
        let decision = self.reviewer.decide(&preview).unwrap_or(Decision::Skip);
        tracing::debug!(index, ?decision, "patch decided");

        match decision {
            Decision::Skip => {
                self.reviewer.clear();
                Ok(PatchStatus::Skipped)
            }
            Decision::Apply => {
                let result = execute(&mut *self.buffer, &located, patch);
                self.reviewer.clear();
                match result {
                    Ok(EditResult::Applied { bytes_changed }) => {
                        tracing::debug!(index, bytes_changed, "patch applied");
                        Ok(PatchStatus::Applied)
                    }
                    Ok(EditResult::AlreadyApplied) => Ok(PatchStatus::AlreadyApplied),
                    Err(ExecuteError::Edit(err)) => Err(err),
                    // The locator produced the variant from the same patch
                    Err(ExecuteError::KindMismatch(err)) => Ok(PatchStatus::NotFound {
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }
}

/// Convenience wrapper: run `patches` against `buffer` with `reviewer`.
pub fn apply_sequentially<B, R>(
    buffer: &mut B,
    patches: &[PatchSuggestion],
    reviewer: &mut R,
) -> Result<ApplyReport, ApplyError>
where
    B: TextBuffer + ?Sized,
    R: Reviewer + ?Sized,
{
    SequentialApplier::new(buffer, reviewer).run(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::edit::Edit;
    use crate::locator::LocateError;
    use crate::review::{FixedReviewer, ScriptedReviewer};

    #[test]
    fn test_applies_in_order_against_current_text() {
        // The second patch targets text the first one creates
        let mut buffer = MemoryBuffer::new("a = 1\n");
        let patches = vec![
            PatchSuggestion::insert_after("a = 1\n", "b = 2", "add b"),
            PatchSuggestion::replace("b = 2\n", "b = 3", "bump b"),
        ];

        let report = apply_sequentially(&mut buffer, &patches, &mut FixedReviewer::apply_all())
            .unwrap();

        assert_eq!(report.applied(), 2);
        assert_eq!(buffer.text(), "a = 1\nb = 3\n");
    }

    #[test]
    fn test_skip_and_missing_decision_leave_text() {
        let mut buffer = MemoryBuffer::new("x\ny\nz\n");
        let patches = vec![
            PatchSuggestion::delete("x\n", "drop x"),
            PatchSuggestion::delete("y\n", "drop y"),
            PatchSuggestion::delete("z\n", "drop z"),
        ];
        let mut reviewer = ScriptedReviewer::new([Some(Decision::Skip), None, Some(Decision::Apply)]);

        let report = apply_sequentially(&mut buffer, &patches, &mut reviewer).unwrap();

        assert_eq!(buffer.text(), "x\ny\n");
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.applied(), 1);
        assert_eq!(reviewer.previewed, vec!["DELETE: drop x", "DELETE: drop y", "DELETE: drop z"]);
        assert_eq!(reviewer.cleared, 3);
        assert_eq!(reviewer.max_open_previews, 1);
    }

    #[test]
    fn test_not_found_continues_batch() {
        let mut buffer = MemoryBuffer::new("keep\n");
        let patches = vec![
            PatchSuggestion::delete("missing", "ghost"),
            PatchSuggestion::insert_before("keep", "first", "prepend"),
        ];
        let mut reviewer = ScriptedReviewer::new([Some(Decision::Apply)]);

        let report = apply_sequentially(&mut buffer, &patches, &mut reviewer).unwrap();

        assert_eq!(reviewer.not_found, vec!["ghost"]);
        assert_eq!(reviewer.previewed.len(), 1);
        assert!(matches!(
            report.outcomes[0].status,
            PatchStatus::NotFound { .. }
        ));
        assert_eq!(buffer.text(), "first\nkeep\n");
    }

    #[test]
    fn test_skipped_patch_does_not_shift_later_ones() {
        let mut buffer = MemoryBuffer::new("v = 1\nv = 1\n");
        let patches = vec![
            PatchSuggestion::replace("v = 1", "v = 2", "first"),
            PatchSuggestion::replace("v = 1", "v = 3", "second").with_occurrence(1),
        ];
        let mut reviewer = ScriptedReviewer::new([Some(Decision::Skip), Some(Decision::Apply)]);

        let _ = apply_sequentially(&mut buffer, &patches, &mut reviewer).unwrap();

        assert_eq!(buffer.text(), "v = 1\nv = 3\n\n");
    }

    #[test]
    fn test_occurrence_index_counts_at_resolution_time() {
        // After the first replace only one "v = 1" is left, so index 1 misses
        let mut buffer = MemoryBuffer::new("v = 1\nv = 1\n");
        let patches = vec![
            PatchSuggestion::replace("v = 1", "v = 2", "first"),
            PatchSuggestion::replace("v = 1", "v = 3", "second").with_occurrence(1),
        ];

        let report = apply_sequentially(&mut buffer, &patches, &mut FixedReviewer::apply_all())
            .unwrap();

        assert_eq!(report.applied(), 1);
        assert_eq!(report.not_found(), 1);
        assert_eq!(buffer.text(), "v = 2\n\nv = 1\n");
    }

    struct AbortAfterFirst {
        signal: AbortSignal,
        decisions: usize,
    }

    impl Reviewer for AbortAfterFirst {
        fn preview(&mut self, _preview: &PatchPreview<'_>) {}

        fn decide(&mut self, _preview: &PatchPreview<'_>) -> Option<Decision> {
            self.decisions += 1;
            self.signal.raise();
            Some(Decision::Apply)
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn test_abort_finishes_current_patch_then_stops() {
        let signal = AbortSignal::new();
        let mut reviewer = AbortAfterFirst {
            signal: signal.clone(),
            decisions: 0,
        };
        let mut buffer = MemoryBuffer::new("a\nb\n");
        let patches = vec![
            PatchSuggestion::delete("a\n", "drop a"),
            PatchSuggestion::delete("b\n", "drop b"),
        ];

        let report = SequentialApplier::new(&mut buffer, &mut reviewer)
            .with_abort(signal)
            .run(&patches)
            .unwrap();

        assert_eq!(reviewer.decisions, 1);
        assert_eq!(buffer.text(), "b\n");
        assert_eq!(report.applied(), 1);
        assert_eq!(report.not_attempted(), 1);
    }

    /// Buffer whose writes always fail, like a read-only file.
    struct ReadOnlyBuffer(String);

    impl TextBuffer for ReadOnlyBuffer {
        fn text(&self) -> &str {
            &self.0
        }

        fn apply_edit(&mut self, _edit: &Edit) -> Result<EditResult, EditError> {
            Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn test_mutation_failure_aborts_batch() {
        let mut buffer = ReadOnlyBuffer("a\nb\n".to_string());
        let patches = vec![
            PatchSuggestion::delete("zzz", "missing"),
            PatchSuggestion::delete("a\n", "drop a"),
            PatchSuggestion::delete("b\n", "drop b"),
        ];
        let mut reviewer = ScriptedReviewer::new([Some(Decision::Apply), Some(Decision::Apply)]);

        let err = apply_sequentially(&mut buffer, &patches, &mut reviewer).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.issue, "drop a");
        assert!(matches!(err.source, EditError::Io(_)));
        assert_eq!(err.completed.len(), 1);
        // The preview was still cleared and the third patch was never shown
        assert_eq!(reviewer.cleared, 1);
        assert_eq!(reviewer.previewed, vec!["DELETE: drop a"]);
    }

    #[test]
    fn test_not_found_reason_recorded() {
        let mut buffer = MemoryBuffer::new("one\n");
        let patches = vec![PatchSuggestion::delete("one", "x").with_occurrence(4)];
        let report =
            apply_sequentially(&mut buffer, &patches, &mut FixedReviewer::apply_all()).unwrap();
        assert_eq!(
            report.outcomes[0].status,
            PatchStatus::NotFound {
                reason: LocateError::NotFound {
                    requested: 4,
                    found: 1
                }
                .to_string()
            }
        );
    }
}
