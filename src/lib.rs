//! Anchor Patcher: apply machine-suggested edits without line numbers
//!
//! Suggested edits describe *what* text to change, not *where* it is. Each
//! patch names an exact snippet (a `target` to replace or delete, or an
//! `anchor` to insert next to) and is resolved against the document as it
//! reads at the moment the patch is reached.
//!
//! # Architecture
//!
//! - [`suggest`] turns a raw suggester response into an ordered list of
//!   [`PatchSuggestion`]s, converting the older line-number format on the way.
//! - [`locator`] finds the n-th exact occurrence of a snippet.
//! - [`executor`] compiles a located patch into one [`Edit`], a verified
//!   byte-span replacement.
//! - [`applicator`] walks the list in order: locate, preview, decide, apply
//!   or skip, then re-read the document for the next patch.
//! - [`review`] and [`buffer`] are the seams to the host: the preview/decision
//!   UI and the mutable document.
//!
//! # Example
//!
//! ```
//! use anchor_patcher::{apply_sequentially, parse_response, FixedReviewer, MemoryBuffer, ParseOptions, TextBuffer};
//!
//! let mut doc = MemoryBuffer::new("def div(a, b):\n    return a / b\n");
//! let raw = r#"Here is the fix:
//! [{"kind": "replace", "issue": "fix div", "target": "    return a / b\n",
//!   "replacement": "    return a / b if b else None"}]"#;
//!
//! let parsed = parse_response(raw, doc.text(), ParseOptions::default());
//! let report = apply_sequentially(&mut doc, &parsed.patches, &mut FixedReviewer::apply_all()).unwrap();
//!
//! assert_eq!(report.applied(), 1);
//! assert_eq!(doc.text(), "def div(a, b):\n    return a / b if b else None\n");
//! ```

pub mod applicator;
pub mod buffer;
pub mod config;
pub mod edit;
pub mod executor;
pub mod locator;
pub mod prompt;
pub mod review;
pub mod suggest;

// Re-exports
pub use applicator::{
    apply_sequentially, AbortSignal, ApplyError, ApplyReport, PatchOutcome, PatchStatus,
    SequentialApplier,
};
pub use buffer::{FileBuffer, MemoryBuffer, Position, TextBuffer, TextRange};
pub use config::{ConfigError, EngineConfig};
pub use edit::{Edit, EditError, EditResult, EditVerification};
pub use executor::{build_edit, execute, ExecuteError};
pub use locator::{locate, nth_index_of, LocateError, LocatedPatch};
pub use prompt::{build_prompt, PromptRequest};
pub use review::{
    Decision, FixedReviewer, PatchPreview, ReviewMode, Reviewer, ScriptedReviewer,
    TerminalReviewer,
};
pub use suggest::{
    parse_response, LegacyFixSuggestion, LegacyOperation, ParseOptions, ParsedSuggestions,
    PatchKind, PatchOp, PatchSuggestion, SuggestionFormat,
};
