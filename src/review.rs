//! Preview and accept/skip decision collaborators.
//!
//! The applier never talks to a UI directly. It hands each located patch to a
//! [`Reviewer`], which shows a preview, returns a decision and clears the
//! preview again. Hosts plug in their own implementation; this module ships a
//! scripted one for tests, fixed-decision ones for batch runs, and a terminal
//! one for the CLI.

use crate::applicator::AbortSignal;
use crate::buffer::{Position, TextRange};
use crate::executor::build_edit;
use crate::locator::{closest_line, LocateError, LocatedPatch};
use crate::suggest::{PatchKind, PatchSuggestion};
use colored::Colorize;
use serde::Deserialize;
use similar::{ChangeTag, TextDiff};
use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, Write};

/// Outcome of the accept/skip prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Apply,
    Skip,
}

/// Everything a reviewer needs to render one located patch.
#[derive(Debug, Clone)]
pub struct PatchPreview<'a> {
    /// Zero-based position of the patch in the batch
    pub index: usize,
    pub total: usize,
    pub patch: &'a PatchSuggestion,
    pub located: LocatedPatch,
    /// Start and end of the matched span
    pub start: Position,
    pub end: Position,
    /// Document text the patch was located in
    pub document: &'a str,
}

impl<'a> PatchPreview<'a> {
    pub fn label(&self) -> String {
        self.patch.label()
    }

    pub fn matched_range(&self) -> TextRange {
        self.located.matched()
    }

    /// Text the patch removes (replace, delete).
    pub fn removed(&self) -> Option<&'a str> {
        match self.located {
            LocatedPatch::Target { range } => self.document.get(range.start..range.end),
            LocatedPatch::Anchor { .. } => None,
        }
    }

    /// Anchor text the insertion is positioned against (insert kinds).
    pub fn anchor(&self) -> Option<&'a str> {
        match self.located {
            LocatedPatch::Anchor { anchor_range } => {
                self.document.get(anchor_range.start..anchor_range.end)
            }
            LocatedPatch::Target { .. } => None,
        }
    }

    /// Text the patch adds (replace, insert kinds).
    pub fn added(&self) -> Option<&'a str> {
        self.patch.added_text()
    }

    /// The whole document as it would read after applying this patch.
    pub fn proposed_document(&self) -> Option<String> {
        let edit = build_edit(&self.located, self.patch).ok()?;
        edit.preview(self.document).ok()
    }
}

/// Preview renderer plus decision prompt.
///
/// Calls for one patch always come in the order `preview`, `decide`,
/// `clear`, and never overlap with another patch.
pub trait Reviewer {
    /// Show the patch. Returns once it is displayed.
    fn preview(&mut self, preview: &PatchPreview<'_>);

    /// Ask whether to apply. `None` means no decision and is treated as skip.
    fn decide(&mut self, preview: &PatchPreview<'_>) -> Option<Decision>;

    /// Remove whatever `preview` displayed.
    fn clear(&mut self);

    /// A patch could not be located in the current text.
    fn not_found(&mut self, _patch: &PatchSuggestion, _document: &str, _error: &LocateError) {}
}

/// Review policy selectable from configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewMode {
    #[default]
    Interactive,
    ApplyAll,
    SkipAll,
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewMode::Interactive => write!(f, "interactive"),
            ReviewMode::ApplyAll => write!(f, "apply-all"),
            ReviewMode::SkipAll => write!(f, "skip-all"),
        }
    }
}

/// Gives the same decision for every patch without displaying anything.
#[derive(Debug, Clone, Copy)]
pub struct FixedReviewer {
    decision: Decision,
}

impl FixedReviewer {
    pub fn apply_all() -> Self {
        Self {
            decision: Decision::Apply,
        }
    }

    pub fn skip_all() -> Self {
        Self {
            decision: Decision::Skip,
        }
    }
}

impl Reviewer for FixedReviewer {
    fn preview(&mut self, _preview: &PatchPreview<'_>) {}

    fn decide(&mut self, _preview: &PatchPreview<'_>) -> Option<Decision> {
        Some(self.decision)
    }

    fn clear(&mut self) {}
}

/// Replays a fixed list of decisions and records what it was shown.
///
/// Once the script runs out every further patch gets no decision.
#[derive(Debug, Default)]
pub struct ScriptedReviewer {
    script: VecDeque<Option<Decision>>,
    /// Labels of every previewed patch, in order
    pub previewed: Vec<String>,
    /// Issues of every patch reported as not found, in order
    pub not_found: Vec<String>,
    /// Number of `clear` calls
    pub cleared: usize,
    /// `previewed.len() - cleared` never exceeded this
    pub max_open_previews: usize,
}

impl ScriptedReviewer {
    pub fn new(script: impl IntoIterator<Item = Option<Decision>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Reviewer for ScriptedReviewer {
    fn preview(&mut self, preview: &PatchPreview<'_>) {
        self.previewed.push(preview.label());
        self.max_open_previews = self
            .max_open_previews
            .max(self.previewed.len() - self.cleared);
    }

    fn decide(&mut self, _preview: &PatchPreview<'_>) -> Option<Decision> {
        self.script.pop_front().flatten()
    }

    fn clear(&mut self) {
        self.cleared += 1;
    }

    fn not_found(&mut self, patch: &PatchSuggestion, _document: &str, _error: &LocateError) {
        self.not_found.push(patch.issue.clone());
    }
}

/// Interactive reviewer for a terminal: prints a coloured diff of the
/// proposed change and reads `a`/`s`/`q` answers.
///
/// `q` skips the current patch and raises the abort signal so the batch
/// stops before the next one. End of input counts as no decision.
pub struct TerminalReviewer<R, W> {
    input: R,
    output: W,
    context_lines: usize,
    abort: AbortSignal,
}

impl<R: BufRead, W: Write> TerminalReviewer<R, W> {
    pub fn new(input: R, output: W, context_lines: usize, abort: AbortSignal) -> Self {
        Self {
            input,
            output,
            context_lines,
            abort,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn emit(&mut self, text: impl fmt::Display) {
        if let Err(err) = writeln!(self.output, "{text}") {
            tracing::debug!(error = %err, "failed to write review output");
        }
    }

    fn render_diff(&mut self, original: &str, proposed: &str) {
        let diff = TextDiff::from_lines(original, proposed);
        let mut rendered = String::new();
        for (idx, group) in diff.grouped_ops(self.context_lines).iter().enumerate() {
            if idx > 0 {
                rendered.push_str(&format!("{}\n", "...".dimmed()));
            }
            for op in group {
                for change in diff.iter_changes(op) {
                    let line = match change.tag() {
                        ChangeTag::Delete => format!("-{}", change).red(),
                        ChangeTag::Insert => format!("+{}", change).green(),
                        ChangeTag::Equal => format!(" {}", change).normal(),
                    };
                    rendered.push_str(&line.to_string());
                    if change.missing_newline() {
                        rendered.push('\n');
                    }
                }
            }
        }
        self.emit(rendered.trim_end_matches('\n'));
    }
}

impl<R: BufRead, W: Write> Reviewer for TerminalReviewer<R, W> {
    fn preview(&mut self, preview: &PatchPreview<'_>) {
        self.emit(format!(
            "\n[{}/{}] {}",
            preview.index + 1,
            preview.total,
            preview.label().bold()
        ));

        let location = match preview.patch.kind() {
            PatchKind::Replace | PatchKind::Delete => "target",
            PatchKind::InsertAfter | PatchKind::InsertBefore => "anchor",
        };
        self.emit(
            format!("  {location} at {}-{}", preview.start, preview.end)
                .dimmed()
                .to_string(),
        );

        match preview.proposed_document() {
            Some(proposed) => self.render_diff(preview.document, &proposed),
            None => self.emit("  (no preview available)".yellow()),
        }
    }

    fn decide(&mut self, _preview: &PatchPreview<'_>) -> Option<Decision> {
        loop {
            if let Err(err) = write!(self.output, "  [a] Apply Fix  [s] Skip  [q] Skip and stop: ")
                .and_then(|()| self.output.flush())
            {
                tracing::debug!(error = %err, "failed to write review prompt");
            }

            let mut answer = String::new();
            match self.input.read_line(&mut answer) {
                Ok(0) | Err(_) => {
                    self.emit("");
                    return None;
                }
                Ok(_) => {}
            }

            match answer.trim().to_ascii_lowercase().as_str() {
                "a" | "apply" | "y" | "yes" => return Some(Decision::Apply),
                "s" | "skip" | "n" | "no" => return Some(Decision::Skip),
                "q" | "quit" => {
                    self.abort.raise();
                    return Some(Decision::Skip);
                }
                other => self.emit(format!("  unrecognised answer {other:?}").yellow()),
            }
        }
    }

    fn clear(&mut self) {
        self.emit("─".repeat(40).dimmed());
    }

    fn not_found(&mut self, patch: &PatchSuggestion, document: &str, error: &LocateError) {
        self.emit(format!(
            "{} Could not locate patch in document: {} ({error})",
            "⚠".yellow(),
            patch.issue
        ));
        if let Some((line, text, score)) = closest_line(document, patch.snippet()) {
            self.emit(
                format!(
                    "  closest line {}: {:?} (similarity {:.2})",
                    line + 1,
                    text,
                    score
                )
                .dimmed()
                .to_string(),
            );
        }
    }
}
