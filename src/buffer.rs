//! Text buffer collaborator.
//!
//! The engine reads and mutates documents only through [`TextBuffer`]: the
//! current text, offset/position conversions and one atomic [`Edit`] at a
//! time. Offsets are byte offsets into the UTF-8 text.

use crate::edit::{atomic_write, Edit, EditError, EditResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Zero-based line and byte column inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    /// One-based `line:column`, the way editors print locations.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Half-open byte range `[start, end)` over a specific document snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn from_offset_len(offset: usize, len: usize) -> Self {
        Self::new(offset, offset + len)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A mutable document the applier owns for the duration of a batch.
pub trait TextBuffer {
    /// Current full text.
    fn text(&self) -> &str;

    /// Apply one edit atomically. On error the buffer must be unchanged.
    fn apply_edit(&mut self, edit: &Edit) -> Result<EditResult, EditError>;

    /// Convert a byte offset into a line/column position.
    ///
    /// Offsets past the end clamp to the end of the document.
    fn position_at(&self, offset: usize) -> Position {
        let text = self.text();
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |idx| idx + 1);
        Position::new(line, offset - line_start)
    }

    /// Convert a line/column position into a byte offset.
    ///
    /// Lines past the end clamp to the document length, columns past the end
    /// of a line clamp to that line's end (before its newline). A column
    /// inside a multi-byte character rounds down to that character's start.
    fn offset_at(&self, position: Position) -> usize {
        let text = self.text();
        let mut line_start = 0;
        for _ in 0..position.line {
            match text[line_start..].find('\n') {
                Some(idx) => line_start += idx + 1,
                None => return text.len(),
            }
        }
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |idx| line_start + idx);
        let mut offset = line_start.saturating_add(position.column).min(line_end);
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    /// Slice of the current text covered by `range`, if it is valid.
    fn slice(&self, range: TextRange) -> Option<&str> {
        self.text().get(range.start..range.end)
    }
}

/// In-memory document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    text: String,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl TextBuffer for MemoryBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn apply_edit(&mut self, edit: &Edit) -> Result<EditResult, EditError> {
        edit.apply_to(&mut self.text)
    }
}

/// File-backed document.
///
/// The text is held in memory; every successful edit is persisted with an
/// atomic write before `apply_edit` returns. If the write fails the
/// in-memory text is rolled back so it still matches the file on disk.
#[derive(Debug)]
pub struct FileBuffer {
    path: PathBuf,
    text: String,
}

impl FileBuffer {
    /// Read `path` as UTF-8.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let text = std::str::from_utf8(&bytes)?.to_string();
        Ok(Self { path, text })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextBuffer for FileBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn apply_edit(&mut self, edit: &Edit) -> Result<EditResult, EditError> {
        let mut next = self.text.clone();
        let result = edit.apply_to(&mut next)?;
        if let EditResult::Applied { .. } = result {
            atomic_write(&self.path, next.as_bytes())?;
            self.text = next;
        }
        Ok(result)
    }
}
