use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The four anchor patch kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchKind {
    Replace,
    InsertAfter,
    InsertBefore,
    Delete,
}

impl PatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchKind::Replace => "replace",
            PatchKind::InsertAfter => "insert_after",
            PatchKind::InsertBefore => "insert_before",
            PatchKind::Delete => "delete",
        }
    }

    /// Upper-case prefix used in review labels.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            PatchKind::Replace => "REPLACE",
            PatchKind::InsertAfter => "INSERT AFTER",
            PatchKind::InsertBefore => "INSERT BEFORE",
            PatchKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a patch.
///
/// Replace and delete address a `target`; the insert kinds address an
/// `anchor`. Only the field that belongs to the kind exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchOp {
    Replace { target: String, replacement: String },
    InsertAfter { anchor: String, insertion: String },
    InsertBefore { anchor: String, insertion: String },
    Delete { target: String },
}

/// One proposed edit, addressed by exact text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSuggestion {
    #[serde(flatten)]
    pub op: PatchOp,
    pub issue: String,
    /// Which occurrence of the target/anchor to use, counted when the patch is located.
    ///
    /// Negative values select nothing, so such a patch never resolves.
    #[serde(default, deserialize_with = "lenient_index")]
    pub occurrence_index: i64,
}

impl PatchSuggestion {
    pub fn new(op: PatchOp, issue: impl Into<String>) -> Self {
        Self {
            op,
            issue: issue.into(),
            occurrence_index: 0,
        }
    }

    pub fn with_occurrence(mut self, occurrence_index: i64) -> Self {
        self.occurrence_index = occurrence_index;
        self
    }

    pub fn replace(
        target: impl Into<String>,
        replacement: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self::new(
            PatchOp::Replace {
                target: target.into(),
                replacement: replacement.into(),
            },
            issue,
        )
    }

    pub fn delete(target: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::new(
            PatchOp::Delete {
                target: target.into(),
            },
            issue,
        )
    }

    pub fn insert_after(
        anchor: impl Into<String>,
        insertion: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self::new(
            PatchOp::InsertAfter {
                anchor: anchor.into(),
                insertion: insertion.into(),
            },
            issue,
        )
    }

    pub fn insert_before(
        anchor: impl Into<String>,
        insertion: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self::new(
            PatchOp::InsertBefore {
                anchor: anchor.into(),
                insertion: insertion.into(),
            },
            issue,
        )
    }

    pub fn kind(&self) -> PatchKind {
        match self.op {
            PatchOp::Replace { .. } => PatchKind::Replace,
            PatchOp::InsertAfter { .. } => PatchKind::InsertAfter,
            PatchOp::InsertBefore { .. } => PatchKind::InsertBefore,
            PatchOp::Delete { .. } => PatchKind::Delete,
        }
    }

    /// The snippet the locator searches for: `target` or `anchor`.
    pub fn snippet(&self) -> &str {
        match &self.op {
            PatchOp::Replace { target, .. } | PatchOp::Delete { target } => target,
            PatchOp::InsertAfter { anchor, .. } | PatchOp::InsertBefore { anchor, .. } => anchor,
        }
    }

    /// Text this patch adds to the document, without the trailing newline
    /// the executor appends.
    pub fn added_text(&self) -> Option<&str> {
        match &self.op {
            PatchOp::Replace { replacement, .. } => Some(replacement),
            PatchOp::InsertAfter { insertion, .. } | PatchOp::InsertBefore { insertion, .. } => {
                Some(insertion)
            }
            PatchOp::Delete { .. } => None,
        }
    }

    /// `REPLACE: <issue>`, `INSERT AFTER: <issue>`, and so on.
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind().label_prefix(), self.issue)
    }

    /// Required-field rules beyond what deserialization enforces:
    /// non-empty `issue` and a non-empty target/anchor.
    pub fn is_well_formed(&self) -> bool {
        !self.issue.is_empty() && !self.snippet().is_empty()
    }
}

/// Accept any JSON value for `occurrence_index`.
///
/// Missing or `null` means the first occurrence. Numbers (and numeric
/// strings or booleans) round down, so `1.0` and `1.5` both select the
/// second occurrence. Negative or non-numeric values become `-1`, which
/// matches nothing.
fn lenient_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_i64() {
        return Ok(n.max(-1));
    }
    let number = match &value {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    };
    if number.is_nan() || number < 0.0 {
        return Ok(-1);
    }
    // Float to int casts saturate
    Ok(number.floor() as i64)
}

/// Line-number-addressed suggestion shape, converted on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFixSuggestion {
    /// One-based first line
    pub start_line: i64,
    /// One-based last line (inclusive); defaults to `start_line`
    #[serde(default)]
    pub end_line: Option<i64>,
    pub issue: String,
    pub operation: LegacyOperation,
    #[serde(default)]
    pub suggested_fix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyOperation {
    Replace,
    Insert,
    Delete,
    Append,
}
