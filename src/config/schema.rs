use crate::review::ReviewMode;
use crate::suggest::ParseOptions;
use serde::Deserialize;
use std::fmt;

/// Upper bound for `review.context_lines`.
pub const MAX_CONTEXT_LINES: usize = 1000;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.review.context_lines > MAX_CONTEXT_LINES {
            issues.push(ValidationIssue::OutOfRange {
                field: "review.context_lines",
                value: self.review.context_lines,
                max: MAX_CONTEXT_LINES,
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            legacy_fallback: self.suggestions.legacy_fallback,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SuggestionsConfig {
    /// Accept the line-number format when the anchor format yields nothing
    #[serde(default = "default_true")]
    pub legacy_fallback: bool,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            legacy_fallback: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    #[serde(default)]
    pub mode: ReviewMode,
    /// Unchanged lines shown around each change in the terminal preview
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            mode: ReviewMode::default(),
            context_lines: default_context_lines(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_context_lines() -> usize {
    3
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OutOfRange { field, value, max } => {
                write!(f, "'{field}' is {value}, must be at most {max}")
            }
        }
    }
}
