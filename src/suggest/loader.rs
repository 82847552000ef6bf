use super::legacy::{convert_legacy_to_patches, parse_legacy_fixes};
use super::sanitize::sanitize_json;
use super::schema::PatchSuggestion;
use super::validator::parse_patch_suggestions;
use std::fmt;

/// Which input shape produced the patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionFormat {
    /// Anchor-based patches
    Anchor,
    /// Line-number suggestions converted to anchor patches
    Legacy,
    /// Nothing usable was found
    None,
}

impl fmt::Display for SuggestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionFormat::Anchor => write!(f, "anchor"),
            SuggestionFormat::Legacy => write!(f, "legacy"),
            SuggestionFormat::None => write!(f, "none"),
        }
    }
}

/// Ordered patch list extracted from one suggester response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSuggestions {
    pub patches: Vec<PatchSuggestion>,
    pub format: SuggestionFormat,
}

impl ParsedSuggestions {
    fn none() -> Self {
        Self {
            patches: Vec::new(),
            format: SuggestionFormat::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Options for [`parse_response`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Try the legacy line-number shape when the anchor parse yields nothing.
    pub legacy_fallback: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            legacy_fallback: true,
        }
    }
}

/// Turn a raw suggester response into an ordered list of anchor patches.
///
/// `original_text` is the document before any patch of this batch is
/// applied; the legacy converter reads line content from it. Malformed input
/// is not an error: it yields an empty result with [`SuggestionFormat::None`].
pub fn parse_response(
    raw: &str,
    original_text: &str,
    options: ParseOptions,
) -> ParsedSuggestions {
    let json_text = sanitize_json(raw);

    if let Some(patches) = parse_patch_suggestions(&json_text) {
        if !patches.is_empty() {
            return ParsedSuggestions {
                patches,
                format: SuggestionFormat::Anchor,
            };
        }
    }

    if !options.legacy_fallback {
        return ParsedSuggestions::none();
    }

    match parse_legacy_fixes(&json_text) {
        Some(fixes) if !fixes.is_empty() => {
            tracing::debug!(count = fixes.len(), "converting legacy line-number suggestions");
            ParsedSuggestions {
                patches: convert_legacy_to_patches(original_text, &fixes),
                format: SuggestionFormat::Legacy,
            }
        }
        _ => ParsedSuggestions::none(),
    }
}
