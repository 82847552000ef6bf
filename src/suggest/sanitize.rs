//! Strips prose and code fences around a suggester response.

use once_cell::sync::Lazy;
use regex::Regex;

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```json\s*").expect("static fence pattern is valid")
});

/// Reduce `raw` to the span from the first `[`/`{` to the last `]`/`}` with
/// code fence markers removed.
///
/// Returns an empty string when there is no opening bracket at all; callers
/// treat that the same as unparseable input. Already-clean JSON comes back
/// unchanged.
pub fn sanitize_json(raw: &str) -> String {
    let unfenced = JSON_FENCE.replace_all(raw, "");
    let unfenced = unfenced.replace("```", "");

    let Some(start) = unfenced.find(['[', '{']) else {
        return String::new();
    };
    let rest = &unfenced[start..];
    let end = rest.rfind([']', '}']).map_or(0, |idx| idx + 1);

    rest[..end].trim().to_string()
}
