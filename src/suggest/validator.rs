//! Primary-format parsing and per-element schema checks.

use super::schema::PatchSuggestion;
use serde_json::Value;

/// Parse sanitized text as a JSON array of anchor patches.
///
/// Returns `None` when the text is not JSON or the top-level value is not an
/// array. Elements that fail the per-kind rules are dropped; the result may
/// be empty.
pub fn parse_patch_suggestions(json_text: &str) -> Option<Vec<PatchSuggestion>> {
    let elements = parse_array(json_text)?;
    let total = elements.len();

    let valid: Vec<PatchSuggestion> = elements.into_iter().filter_map(validate_element).collect();

    if valid.len() < total {
        tracing::debug!(
            dropped = total - valid.len(),
            kept = valid.len(),
            "dropped schema-invalid patch suggestions"
        );
    }

    Some(valid)
}

/// Check one candidate element.
///
/// `kind` must be one of the four kinds and `issue` a non-empty string.
/// `replace` needs a non-empty `target` and a string `replacement`; `delete`
/// needs a non-empty `target`; the insert kinds need a non-empty `anchor`
/// and a string `insertion`. Replacement and insertion may be empty.
pub fn validate_element(value: Value) -> Option<PatchSuggestion> {
    let patch: PatchSuggestion = serde_json::from_value(value).ok()?;
    patch.is_well_formed().then_some(patch)
}

/// Top-level JSON array elements, or `None` if `text` is not one.
pub(crate) fn parse_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(elements) => Some(elements),
        _ => None,
    }
}
