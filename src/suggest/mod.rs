//! Suggester response ingestion: sanitize, validate, legacy conversion.

pub mod legacy;
pub mod loader;
pub mod sanitize;
pub mod schema;
pub mod validator;

pub use legacy::{convert_legacy_to_patches, parse_legacy_fixes};
pub use loader::{parse_response, ParseOptions, ParsedSuggestions, SuggestionFormat};
pub use sanitize::sanitize_json;
pub use schema::{LegacyFixSuggestion, LegacyOperation, PatchKind, PatchOp, PatchSuggestion};
pub use validator::{parse_patch_suggestions, validate_element};
