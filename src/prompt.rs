//! Instruction text for the external patch suggester.
//!
//! The suggester itself is not part of this crate. This renders the prompt
//! that asks it for anchor patches in the shape [`crate::suggest`] parses.

const TRACE_PLACEHOLDER: &str = "(no stack trace provided)";

/// Inputs to [`build_prompt`].
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    /// Language name used in the fence tag and wording, e.g. `python`
    pub language: &'a str,
    /// Current document text, verbatim
    pub source: &'a str,
    /// Optional stack trace or error output
    pub trace: Option<&'a str>,
}

const PATCH_TYPE: &str = r#"type PatchSuggestion = {
  "kind": "replace" | "insert_after" | "insert_before" | "delete",
  "issue": string,
  // For "replace" or "delete": exact "target" snippet from the CURRENT file.
  "target"?: string,
  // For "insert_after" or "insert_before": exact "anchor" snippet from the CURRENT file.
  "anchor"?: string,
  // For "replace": "replacement" code; For "insert_*": "insertion" code.
  "replacement"?: string,
  "insertion"?: string,
  // If the target/anchor appears multiple times, select with 0-based index. Defaults to 0.
  "occurrence_index"?: number
}[]"#;

pub fn build_prompt(request: &PromptRequest<'_>) -> String {
    let lines: Vec<&str> = request.source.split('\n').collect();
    // Serializing a Vec<&str> cannot fail
    let lines_json = serde_json::to_string(&lines).unwrap_or_default();
    let trace = request
        .trace
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(TRACE_PLACEHOLDER);
    let language = request.language;
    let title = capitalize(language);

    format!(
        r#"You are a {title} debugging expert.
Given the {title} source and its stack trace, produce a list of ANCHOR-BASED patches that do not depend on line numbers.
Return ONLY valid JSON matching this exact TypeScript type (no markdown, no commentary):

{PATCH_TYPE}

Rules:
- Snippets in "target" or "anchor" MUST be copied exactly from the current file, including indentation and blank lines.
- Keep snippets as small as possible while uniquely identifying the location (e.g., one or a few lines), or disambiguate with "occurrence_index".
- Do NOT rely on or mention line numbers anywhere.
- Ensure indentation is correct in "replacement"/"insertion".
- Return JSON ONLY.

{title} source (verbatim):
```{language}
{source}
```

{title} source as array of lines (for precise blanks):
{lines_json}

Stack Trace:
```
{trace}
```"#,
        source = request.source,
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_source_and_lines() {
        let prompt = build_prompt(&PromptRequest {
            language: "python",
            source: "x = 1\n\ny = x / 0",
            trace: Some("ZeroDivisionError: division by zero"),
        });

        assert!(prompt.starts_with("You are a Python debugging expert."));
        assert!(prompt.contains("```python\nx = 1\n\ny = x / 0\n```"));
        assert!(prompt.contains(r#"["x = 1","","y = x / 0"]"#));
        assert!(prompt.contains("ZeroDivisionError: division by zero"));
        assert!(prompt.contains("\"occurrence_index\"?: number"));
        assert!(prompt.contains("Do NOT rely on or mention line numbers"));
    }

    #[test]
    fn test_prompt_without_trace() {
        let prompt = build_prompt(&PromptRequest {
            language: "rust",
            source: "fn main() {}",
            trace: Some("   "),
        });
        assert!(prompt.contains(TRACE_PLACEHOLDER));
        assert!(prompt.contains("```rust\n"));
    }
}
