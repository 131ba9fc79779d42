//! Backend-response parsing with a truncation-repair pass.
//!
//! Generative backends return free-form text that is *supposed* to be one
//! JSON object. In practice responses arrive wrapped in markdown fences,
//! prefixed with prose, or truncated mid-field when the completion budget
//! runs out. Parsing proceeds in escalating steps:
//!
//! 1. strip code fences and anything outside the outermost `{...}` span
//! 2. direct parse
//! 3. [`repair`] — drop the trailing incomplete token and close every
//!    unbalanced bracket — then reparse
//!
//! If repair also fails the conversion fails. This is deliberate and
//! final: a response mangled beyond repair must never become a silently
//! degraded blog post.
//!
//! `repair` is a pure `&str -> String` function, independently testable
//! from the parse step and from any backend.

use crate::error::Paper2BlogError;
use crate::model::BlogSection;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// Title used when the model omits one.
const FALLBACK_TITLE: &str = "Untitled Blog Post";

/// The JSON contract the conversion prompt requests.
///
/// Every field is optional at the wire level and defaulted after parsing;
/// the model not following instructions is an expected condition, not an
/// error, as long as the JSON itself is sound.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub sections: Option<Vec<BlogSection>>,
}

impl BlogResponse {
    /// Defaulted accessor: `title ?? "Untitled Blog Post"`.
    pub fn title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(FALLBACK_TITLE)
            .to_string()
    }

    /// Defaulted accessor: `summary ?? ""`.
    pub fn summary(&self) -> String {
        self.summary.clone().unwrap_or_default()
    }

    /// Defaulted accessor: `tags ?? []`.
    pub fn tags(&self) -> Vec<String> {
        self.tags.clone().unwrap_or_default()
    }

    /// Defaulted accessor: `sections ?? []`.
    pub fn sections(&self) -> Vec<BlogSection> {
        self.sections.clone().unwrap_or_default()
    }
}

/// Parse a raw backend response into a [`BlogResponse`], repairing
/// truncation if necessary.
pub fn parse_blog_response(raw: &str) -> Result<BlogResponse, Paper2BlogError> {
    let cleaned = strip_code_fences(raw);
    let candidate = outermost_object(cleaned.trim()).ok_or_else(|| Paper2BlogError::AiParse {
        detail: "response contains no JSON object".to_string(),
    })?;

    match serde_json::from_str::<BlogResponse>(candidate) {
        Ok(parsed) => Ok(parsed),
        Err(first_err) => {
            warn!("direct parse failed ({first_err}); attempting repair");
            let repaired = repair(candidate);
            serde_json::from_str::<BlogResponse>(&repaired).map_err(|second_err| {
                Paper2BlogError::AiParse {
                    detail: format!(
                        "parse failed: {first_err}; repair also failed: {second_err}"
                    ),
                }
            })
        }
    }
}

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").expect("fence pattern"));

/// Strip a wrapping markdown code fence, if present.
pub fn strip_code_fences(input: &str) -> String {
    match RE_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

/// Slice out the outermost `{...}` span, discarding prose around it.
///
/// Uses first `{` to last `}`; when the closing brace was truncated away,
/// takes everything from the first `{` so the repair pass can close it.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

/// Repair a truncated JSON document.
///
/// Pure text surgery, no parsing: (1) drop an unterminated trailing string;
/// (2) drop the dangling key or separator it leaves behind; (3) close every
/// bracket still open, innermost first. The result is structurally valid
/// JSON whenever the input is a prefix of valid JSON — semantic loss is
/// limited to the truncated tail, which is exactly the part that was never
/// received anyway.
pub fn repair(text: &str) -> String {
    let mut s = text.trim_end().to_string();

    // Step 1: if the scan ends inside a string literal, cut the partial
    // string off entirely.
    if let ScanState { in_string: true, string_start: Some(start), .. } = scan(&s) {
        s.truncate(start);
    }

    // Step 2: remove dangling separators and orphaned keys so the prefix
    // ends at a well-formed field boundary.
    loop {
        let len = s.trim_end().len();
        s.truncate(len);
        match s.chars().last() {
            Some(',') => {
                s.pop();
            }
            Some(':') => {
                // A key whose value was cut off: remove the colon, the key
                // string, and the comma that preceded it.
                s.pop();
                drop_trailing_string(&mut s);
                let len = s.trim_end().len();
                s.truncate(len);
                if s.ends_with(',') {
                    s.pop();
                }
            }
            _ => break,
        }
    }

    // Step 3: close whatever is still open.
    let state = scan(&s);
    for opener in state.stack.iter().rev() {
        s.push(match opener {
            '{' => '}',
            _ => ']',
        });
    }

    debug!("repaired JSON: {} → {} bytes", text.len(), s.len());
    s
}

/// Remove a trailing `"..."` string literal, if present.
fn drop_trailing_string(s: &mut String) {
    let len = s.trim_end().len();
    s.truncate(len);
    if !s.ends_with('"') {
        return;
    }
    // Walk back to the opening quote, honouring escapes.
    let bytes = s.as_bytes();
    let mut i = bytes.len() - 1;
    while i > 0 {
        i -= 1;
        if bytes[i] == b'"' {
            // Count preceding backslashes; an even count means unescaped.
            let mut backslashes = 0;
            while i > backslashes && bytes[i - 1 - backslashes] == b'\\' {
                backslashes += 1;
            }
            if backslashes % 2 == 0 {
                s.truncate(i);
                return;
            }
        }
    }
    s.clear();
}

/// Bracket/string state after scanning a JSON prefix.
struct ScanState {
    stack: Vec<char>,
    in_string: bool,
    /// Byte index of the opening quote when the scan ends inside a string.
    string_start: Option<usize>,
}

fn scan(text: &str) -> ScanState {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut string_start = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                string_start = None;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                string_start = Some(i);
            }
            '{' | '[' => stack.push(c),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    ScanState {
        stack,
        in_string,
        string_start,
    }
}
