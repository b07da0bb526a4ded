//! Locating JSON values inside free-form model output.
//!
//! Models wrap their JSON in prose, markdown fences and the occasional stray
//! bracket. The scanner here tracks nesting depth and treats the content of
//! quoted strings inside a structure as opaque, so `"options": ["a]"]` does not
//! close anything early.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::error::ExtractionError;

/// Kind of JSON structure the scanner can isolate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JsonKind {
    Object,
    Array,
}

impl JsonKind {
    fn from_opener(b: u8) -> Option<Self> {
        match b {
            b'{' => Some(Self::Object),
            b'[' => Some(Self::Array),
            _ => None,
        }
    }

    fn from_closer(b: u8) -> Option<Self> {
        match b {
            b'}' => Some(Self::Object),
            b']' => Some(Self::Array),
            _ => None,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
        }
    }
}

/// Byte coordinates of a balanced structure within a larger text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonSpan {
    pub start: usize,
    /// Inclusive index of the closing bracket/brace.
    pub end: usize,
    pub kind: JsonKind,
    /// 0 for top-level structures.
    pub depth: usize,
}

impl JsonSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

#[derive(Debug)]
struct Frame {
    start: usize,
    kind: JsonKind,
}

#[derive(Debug, Default)]
struct Scan {
    /// Every closed structure, ordered by closing position.
    spans: Vec<JsonSpan>,
    /// Kinds of the frames still open when the text ran out.
    open: Vec<JsonKind>,
}

fn scan(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut out = Scan::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        // Quotes in prose are ordinary characters; strings only exist inside a structure.
        if b == b'"' && !stack.is_empty() {
            in_string = true;
            continue;
        }

        if let Some(kind) = JsonKind::from_opener(b) {
            stack.push(Frame { start: i, kind });
        } else if let Some(kind) = JsonKind::from_closer(b) {
            match stack.pop() {
                Some(frame) if frame.kind == kind => {
                    out.spans.push(JsonSpan { start: frame.start, end: i, kind, depth: stack.len() });
                }
                Some(frame) => {
                    trace!(target: "pasio::json", start = frame.start, at = i, "mismatched closer, abandoning frame");
                }
                None => {}
            }
        }
    }

    out.open = stack.into_iter().map(|f| f.kind).collect();
    out
}

/// Find all top-level JSON object/array structures in the given text, in order of appearance.
#[instrument(target = "pasio::json", skip(text), fields(text_len = text.len()))]
pub fn find_json_structures(text: &str) -> Vec<JsonSpan> {
    let mut roots: Vec<JsonSpan> = scan(text).spans.into_iter().filter(|s| s.depth == 0).collect();
    roots.sort_by_key(|s| s.start);
    debug!(target: "pasio::json", count = roots.len(), "found root structures");
    roots
}

fn is_valid_json(candidate: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(candidate).is_ok()
}

/// Isolate the first top-level JSON value of `kind` embedded in `text`.
///
/// Selection order:
/// - the first top-level structure of `kind` that parses as JSON;
/// - failing that, the first top-level structure of `kind` as-is, so the
///   decoder can report the syntax error;
/// - only when no top-level structure of `kind` exists, the first nested one
///   that parses (a model that wraps the array in `{"questions": [...]}` is
///   still understood).
#[instrument(target = "pasio::json", skip(text), fields(text_len = text.len()))]
pub fn extract_json(text: &str, kind: JsonKind) -> Result<&str, ExtractionError> {
    let scan = scan(text);
    let mut candidates: Vec<JsonSpan> = scan.spans.iter().copied().filter(|s| s.kind == kind).collect();
    candidates.sort_by_key(|s| (s.depth, s.start));

    if let Some(span) = candidates.iter().find(|s| s.depth == 0 && is_valid_json(s.slice(text))) {
        debug!(target: "pasio::json", start = span.start, end = span.end, "extracted top-level structure");
        return Ok(span.slice(text));
    }

    // A broken top-level candidate must reach the decoder; a nested span of the
    // same kind would be a fragment of it (e.g. a question's `options`).
    if let Some(span) = candidates.iter().find(|s| s.depth == 0) {
        debug!(target: "pasio::json", start = span.start, end = span.end, "no valid candidate, returning first for decoding");
        return Ok(span.slice(text));
    }

    if let Some(span) = candidates.iter().find(|s| is_valid_json(s.slice(text))) {
        debug!(target: "pasio::json", start = span.start, end = span.end, depth = span.depth, "extracted nested structure");
        return Ok(span.slice(text));
    }

    if scan.open.contains(&kind) {
        Err(ExtractionError::Unterminated { kind })
    } else {
        Err(ExtractionError::NotFound { kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_content_is_opaque() {
        let text = r#"x [{"q":"is ] a bracket?","o":["[","}"]}] y"#;
        let roots = find_json_structures(text);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].slice(text), r#"[{"q":"is ] a bracket?","o":["[","}"]}]"#);
    }

    #[test]
    fn prose_quotes_do_not_open_strings() {
        let text = r#"He said "here you go: [1, 2, 3]"#;
        assert_eq!(extract_json(text, JsonKind::Array).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn escaped_quote_inside_string() {
        let text = r#"{"a":"say \"}\" now","b":1}"#;
        assert_eq!(extract_json(text, JsonKind::Object).unwrap(), text);
    }

    #[test]
    fn stray_closers_at_top_level_are_ignored() {
        let text = "oops ] } then {\"k\": true}";
        assert_eq!(extract_json(text, JsonKind::Object).unwrap(), "{\"k\": true}");
    }
}
