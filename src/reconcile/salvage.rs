//! Text-level repair stages applied to raw model output before it is parsed.
//!
//! Every stage is best-effort: it either returns a transformed candidate or
//! leaves the text alone. None of them can fail.

use serde_json::Value;

use crate::types::lenient::value_kind;

const FENCE: &str = "```";

/// Why a candidate did not parse into a JSON object.
#[derive(Debug, Clone)]
pub(crate) struct ParseFailure {
    pub message: String,
    /// Byte offset of an end-of-input error (unterminated string, unclosed container).
    pub eof_offset: Option<usize>,
}

/// Parse `text` and require a top-level object.
pub(crate) fn parse_object(text: &str) -> Result<Value, ParseFailure> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ParseFailure {
            message: format!("expected a JSON object, found {}", value_kind(&other)),
            eof_offset: None,
        }),
        Err(err) => Err(ParseFailure {
            message: err.to_string(),
            eof_offset: err
                .is_eof()
                .then(|| byte_offset(text, err.line(), err.column())),
        }),
    }
}

// serde_json reports 1-based lines and byte columns.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        text.match_indices('\n')
            .nth(line - 2)
            .map(|(idx, _)| idx + 1)
            .unwrap_or(text.len())
    };
    (line_start + column).min(text.len())
}

/// Strip a leading code fence (with or without a language tag) and the closing fence.
///
/// Always trims surrounding whitespace, so applying it twice changes nothing.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    let rest = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .trim();
    rest.strip_suffix(FENCE).unwrap_or(rest).trim()
}

/// Drop everything after the last `}` when the text does not already end with one.
///
/// Quote-wrapped text is left for the double-encoding stage.
pub fn truncate_after_last_brace(text: &str) -> &str {
    if text.ends_with('}') || is_quote_wrapped(text) {
        return text;
    }
    match text.rfind('}') {
        Some(idx) => &text[..=idx],
        None => text,
    }
}

fn is_quote_wrapped(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

/// Undo one level of JSON string encoding.
///
/// A fully quote-wrapped text is decoded as a JSON string literal. Otherwise, if the
/// text contains escaped quotes, common escapes are reversed textually and the result
/// is kept only when it parses. Returns `None` when neither applies.
pub fn decode_double_encoding(text: &str) -> Option<String> {
    if is_quote_wrapped(text) {
        if let Ok(inner) = serde_json::from_str::<String>(text) {
            return Some(strip_code_fence(&inner).to_string());
        }
    }

    if !text.contains("\\\"") {
        return None;
    }
    let body = if is_quote_wrapped(text) {
        &text[1..text.len() - 1]
    } else {
        text
    };
    let unescaped = unescape_common(body);
    let candidate = strip_code_fence(&unescaped);
    serde_json::from_str::<Value>(candidate)
        .is_ok()
        .then(|| candidate.to_string())
}

fn unescape_common(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let replacement = match chars.peek() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('n') => '\n',
            Some('t') => '\t',
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();
        out.push(replacement);
    }
    out
}

/// Keep only the span from the first `{` to the last `}` when the text has leading prose.
///
/// With no closing brace after the first `{` the span runs to the end of the text,
/// which leaves a truncated object for the repair stage.
pub fn isolate_object(text: &str) -> &str {
    if text.starts_with('{') {
        return text;
    }
    let Some(start) = text.find('{') else {
        return text;
    };
    match text.rfind('}') {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

/// Escape raw control characters inside string literals and drop stray ones outside.
///
/// Carriage return, line feed and tab become `\r`, `\n` and `\t`; any other control
/// character inside a string becomes a `\u00XX` escape. Outside strings only JSON
/// whitespace is kept.
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                ' ' | '\t' | '\n' | '\r' => out.push(c),
                c if c.is_control() => {}
                c => out.push(c),
            }
            continue;
        }

        if escaped {
            escaped = false;
            // A backslash directly followed by a raw control character.
            match c {
                '\n' => out.push('n'),
                '\r' => out.push('r'),
                '\t' => out.push('t'),
                c if (c as u32) < 0x20 => out.push_str(&format!("u{:04x}", c as u32)),
                c => out.push(c),
            }
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

struct CutPoint {
    depth: usize,
    end: usize,
    closers: String,
}

/// Recover a truncated object by cutting back to a complete value and closing what is open.
///
/// Cut points are the ends of complete array elements, tried outermost array first
/// and latest element first, so a half-written day is dropped whole. When no array
/// element is complete, the last complete member of the root object is used. Only
/// cut points before `error_offset` count, and at most `max_attempts` are parsed.
pub fn close_truncated(text: &str, error_offset: usize, max_attempts: usize) -> Option<Value> {
    if !text.starts_with('{') {
        return None;
    }

    let limit = error_offset.min(text.len());
    let mut stack: Vec<char> = Vec::new();
    let mut element_cuts = Vec::new();
    let mut member_cuts = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if idx >= limit {
            break;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => stack.push(c),
            '}' | ']' => {
                stack.pop();
                match stack.last() {
                    Some('[') => element_cuts.push(CutPoint {
                        depth: stack.len(),
                        end: idx + 1,
                        closers: closers_for(&stack),
                    }),
                    Some('{') if stack.len() == 1 => member_cuts.push(CutPoint {
                        depth: 1,
                        end: idx + 1,
                        closers: "}".to_string(),
                    }),
                    _ => {}
                }
            }
            ',' if stack.len() == 1 => member_cuts.push(CutPoint {
                depth: 1,
                end: idx,
                closers: "}".to_string(),
            }),
            _ => {}
        }
    }

    element_cuts.sort_by(|a, b| a.depth.cmp(&b.depth).then(b.end.cmp(&a.end)));
    member_cuts.reverse();

    element_cuts
        .iter()
        .chain(member_cuts.iter())
        .take(max_attempts)
        .find_map(|cut| {
            let mut candidate = String::with_capacity(cut.end + cut.closers.len());
            candidate.push_str(&text[..cut.end]);
            candidate.push_str(&cut.closers);
            parse_object(&candidate).ok()
        })
}

fn closers_for(stack: &[char]) -> String {
    stack
        .iter()
        .rev()
        .map(|open| if *open == '{' { '}' } else { ']' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fence_idempotent() {
        for raw in ["```json\n{\"a\":1}\n```", "{\"a\":1}", "plain words", "```\n[1]\n```"] {
            let once = strip_code_fence(raw);
            assert_eq!(strip_code_fence(once), once);
        }
    }

    #[test]
    fn test_truncate_after_last_brace() {
        assert_eq!(truncate_after_last_brace("{\"a\":1} hope this helps"), "{\"a\":1}");
        assert_eq!(truncate_after_last_brace("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(truncate_after_last_brace("no braces"), "no braces");
        assert_eq!(truncate_after_last_brace("\"{\\\"a\\\":1}\""), "\"{\\\"a\\\":1}\"");
    }

    #[test]
    fn test_decode_quote_wrapped() {
        let encoded = serde_json::to_string("{\"destination\":\"京都\"}").unwrap();
        assert_eq!(
            decode_double_encoding(&encoded).as_deref(),
            Some("{\"destination\":\"京都\"}")
        );
    }

    #[test]
    fn test_decode_escaped_quotes_requires_valid_result() {
        assert_eq!(
            decode_double_encoding(r#"{\"days\":2}"#).as_deref(),
            Some("{\"days\":2}")
        );
        assert_eq!(decode_double_encoding(r#"{\"days\":"#), None);
        assert_eq!(decode_double_encoding("{\"days\":2}"), None);
    }

    #[test]
    fn test_isolate_object() {
        assert_eq!(isolate_object("Sure! {\"a\":{\"b\":1}} Enjoy"), "{\"a\":{\"b\":1}}");
        assert_eq!(isolate_object("Sure! {\"a\":[1,"), "{\"a\":[1,");
        assert_eq!(isolate_object("nothing here"), "nothing here");
    }

    #[test]
    fn test_escape_control_chars_only_inside_strings() {
        let raw = "{\n\t\"tips\": \"line one\nline\ttwo\u{0007}\"\u{0001}}";
        let repaired = escape_control_chars(raw);
        assert_eq!(repaired, "{\n\t\"tips\": \"line one\\nline\\ttwo\\u0007\"}");
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["tips"], "line one\nline\ttwo\u{0007}");
    }

    #[test]
    fn test_escape_keeps_existing_escapes() {
        let raw = r#"{"tips": "say \"hi\"\n"}"#;
        assert_eq!(escape_control_chars(raw), raw);
    }

    #[test]
    fn test_close_truncated_drops_partial_element() {
        let text = r#"{"destination":"东京","itinerary":[{"day":1,"activities":[{"name":"东京塔"}]},{"day":2,"activities":[{"name":"浅草"#;
        let value = close_truncated(text, text.len(), 16).unwrap();
        assert_eq!(
            value,
            json!({
                "destination": "东京",
                "itinerary": [{"day": 1, "activities": [{"name": "东京塔"}]}]
            })
        );
    }

    #[test]
    fn test_close_truncated_falls_back_to_root_members() {
        let text = r#"{"destination":"大阪","days":3,"suggestions":"带好"#;
        let value = close_truncated(text, text.len(), 16).unwrap();
        assert_eq!(value, json!({"destination": "大阪", "days": 3}));
    }

    #[test]
    fn test_close_truncated_respects_offset_and_root() {
        let text = r#"{"itinerary":[{"day":1},{"day":2}"#;
        let value = close_truncated(text, 23, 16).unwrap();
        assert_eq!(value, json!({"itinerary": [{"day": 1}]}));
        assert!(close_truncated("[{\"day\":1},", 11, 16).is_none());
    }

    #[test]
    fn test_parse_object_reports_eof_offset() {
        let text = "{\"a\":\n\"b";
        let failure = parse_object(text).unwrap_err();
        assert!(failure.eof_offset.is_some_and(|offset| offset <= text.len()));
        assert!(parse_object("[1, 2]").unwrap_err().eof_offset.is_none());
    }
}
