//! Pull the first JSON object out of free text (LLM replies wrap JSON in prose
//! or markdown fences).

use serde_json::Value;

use super::QueryError;

/// Byte ranges of top-level `{...}` spans, braces balanced and string-aware.
pub fn object_spans(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }
    spans
}

/// First JSON object embedded in `text`.
///
/// Balanced top-level spans are tried first. If none parses (a stray `{` in the
/// prose can swallow the real object), every `{` offset is tried in turn and
/// the first value that parses as an object wins. Nothing found ->
/// `QueryError::Extraction`; grammar checks are left to `validate`.
pub fn extract_json_object(text: &str) -> Result<Value, QueryError> {
    for (start, end) in object_spans(text) {
        if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(&text[start..end]) {
            return Ok(v);
        }
    }

    text.match_indices('{')
        .find_map(|(i, _)| {
            match serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
            {
                Some(Ok(v @ Value::Object(_))) => Some(v),
                _ => None,
            }
        })
        .ok_or(QueryError::Extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let text = r#"Sure! {"sort": {"field": "views", "order": "desc"}} Hope that helps."#;
        let v = extract_json_object(text).unwrap();
        assert_eq!(v, json!({"sort": {"field": "views", "order": "desc"}}));
    }

    #[test]
    fn extracts_from_markdown_fence() {
        let text = "```json\n{\"limit\": 3}\n```";
        assert_eq!(extract_json_object(text).unwrap(), json!({"limit": 3}));
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_span() {
        let text = r#"{"explanation": "closing } brace and \"quoted {\"", "limit": 1} trailing }"#;
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["limit"], 1);
    }

    #[test]
    fn skips_non_json_braces_before_the_object() {
        let text = r#"Use {field} syntax. {"limit": 2}"#;
        assert_eq!(extract_json_object(text).unwrap(), json!({"limit": 2}));
    }

    #[test]
    fn no_braces_is_extraction_error() {
        assert_eq!(
            extract_json_object("I could not answer that."),
            Err(QueryError::Extraction)
        );
        assert_eq!(extract_json_object(""), Err(QueryError::Extraction));
        // unbalanced opener never closes
        assert_eq!(extract_json_object("{ \"limit\": 1"), Err(QueryError::Extraction));
    }

    #[test]
    fn only_broken_json_is_extraction_error() {
        assert_eq!(
            extract_json_object("here: {not json}"),
            Err(QueryError::Extraction)
        );
        assert_eq!(
            extract_json_object("here you go: {sort: views}"),
            Err(QueryError::Extraction)
        );
    }

    #[test]
    fn unclosed_brace_in_prose_does_not_hide_the_object() {
        let text = r#"Use the { key, then: {"limit": 1}"#;
        assert_eq!(extract_json_object(text).unwrap(), json!({"limit": 1}));
        let text = "Filters go in { ... like so:\n```json\n{\"sort\": {\"field\": \"views\", \"order\": \"asc\"}}\n```";
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["sort"]["order"], "asc");
    }
}
