//! Field paths over the JSON view of a `ScoredRecord`.
//!
//! Canonical paths follow the serialized record (`rawMetrics.views`,
//! `rates.engagementRate`, `components.reach`, `compositeScore`, ...). The
//! translator speaks a flatter vocabulary (`views`, `days`, `score`), so a small
//! alias table maps those onto canonical paths. Single-segment paths that are
//! not record fields fall through to `metadata.<name>`.

use serde_json::Value;
use std::borrow::Cow;

/// Translator-facing names and what they resolve to.
const ALIASES: &[(&str, &str)] = &[
    ("videoId", "id"),
    ("views", "rawMetrics.views"),
    ("likes", "rawMetrics.likes"),
    ("comments", "rawMetrics.comments"),
    ("days", "rawMetrics.ageDays"),
    ("ageDays", "rawMetrics.ageDays"),
    ("duration", "rawMetrics.durationSeconds"),
    ("durationSeconds", "rawMetrics.durationSeconds"),
    ("score", "compositeScore"),
    ("rates.viewsPerMinuteOfContent", "rates.viewsPerMinute"),
];

/// Field documentation handed to the translator: `(path, type, description)`.
pub const KNOWN_FIELDS: &[(&str, &str, &str)] = &[
    ("title", "string", "video title"),
    (
        "days",
        "number",
        "days since upload (0 = today, 1 = yesterday, 365 = one year ago; higher = older)",
    ),
    ("duration", "number", "video length in seconds"),
    ("views", "number", "view count"),
    ("likes", "number", "like count"),
    ("comments", "number", "comment count"),
    ("score", "number", "0-100 overall performance score"),
    ("isShort", "boolean", "true for videos of 60 seconds or less"),
    ("grade", "string", "excellent | very_good | good | fair | low"),
    ("rates.viewsPerDay", "number", "views per day since upload"),
    ("rates.viewsPerMinute", "number", "views per minute of content"),
    (
        "rates.engagementRate",
        "number",
        "likes + 5x comments per 1000 views",
    ),
    ("rates.likeRate", "number", "likes per 1000 views"),
    ("rates.commentRate", "number", "comments per 1000 views"),
    ("components.reach", "number", "0-100 reach sub-score"),
    ("components.engagement", "number", "0-100 engagement sub-score"),
    ("components.consistency", "number", "0-100 consistency sub-score"),
    ("components.community", "number", "0-100 community sub-score"),
];

/// Map an alias (including `scoreComponents.<x>Score` forms) to its canonical path.
pub fn canonical_path(path: &str) -> Cow<'_, str> {
    let path = path.trim();
    if let Some((_, canon)) = ALIASES.iter().find(|(alias, _)| *alias == path) {
        return Cow::Borrowed(*canon);
    }
    for prefix in ["scoreComponents.", "components."] {
        if let Some(rest) = path.strip_prefix(prefix) {
            let name = rest.strip_suffix("Score").unwrap_or(rest);
            let name = if name == "views" { "reach" } else { name };
            return Cow::Owned(format!("components.{name}"));
        }
    }
    Cow::Borrowed(path)
}

/// Walk `path` (dot-delimited) through nested objects.
///
/// Returns `None` ("undefined") when a segment is missing, when an intermediate
/// value is null or not an object, or when the path is empty.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let canon = canonical_path(path);
    if canon.is_empty() {
        return None;
    }
    walk(root, &canon).or_else(|| {
        if canon.contains('.') {
            None
        } else {
            root.get("metadata").and_then(|m| walk(m, &canon))
        }
    })
}

fn walk<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for part in path.split('.') {
        cur = match cur {
            Value::Object(map) => map.get(part)?,
            _ => return None,
        };
    }
    Some(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": "a",
            "title": "Hello",
            "rawMetrics": { "views": 10, "ageDays": 3.0 },
            "rates": { "viewsPerMinute": 2.5 },
            "components": { "reach": 12.5 },
            "compositeScore": 40.1,
            "metadata": { "url": "https://youtu.be/a", "extra": null }
        })
    }

    #[test]
    fn aliases_resolve_to_canonical_fields() {
        let r = record();
        assert_eq!(resolve(&r, "views"), Some(&json!(10)));
        assert_eq!(resolve(&r, "days"), Some(&json!(3.0)));
        assert_eq!(resolve(&r, "score"), Some(&json!(40.1)));
        assert_eq!(resolve(&r, "videoId"), Some(&json!("a")));
        assert_eq!(resolve(&r, "rates.viewsPerMinuteOfContent"), Some(&json!(2.5)));
        assert_eq!(resolve(&r, "scoreComponents.reachScore"), Some(&json!(12.5)));
        assert_eq!(resolve(&r, "components.viewsScore"), Some(&json!(12.5)));
    }

    #[test]
    fn canonical_paths_walk_nested_objects() {
        let r = record();
        assert_eq!(resolve(&r, "rawMetrics.views"), Some(&json!(10)));
        assert_eq!(resolve(&r, "title"), Some(&json!("Hello")));
    }

    #[test]
    fn unknown_or_broken_paths_are_undefined() {
        let r = record();
        assert_eq!(resolve(&r, "nope"), None);
        assert_eq!(resolve(&r, "rates.nope"), None);
        assert_eq!(resolve(&r, "title.length"), None);
        assert_eq!(resolve(&r, "metadata.extra.deeper"), None);
        assert_eq!(resolve(&r, ""), None);
    }

    #[test]
    fn single_segment_falls_back_to_metadata() {
        let r = record();
        assert_eq!(resolve(&r, "url"), Some(&json!("https://youtu.be/a")));
    }
}
