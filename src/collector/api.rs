use chrono::DateTime;
use serde_json::{Map, Value};

use crate::collector::{errors::SourceError, normalize::RawEntry};

const LIST_KEYS: &[&str] = &["items", "entries", "data", "articles", "results", "hits"];
const URL_KEYS: &[&str] = &["url", "link", "href"];
const TITLE_KEYS: &[&str] = &["title", "name", "headline"];
const SUMMARY_KEYS: &[&str] = &["summary", "description", "snippet", "text", "excerpt"];
const DATE_KEYS: &[&str] = &[
    "published",
    "published_at",
    "date",
    "created_at",
    "updated",
    "updated_at",
    "time",
];

/// Parse a JSON listing: a top-level array, or an object wrapping one under a
/// conventional key.
pub fn parse(body: &str) -> Result<Vec<RawEntry>, SourceError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| SourceError::parse("api", e))?;
    let list = match &doc {
        Value::Array(list) => list,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| SourceError::parse("api", "no entry list found"))?,
        _ => return Err(SourceError::parse("api", "expected array or object")),
    };

    Ok(list
        .iter()
        .filter_map(Value::as_object)
        .map(to_raw)
        .collect())
}

fn to_raw(obj: &Map<String, Value>) -> RawEntry {
    let mut dates = Vec::new();
    let mut date_text = Vec::new();
    for key in DATE_KEYS {
        match obj.get(*key) {
            Some(Value::String(s)) => date_text.push(s.clone()),
            // Integer dates are unix seconds
            Some(Value::Number(n)) => {
                if let Some(dt) = n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)) {
                    dates.push(dt);
                }
            }
            _ => {}
        }
    }

    RawEntry {
        title: first_string(obj, TITLE_KEYS),
        url: first_string(obj, URL_KEYS),
        summary: first_string(obj, SUMMARY_KEYS),
        dates,
        date_text,
    }
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
