use chrono::{DateTime, Utc};
use scraper_core::{MalformedRecordError, Post, RawPost};
use serde_json::{Map, Value};

/// Turn a raw API record into a [`Post`], stamping it with the current time.
pub fn normalize(raw: &RawPost) -> Result<Post, MalformedRecordError> {
    normalize_at(raw, Utc::now())
}

/// Same as [`normalize`] with an explicit `scraped_at`.
///
/// This is the only place where missing or mistyped fields get their
/// defaults. `matched_keywords` is left empty for the keyword filter to fill.
pub fn normalize_at(raw: &RawPost, scraped_at: DateTime<Utc>) -> Result<Post, MalformedRecordError> {
    let record = raw.0.as_object().ok_or(MalformedRecordError::NotAnObject)?;

    Ok(Post {
        id: post_id(record)?,
        blog_name: text(record, "blog_name").unwrap_or_default(),
        post_url: text(record, "post_url"),
        post_type: text(record, "type"),
        timestamp: timestamp(record),
        date: text(record, "date"),
        title: text(record, "title"),
        body: text(record, "body"),
        caption: text(record, "caption"),
        summary: text(record, "summary"),
        tags: tags(record),
        note_count: note_count(record),
        matched_keywords: Vec::new(),
        scraped_at,
        is_reblog: is_reblog(record),
        reblog_key: text(record, "reblog_key"),
    })
}

fn post_id(record: &Map<String, Value>) -> Result<String, MalformedRecordError> {
    if let Some(id) = ["id", "id_string"]
        .iter()
        .find_map(|field| record.get(*field).and_then(id_value))
    {
        return Ok(id);
    }

    match record.get("id") {
        None | Some(Value::Null) => Err(MalformedRecordError::MissingId),
        Some(other) => Err(MalformedRecordError::InvalidId {
            value: other.to_string(),
        }),
    }
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|id| id.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn text(record: &Map<String, Value>, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn timestamp(record: &Map<String, Value>) -> Option<i64> {
    match record.get("timestamp")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn tags(record: &Map<String, Value>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    if let Some(Value::Array(values)) = record.get("tags") {
        for tag in values.iter().filter_map(Value::as_str) {
            if !tags.iter().any(|seen| seen == tag) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}

fn note_count(record: &Map<String, Value>) -> u64 {
    match record.get("note_count") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn is_reblog(record: &Map<String, Value>) -> bool {
    ["reblogged_from_id", "reblogged_from_name"]
        .iter()
        .any(|field| match record.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        })
}
