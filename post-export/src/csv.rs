use chrono::SecondsFormat;
use scraper_core::Post;

pub const HEADER: [&str; 16] = [
    "id",
    "blog_name",
    "post_url",
    "type",
    "timestamp",
    "date",
    "title",
    "body",
    "caption",
    "summary",
    "tags",
    "note_count",
    "matched_keywords",
    "scraped_at",
    "is_reblog",
    "reblog_key",
];

/// Separator for list-valued columns.
pub const LIST_SEPARATOR: &str = ", ";

pub fn render_csv(posts: &[Post]) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));
    for post in posts {
        push_row(&mut out, row(post));
    }
    out.into_bytes()
}

fn row(post: &Post) -> [String; 16] {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        post.id.clone(),
        post.blog_name.clone(),
        opt(&post.post_url),
        opt(&post.post_type),
        post.timestamp.map(|t| t.to_string()).unwrap_or_default(),
        opt(&post.date),
        opt(&post.title),
        opt(&post.body),
        opt(&post.caption),
        opt(&post.summary),
        post.tags.join(LIST_SEPARATOR),
        post.note_count.to_string(),
        post.matched_keywords.join(LIST_SEPARATOR),
        post.scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        post.is_reblog.to_string(),
        opt(&post.reblog_key),
    ]
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it holds a comma, quote or line break, doubling inner quotes.
pub fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape(""), "");
        assert_eq!(escape("a, b"), "\"a, b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
    }
}
