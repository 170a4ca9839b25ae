use scraper_core::{FilterCriteria, Post};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterResult {
    pub matched: bool,
    /// Keywords that hit, in the order the criteria list them.
    pub matched_keywords: Vec<String>,
}

impl FilterResult {
    fn rejected() -> Self {
        Self::default()
    }
}

/// Title, body, caption, summary and tags joined by single spaces. Absent
/// fields contribute an empty string.
pub fn searchable_text(post: &Post) -> String {
    let fields = [&post.title, &post.body, &post.caption, &post.summary];
    let mut parts: Vec<&str> = fields
        .iter()
        .map(|field| field.as_deref().unwrap_or(""))
        .collect();
    let tags = post.tags.join(" ");
    parts.push(&tags);
    parts.join(" ")
}

pub fn matches(post: &Post, criteria: &FilterCriteria) -> FilterResult {
    if criteria.exclude_reblogs && post.is_reblog {
        return FilterResult::rejected();
    }
    if post.note_count < criteria.min_notes {
        return FilterResult::rejected();
    }
    if criteria.keywords.is_empty() {
        return FilterResult {
            matched: true,
            matched_keywords: Vec::new(),
        };
    }

    let text = searchable_text(post);
    if text.trim().is_empty() {
        return FilterResult::rejected();
    }
    let text = if criteria.case_sensitive {
        text
    } else {
        text.to_lowercase()
    };

    let matched_keywords: Vec<String> = criteria
        .keywords
        .iter()
        .filter(|keyword| {
            let needle = if criteria.case_sensitive {
                keyword.to_string()
            } else {
                keyword.to_lowercase()
            };
            if criteria.exact_match {
                contains_token(&text, &needle)
            } else {
                text.contains(needle.as_str())
            }
        })
        .cloned()
        .collect();

    FilterResult {
        matched: !matched_keywords.is_empty(),
        matched_keywords,
    }
}

/// Whether `needle` occurs in `haystack` with a non-alphanumeric character or
/// a string edge on both sides.
fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        let start = from + found;
        let end = start + needle.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }

        // Step one char forward so overlapping occurrences are still tried.
        from = start
            + haystack[start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_with(title: Option<&str>, body: Option<&str>, tags: &[&str]) -> Post {
        Post {
            id: "1".to_string(),
            blog_name: "staff".to_string(),
            post_url: None,
            post_type: Some("text".to_string()),
            timestamp: None,
            date: None,
            title: title.map(str::to_string),
            body: body.map(str::to_string),
            caption: None,
            summary: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            note_count: 10,
            matched_keywords: vec![],
            scraped_at: Utc::now(),
            is_reblog: false,
            reblog_key: None,
        }
    }

    #[test]
    fn test_searchable_text_joins_fields_and_tags() {
        let mut post = post_with(Some("Title"), None, &["one", "two"]);
        post.summary = Some("sum".to_string());
        assert_eq!(searchable_text(&post), "Title   sum one two");
    }

    #[test]
    fn test_case_sensitivity() {
        let post = post_with(Some("my cat sleeps"), None, &[]);

        let insensitive = FilterCriteria::new(["Cat"]);
        let result = matches(&post, &insensitive);
        assert!(result.matched);
        assert_eq!(result.matched_keywords, vec!["Cat"]);

        let sensitive = FilterCriteria::new(["Cat"]).case_sensitive(true);
        assert!(!matches(&post, &sensitive).matched);
    }

    #[test]
    fn test_exact_match_boundary() {
        let post = post_with(None, Some("category theory"), &[]);

        assert!(matches(&post, &FilterCriteria::new(["cat"])).matched);
        assert!(!matches(&post, &FilterCriteria::new(["cat"]).exact_match(true)).matched);

        let post = post_with(None, Some("a (cat)!"), &[]);
        assert!(matches(&post, &FilterCriteria::new(["cat"]).exact_match(true)).matched);
    }

    #[test]
    fn test_exact_match_finds_later_occurrence() {
        let post = post_with(None, Some("catcat cat"), &[]);
        assert!(matches(&post, &FilterCriteria::new(["cat"]).exact_match(true)).matched);

        let post = post_with(None, Some("concatenate"), &[]);
        assert!(!matches(&post, &FilterCriteria::new(["cat"]).exact_match(true)).matched);
    }

    #[test]
    fn test_exact_match_at_string_edges_and_tags() {
        let post = post_with(Some("cat"), None, &["dog"]);
        let criteria = FilterCriteria::new(["cat", "dog"]).exact_match(true);
        let result = matches(&post, &criteria);
        assert_eq!(result.matched_keywords, vec!["cat", "dog"]);
    }

    #[test]
    fn test_matched_keywords_follow_criteria_order() {
        let post = post_with(Some("zebra then apple"), None, &[]);
        let criteria = FilterCriteria::new(["apple", "mango", "zebra"]);

        let result = matches(&post, &criteria);
        assert!(result.matched);
        assert_eq!(result.matched_keywords, vec!["apple", "zebra"]);
    }

    #[test]
    fn test_repeated_keyword_reported_once() {
        let post = post_with(Some("cat"), None, &[]);
        let result = matches(&post, &FilterCriteria::new(["cat", " cat", "cat"]));
        assert_eq!(result.matched_keywords, vec!["cat"]);
    }

    #[test]
    fn test_min_notes_boundary() {
        let mut post = post_with(Some("art"), None, &[]);
        let criteria = FilterCriteria::new(["art"]).min_notes(10);

        post.note_count = 10;
        assert!(matches(&post, &criteria).matched);

        post.note_count = 9;
        assert!(!matches(&post, &criteria).matched);
    }

    #[test]
    fn test_exclude_reblogs_ignores_keywords() {
        let mut post = post_with(Some("art"), None, &[]);
        post.is_reblog = true;

        assert!(matches(&post, &FilterCriteria::new(["art"])).matched);
        let criteria = FilterCriteria::new(["art"]).exclude_reblogs(true);
        assert_eq!(matches(&post, &criteria), FilterResult::default());
    }

    #[test]
    fn test_empty_keywords_pass_everything_else() {
        let post = post_with(None, None, &[]);
        let result = matches(&post, &FilterCriteria::default());
        assert!(result.matched);
        assert!(result.matched_keywords.is_empty());

        let result = matches(&post, &FilterCriteria::default().min_notes(11));
        assert!(!result.matched);
    }

    #[test]
    fn test_blank_text_never_matches_keywords() {
        let post = post_with(Some("   "), None, &[]);
        assert!(!matches(&post, &FilterCriteria::new(["a"])).matched);
    }

    #[test]
    fn test_tags_are_searchable() {
        let post = post_with(None, None, &["digital art"]);
        let result = matches(&post, &FilterCriteria::new(["ART"]));
        assert_eq!(result.matched_keywords, vec!["ART"]);
    }
}
