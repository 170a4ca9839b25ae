use scraper_core::Post;
use std::collections::HashSet;

/// Insertion-ordered, id-unique collection capped at the run's limit.
#[derive(Debug)]
pub struct ResultAccumulator {
    limit: usize,
    posts: Vec<Post>,
    seen: HashSet<String>,
}

impl ResultAccumulator {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            posts: Vec::with_capacity(limit.min(256)),
            seen: HashSet::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Append `post` unless its id is already present or the accumulator is
    /// full. Returns whether the post was kept.
    pub fn push(&mut self, post: Post) -> bool {
        if self.is_full() || self.seen.contains(&post.id) {
            return false;
        }
        self.seen.insert(post.id.clone());
        self.posts.push(post);
        true
    }

    pub fn is_full(&self) -> bool {
        self.posts.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            blog_name: "staff".to_string(),
            post_url: None,
            post_type: None,
            timestamp: None,
            date: None,
            title: Some(title.to_string()),
            body: None,
            caption: None,
            summary: None,
            tags: vec![],
            note_count: 0,
            matched_keywords: vec![],
            scraped_at: Utc::now(),
            is_reblog: false,
            reblog_key: None,
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut acc = ResultAccumulator::new(10);
        assert!(acc.push(post("1", "first")));
        assert!(!acc.push(post("1", "second")));
        assert!(acc.contains("1"));

        let posts = acc.into_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_caps_at_limit() {
        let mut acc = ResultAccumulator::new(2);
        assert!(acc.push(post("1", "a")));
        assert!(!acc.is_full());
        assert!(acc.push(post("2", "b")));
        assert!(acc.is_full());
        assert!(!acc.push(post("3", "c")));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_keeps_insertion_order() {
        let mut acc = ResultAccumulator::new(5);
        for id in ["9", "3", "7"] {
            acc.push(post(id, id));
        }
        let ids: Vec<String> = acc.into_posts().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["9", "3", "7"]);
    }
}
