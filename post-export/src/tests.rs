#[cfg(test)]
mod tests {
    use crate::{batch_filename, csv, default_filename, render, save_posts};
    use chrono::{Local, TimeZone, Utc};
    use scraper_core::{OutputFormat, Post};
    use tempfile::TempDir;

    fn sample_post() -> Post {
        Post {
            id: "123".to_string(),
            blog_name: "staff".to_string(),
            post_url: Some("https://staff.tumblr.com/post/123".to_string()),
            post_type: Some("text".to_string()),
            timestamp: Some(1_700_000_000),
            date: Some("2023-11-14 22:13:20 GMT".to_string()),
            title: Some("Hello, \"world\"".to_string()),
            body: Some("<p>line one\nline two</p>".to_string()),
            caption: None,
            summary: Some("Hello".to_string()),
            tags: vec!["art".to_string(), "digital art".to_string()],
            note_count: 42,
            matched_keywords: vec!["art".to_string()],
            scraped_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            is_reblog: false,
            reblog_key: None,
        }
    }

    #[test]
    fn test_csv_header_and_row() {
        let bytes = render(&[sample_post()], OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut rows = text.split("\r\n");

        assert_eq!(
            rows.next().unwrap(),
            "id,blog_name,post_url,type,timestamp,date,title,body,caption,summary,tags,note_count,matched_keywords,scraped_at,is_reblog,reblog_key"
        );
        assert_eq!(
            rows.next().unwrap(),
            "123,staff,https://staff.tumblr.com/post/123,text,1700000000,2023-11-14 22:13:20 GMT,\
             \"Hello, \"\"world\"\"\",\"<p>line one\nline two</p>\",,Hello,\"art, digital art\",42,art,\
             2024-01-02T03:04:05Z,false,"
        );
        assert_eq!(rows.next(), Some(""));
        assert_eq!(rows.next(), None);
    }

    #[test]
    fn test_csv_header_only_for_no_posts() {
        let bytes = render(&[], OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, format!("{}\r\n", csv::HEADER.join(",")));
    }

    #[test]
    fn test_json_field_order_and_types() {
        let bytes = render(&[sample_post()], OutputFormat::Json).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        let positions: Vec<usize> = csv::HEADER
            .iter()
            .map(|field| text.find(&format!("\"{}\":", field)).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let post = &value[0];
        assert_eq!(post["tags"], serde_json::json!(["art", "digital art"]));
        assert_eq!(post["matched_keywords"], serde_json::json!(["art"]));
        assert!(post["caption"].is_null());
        assert_eq!(post["note_count"], 42);
        assert_eq!(post["is_reblog"], false);
        assert_eq!(post["scraped_at"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_filenames() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            default_filename(OutputFormat::Csv, at),
            "tumblr_posts_20240309_140507.csv"
        );
        assert_eq!(
            batch_filename("staff.tumblr.com", OutputFormat::Json),
            "staff_tumblr_com_posts.json"
        );
    }

    #[test]
    fn test_save_posts_writes_file() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().join("nested").join("output");

        let path = save_posts(&[sample_post()], OutputFormat::Json, &output_dir, "out.json")
            .unwrap()
            .unwrap();

        assert_eq!(path, output_dir.join("out.json"));
        let saved: Vec<Post> = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(saved, vec![sample_post()]);
    }

    #[test]
    fn test_empty_result_writes_nothing() {
        let dir = TempDir::new().unwrap();

        let saved = save_posts(&[], OutputFormat::Csv, dir.path(), "empty.csv").unwrap();

        assert_eq!(saved, None);
        assert!(!dir.path().join("empty.csv").exists());
    }
}
