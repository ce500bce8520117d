use super::Snippet;

/// Case-insensitive substring filter over title and body. Order is preserved;
/// an empty term keeps everything.
pub fn filter<'a>(items: &'a [Snippet], term: &str) -> Vec<&'a Snippet> {
    if term.is_empty() {
        return items.iter().collect();
    }

    let term = term.to_lowercase();
    items.iter().filter(|item| matches(item, &term)).collect()
}

/// `term` must already be lowercase.
pub fn matches(item: &Snippet, term: &str) -> bool {
    item.title.to_lowercase().contains(term)
        || item.body.searchable_text().to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::{ImageKind, SnippetBody, SnippetId};
    use chrono::Utc;

    fn text(id: &str, title: &str, content: &str) -> Snippet {
        Snippet::new(
            SnippetId::new(id),
            title.to_string(),
            SnippetBody::Text {
                content: content.to_string(),
            },
            Utc::now(),
        )
    }

    fn image(id: &str, title: &str, src: &str) -> Snippet {
        Snippet::new(
            SnippetId::new(id),
            title.to_string(),
            SnippetBody::Image {
                image_src: src.to_string(),
                image_kind: ImageKind::Url,
            },
            Utc::now(),
        )
    }

    fn ids(items: &[&Snippet]) -> Vec<String> {
        items.iter().map(|s| s.id.to_string()).collect()
    }

    fn sample() -> Vec<Snippet> {
        vec![
            text("1", "Email signature", "Best regards"),
            image("2", "Company logo", "https://cdn.example.com/LOGO.png"),
            text("3", "Address", "221B Baker Street"),
        ]
    }

    #[test]
    fn test_empty_term_returns_all_in_order() {
        let items = sample();
        assert_eq!(ids(&filter(&items, "")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_title_match_case_insensitive() {
        let items = sample();
        assert_eq!(ids(&filter(&items, "EMAIL")), vec!["1"]);
    }

    #[test]
    fn test_content_match() {
        let items = sample();
        assert_eq!(ids(&filter(&items, "baker")), vec!["3"]);
    }

    #[test]
    fn test_image_source_match() {
        let items = sample();
        assert_eq!(ids(&filter(&items, "logo.png")), vec!["2"]);
        assert_eq!(ids(&filter(&items, "cdn.example")), vec!["2"]);
    }

    #[test]
    fn test_no_match() {
        let items = sample();
        assert!(filter(&items, "zzz").is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let items = sample();
        let once: Vec<Snippet> = filter(&items, "e").into_iter().cloned().collect();
        let twice = filter(&once, "e");
        assert_eq!(ids(&twice), ids(&filter(&items, "e")));
    }

    #[test]
    fn test_preserves_relative_order() {
        let items = sample();
        assert_eq!(ids(&filter(&items, "a")), vec!["1", "2", "3"]);
    }
}
