use serde::Serialize;

use crate::post::Post;

/// One record of `search-index.json`. The browser script reads these fields
/// by name, so they must not change.
#[derive(Serialize, Debug, PartialEq)]
pub(super) struct SearchEntry<'a> {
    title: &'a str,
    slug: &'a str,
    excerpt: &'a str,
    tags: &'a [String],
    date: String,
}

impl<'a> From<&'a Post> for SearchEntry<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            title: &post.title,
            slug: &post.slug,
            excerpt: &post.excerpt,
            tags: &post.tags,
            date: post.date.format("%Y-%m-%d").to_string(),
        }
    }
}

pub(super) fn build(posts: &[Post]) -> serde_json::Result<String> {
    let entries: Vec<SearchEntry> = posts.iter().map(SearchEntry::from).collect();
    serde_json::to_string(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::tests::post;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn one_record_per_post_in_order() -> anyhow::Result<()> {
        let mut first = post("Hello World", "2026-01-26", &["a", "b"]);
        first.excerpt = "Hi there".to_string();
        let posts = vec![first, post("Older", "2025-12-01", &[])];

        let parsed: serde_json::Value = serde_json::from_str(&build(&posts)?)?;
        assert_eq!(
            parsed,
            json!([
                {
                    "title": "Hello World",
                    "slug": "Hello-World",
                    "excerpt": "Hi there",
                    "tags": ["a", "b"],
                    "date": "2026-01-26"
                },
                {
                    "title": "Older",
                    "slug": "Older",
                    "excerpt": "",
                    "tags": [],
                    "date": "2025-12-01"
                }
            ])
        );
        Ok(())
    }
}
