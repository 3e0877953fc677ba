use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    frontmatter,
    markdown::{self, TocEntry},
    sample,
    slug::{slugify, Slugger},
};

const MARKDOWN_EXTENSION: &str = "md";
const EXCERPT_STRIPPED: [char; 5] = ['#', '*', '`', '[', ']'];
const READING_CHARS_PER_MINUTE: usize = 400;

/// A fully built post. Nothing mutates a post once [`load_posts`] returns.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct Post {
    pub title: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub slug: String,
    pub content: String,
    pub toc: Vec<TocEntry>,
    pub excerpt: String,
    pub reading_minutes: usize,
    /// Source path relative to the posts root.
    pub path: PathBuf,
}

impl Post {
    /// Builds a post from the raw source text. `fallback_date` is used when
    /// the front matter has no usable `date`.
    pub fn from_source(
        path: &Path,
        content: &str,
        fallback_date: NaiveDate,
        excerpt_length: usize,
    ) -> Self {
        let doc = frontmatter::parse(content);
        let title = match doc.text("title") {
            Some(title) => title.to_string(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        };
        let date = match doc.text("date") {
            Some(value) => parse_date(value).unwrap_or_else(|| {
                warn!("{path:?}: unrecognized date {value:?}, using {fallback_date}");
                fallback_date
            }),
            None => {
                warn!("{path:?}: no date in front matter, using {fallback_date}");
                fallback_date
            }
        };
        let rendered = markdown::render(doc.body);
        let mut tags: Vec<String> = vec![];
        for tag in doc.list("tags") {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Post {
            slug: slugify(&title),
            title,
            date,
            tags,
            content: rendered.html,
            toc: rendered.toc,
            excerpt: excerpt(doc.body, excerpt_length),
            reading_minutes: reading_minutes(doc.body),
            path: path.to_path_buf(),
        }
    }

    pub fn url(&self) -> String {
        format!("/posts/{}/", self.slug)
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM[:SS]`.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
}

/// A plain-text preview of the raw Markdown body (never of rendered HTML).
pub(crate) fn excerpt(raw_body: &str, max_length: usize) -> String {
    let text: String = raw_body
        .chars()
        .filter(|c| !EXCERPT_STRIPPED.contains(c))
        .collect();
    let text = text.trim();
    if text.chars().count() > max_length {
        let mut truncated: String = text.chars().take(max_length).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

fn reading_minutes(raw_body: &str) -> usize {
    raw_body
        .chars()
        .count()
        .div_ceil(READING_CHARS_PER_MINUTE)
        .max(1)
}

/// Newest first. The sort is stable, so posts sharing a date keep their
/// discovery order.
pub(crate) fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Makes slugs unique in list order, so the newest post keeps the bare slug.
fn assign_unique_slugs(posts: &mut [Post]) {
    let mut slugger = Slugger::new("post");
    for post in posts.iter_mut() {
        let slug = slugger.claim(&post.slug);
        if slug != post.slug {
            warn!(
                "slug {:?} of {:?} is already taken, using {:?}",
                post.slug, post.path, slug
            );
        }
        post.slug = slug;
    }
}

/// Markdown files under `dir`, breadth first, each directory in file-name
/// order. Paths are relative to `dir`.
fn discover(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = vec![];
    let mut q = VecDeque::new();
    q.push_back(PathBuf::new());
    while let Some(path) = q.pop_front() {
        let current = dir.join(&path);
        let mut entries = std::fs::read_dir(&current)
            .with_context(|| format!("while reading directory {current:?}"))?
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let meta = entry.metadata()?;
            let relative = path.join(entry.file_name());
            if meta.is_dir() {
                q.push_back(relative);
            } else if meta.is_file()
                && relative.extension().is_some_and(|ext| ext == MARKDOWN_EXTENSION)
            {
                found.push(relative);
            }
        }
    }
    Ok(found)
}

fn modified_date(path: &Path) -> NaiveDate {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(|time| DateTime::<Utc>::from(time).date_naive())
        .unwrap_or_else(|_| Utc::now().date_naive())
}

/// Reads every post under `posts_dir`, newest first, with unique slugs.
///
/// A missing or empty posts directory is seeded with the sample posts first.
pub(crate) fn load_posts(posts_dir: &Path, excerpt_length: usize) -> anyhow::Result<Vec<Post>> {
    let mut sources = if posts_dir.is_dir() {
        discover(posts_dir)?
    } else {
        vec![]
    };
    if sources.is_empty() {
        info!("No posts found in {posts_dir:?}, creating sample posts...");
        sample::write_samples(posts_dir)?;
        sources = discover(posts_dir)?;
    }

    let mut posts = Vec::with_capacity(sources.len());
    for relative in sources {
        let full_path = posts_dir.join(&relative);
        debug!("Loading {full_path:?}");
        let content = std::fs::read_to_string(&full_path)
            .with_context(|| format!("while reading {full_path:?}"))?;
        posts.push(Post::from_source(
            &relative,
            &content,
            modified_date(&full_path),
            excerpt_length,
        ));
    }

    sort_posts(&mut posts);
    assign_unique_slugs(&mut posts);
    info!("Loaded {} posts", posts.len());
    Ok(posts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    pub(crate) fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    /// A minimal post for tests that only care about metadata.
    pub(crate) fn post(title: &str, day: &str, tags: &[&str]) -> Post {
        Post {
            title: title.to_string(),
            date: date(day),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            slug: slugify(title),
            content: String::new(),
            toc: vec![],
            excerpt: String::new(),
            reading_minutes: 1,
            path: PathBuf::from(format!("{title}.md")),
        }
    }

    #[test]
    fn builds_post_from_front_matter() {
        let post = Post::from_source(
            Path::new("hello.md"),
            "---\ntitle: \"Hello World\"\ndate: 2026-01-26\ntags: [\"a\", \"b\"]\n---\n# Hi\n\nSome *text*.",
            date("2000-01-01"),
            150,
        );
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.slug, "Hello-World");
        assert_eq!(post.date, date("2026-01-26"));
        assert_eq!(post.tags, vec!["a", "b"]);
        assert!(post.content.contains("<h1>Hi</h1>"));
        assert!(post.content.contains("<em>text</em>"));
        assert_eq!(post.excerpt, "Hi\n\nSome text.");
        assert_eq!(post.url(), "/posts/Hello-World/");
    }

    #[test]
    fn repeated_tags_are_listed_once() {
        let post = Post::from_source(
            Path::new("x.md"),
            "---\ntitle: X\ntags: [b, a, b, a]\n---\n",
            date("2000-01-01"),
            150,
        );
        assert_eq!(post.tags, vec!["b", "a"]);
    }

    #[test]
    fn falls_back_to_file_name_and_given_date() {
        let post = Post::from_source(
            Path::new("notes/first draft.md"),
            "no front matter here",
            date("2024-05-06"),
            150,
        );
        assert_eq!(post.title, "first draft");
        assert_eq!(post.slug, "first-draft");
        assert_eq!(post.date, date("2024-05-06"));
        assert!(post.tags.is_empty());
    }

    #[test]
    fn unparseable_date_uses_fallback() {
        let post = Post::from_source(
            Path::new("x.md"),
            "---\ndate: someday\n---\n",
            date("2024-05-06"),
            150,
        );
        assert_eq!(post.date, date("2024-05-06"));
    }

    #[rstest]
    #[case("2026-01-26", Some("2026-01-26"))]
    #[case("2026-01-26T23:30:00+09:00", Some("2026-01-26"))]
    #[case("2026-01-26 08:15", Some("2026-01-26"))]
    #[case("2026-01-26T08:15:00", Some("2026-01-26"))]
    #[case("26/01/2026", None)]
    fn parses_dates(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_date(input), expected.map(date));
    }

    #[test]
    fn excerpt_strips_markers_and_truncates() {
        let body = format!("# Title\n\n**bold** `code` [link](url) {}", "x".repeat(300));
        let excerpt = excerpt(&body, 150);
        for marker in EXCERPT_STRIPPED {
            assert!(!excerpt.contains(marker));
        }
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), 153);
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let body = "代码".repeat(10);
        assert_eq!(excerpt(&body, 20), body);
        assert_eq!(excerpt(&body, 5), "代码代码代...");
    }

    #[test]
    fn short_excerpt_is_untouched() {
        assert_eq!(excerpt("  short body \n", 150), "short body");
    }

    #[test]
    fn reading_time_is_at_least_a_minute() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes(&"a".repeat(401)), 2);
    }

    #[test]
    fn sorts_newest_first_and_keeps_ties_stable() {
        let mut posts = vec![
            post("old", "2024-01-01", &[]),
            post("tie-a", "2025-06-01", &[]),
            post("new", "2026-01-01", &[]),
            post("tie-b", "2025-06-01", &[]),
        ];
        sort_posts(&mut posts);
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "tie-a", "tie-b", "old"]);
        assert!(posts.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn duplicate_slugs_are_disambiguated() {
        let mut posts = vec![
            post("Hello World", "2026-01-02", &[]),
            post("Hello, World!", "2026-01-01", &[]),
        ];
        assign_unique_slugs(&mut posts);
        assert_eq!(posts[0].slug, "Hello-World");
        assert_eq!(posts[1].slug, "Hello-World-2");
    }

    #[test]
    fn loads_nested_posts_sorted_by_date() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("2025"))?;
        std::fs::write(
            dir.path().join("a.md"),
            "---\ntitle: Alpha\ndate: 2025-03-01\n---\nalpha",
        )?;
        std::fs::write(
            dir.path().join("2025/b.md"),
            "---\ntitle: Beta\ndate: 2026-01-01\n---\nbeta",
        )?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let posts = load_posts(dir.path(), 150)?;
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Beta", "Alpha"]);
        assert_eq!(posts[0].path, PathBuf::from("2025/b.md"));
        Ok(())
    }

    #[test]
    fn missing_directory_is_seeded_with_samples() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let posts_dir = dir.path().join("posts");

        let posts = load_posts(&posts_dir, 150)?;
        assert_eq!(posts.len(), sample::SAMPLE_POSTS.len());
        assert!(posts_dir.is_dir());
        assert!(posts.windows(2).all(|w| w[0].date >= w[1].date));

        // Second run reads the persisted files and gets the same result.
        let again = load_posts(&posts_dir, 150)?;
        let slugs = |p: &[Post]| p.iter().map(|p| p.slug.clone()).collect::<Vec<_>>();
        assert_eq!(slugs(&posts), slugs(&again));
        Ok(())
    }
}
