use std::path::Path;

use anyhow::Context;

use crate::{
    aggregate::{self, ArchiveBucket, TagEntry, TagIndex},
    config::Config,
    post::Post,
    template::{Scope, Template},
};

mod fragments;

/// The parsed page shells, one per page kind.
#[derive(Debug)]
pub(crate) struct Templates {
    pub index: Template,
    pub post: Template,
    pub archives: Template,
    pub tags: Template,
    pub tag: Template,
}

fn load_template(template_dir: &Path, name: &str) -> anyhow::Result<Template> {
    let path = template_dir.join(format!("{name}.html"));
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("while loading template {path:?}"))?;
    Template::parse(name, &source).with_context(|| format!("while parsing template {path:?}"))
}

impl Templates {
    /// Every shell is required; a missing one aborts the run.
    pub fn load(template_dir: &Path) -> anyhow::Result<Self> {
        Ok(Templates {
            index: load_template(template_dir, "index")?,
            post: load_template(template_dir, "post")?,
            archives: load_template(template_dir, "archives")?,
            tags: load_template(template_dir, "tags")?,
            tag: load_template(template_dir, "tag")?,
        })
    }
}

/// Renders every page kind from the finished post list and its aggregates.
pub(crate) struct PageRenderer<'a> {
    config: &'a Config,
    templates: &'a Templates,
    posts: &'a [Post],
    tags: &'a TagIndex<'a>,
}

impl<'a> PageRenderer<'a> {
    pub fn new(
        config: &'a Config,
        templates: &'a Templates,
        posts: &'a [Post],
        tags: &'a TagIndex<'a>,
    ) -> Self {
        Self {
            config,
            templates,
            posts,
            tags,
        }
    }

    fn date_format(&self) -> &str {
        &self.config.site.date_format
    }

    fn base_scope(&self, page_title: &str) -> Scope {
        let site = &self.config.site;
        let giscus = &self.config.giscus;
        let mut scope = Scope::new();
        scope
            .text("site.title", site.title.as_str())
            .text("site.subtitle", site.subtitle.as_str())
            .text("site.author", site.author.as_str())
            .text("site.description", site.description.as_str())
            .text("site.url", site.url.as_str())
            .text("theme.accentColor", self.config.theme.accent_color.as_str())
            .text("page.title", page_title)
            .flag("giscus.enabled", giscus.enabled)
            .text("giscus.repo", giscus.repo.as_str())
            .text("giscus.repoId", giscus.repo_id.as_str())
            .text("giscus.category", giscus.category.as_str())
            .text("giscus.categoryId", giscus.category_id.as_str())
            .text("giscus.mapping", giscus.mapping.as_str())
            .text("giscus.theme", giscus.theme.as_str());
        scope
    }

    pub fn index(&self) -> String {
        let mut scope = self.base_scope(&self.config.site.title);
        scope
            .text(
                "posts",
                fragments::post_cards(self.posts, self.tags, self.date_format()).into_string(),
            )
            .text("posts.count", self.posts.len().to_string());
        self.templates.index.render(&scope)
    }

    /// The page for `self.posts[index]`.
    pub fn post(&self, index: usize) -> String {
        let post = &self.posts[index];
        let related = aggregate::related(self.posts, index, self.config.posts.related_count);
        let newer = index.checked_sub(1).and_then(|i| self.posts.get(i));
        let older = self.posts.get(index + 1);

        let mut scope = self.base_scope(&post.title);
        scope
            .text("post.title", post.title.as_str())
            .text(
                "post.date",
                post.date.format(self.date_format()).to_string(),
            )
            .text("post.isoDate", post.date.format("%Y-%m-%d").to_string())
            .text("post.slug", post.slug.as_str())
            .text("post.url", post.url())
            .text("post.excerpt", post.excerpt.as_str())
            .text("post.content", post.content.as_str())
            .text(
                "post.tags",
                fragments::tag_chips(post, self.tags).into_string(),
            )
            .text("post.readingMinutes", post.reading_minutes.to_string())
            .text("toc", fragments::toc(&post.toc).into_string())
            .text(
                "related",
                fragments::related(&related, self.date_format()).into_string(),
            )
            .text(
                "post.newer",
                fragments::neighbour(newer, "prev", "Newer").into_string(),
            )
            .text(
                "post.older",
                fragments::neighbour(older, "next", "Older").into_string(),
            );
        self.templates.post.render(&scope)
    }

    pub fn archives(&self, buckets: &[ArchiveBucket]) -> String {
        let mut scope = self.base_scope("Archives");
        scope
            .text(
                "archives",
                fragments::archive_months(buckets, self.date_format()).into_string(),
            )
            .text("posts.count", self.posts.len().to_string());
        self.templates.archives.render(&scope)
    }

    pub fn tags(&self) -> String {
        let mut scope = self.base_scope("Tags");
        scope
            .text(
                "tags",
                fragments::tag_cloud(self.tags.entries()).into_string(),
            )
            .text("tags.count", self.tags.len().to_string());
        self.templates.tags.render(&scope)
    }

    pub fn tag(&self, entry: &TagEntry) -> String {
        let mut scope = self.base_scope(&entry.name);
        scope
            .text("tag.name", entry.name.as_str())
            .text("tag.slug", entry.slug.as_str())
            .text("tag.count", entry.posts.len().to_string())
            .text(
                "posts",
                fragments::post_cards(
                    entry.posts.iter().copied(),
                    self.tags,
                    self.date_format(),
                )
                .into_string(),
            );
        self.templates.tag.render(&scope)
    }
}

pub(crate) use fragments::tag_url;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::tests::post;
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        serde_json::from_str(
            r#"{ "site": { "title": "Blog", "author": "Me", "url": "https://blog.test" },
                 "giscus": { "enabled": true, "repo": "me/blog" } }"#,
        )
        .unwrap()
    }

    fn templates() -> Templates {
        let t = |name: &str, src: &str| Template::parse(name, src).unwrap();
        Templates {
            index: t("index", "<title>{{page.title}}</title>[{{posts.count}}]{{posts}}"),
            post: t(
                "post",
                "<h1>{{post.title}}</h1>{{#toc}}<aside>{{toc}}</aside>{{/toc}}\
                 <div>{{post.content}}</div>{{#post.tags}}<p>{{post.tags}}</p>{{/post.tags}}\
                 {{#related}}<section>{{related}}</section>{{/related}}{{^related}}no related{{/related}}\
                 {{#giscus.enabled}}<script data-repo=\"{{giscus.repo}}\"></script>{{/giscus.enabled}}\
                 {{post.newer}}|{{post.older}}",
            ),
            archives: t("archives", "{{archives}}"),
            tags: t("tags", "{{tags.count}}:{{tags}}"),
            tag: t("tag", "<h1>{{tag.name}} ({{tag.count}})</h1>{{posts}}"),
        }
    }

    #[test]
    fn index_lists_every_post() {
        let (config, templates) = (config(), templates());
        let posts = vec![post("B", "2026-01-02", &[]), post("A", "2026-01-01", &[])];
        let tags = TagIndex::build(&posts);
        let html = PageRenderer::new(&config, &templates, &posts, &tags).index();
        assert!(html.starts_with("<title>Blog</title>[2]"));
        assert_eq!(html.matches("<article class=\"post-card\">").count(), 2);
        assert!(html.find("/posts/B/").unwrap() < html.find("/posts/A/").unwrap());
    }

    #[test]
    fn post_page_fills_optional_sections() {
        let (config, templates) = (config(), templates());
        let mut first = post("First", "2026-01-03", &["x"]);
        first.content = "<h2 id=\"Intro\">Intro</h2>".to_string();
        first.toc = vec![crate::markdown::TocEntry {
            level: 2,
            title: "Intro".to_string(),
            id: "Intro".to_string(),
        }];
        let posts = vec![
            first,
            post("Second", "2026-01-02", &["x"]),
            post("Third", "2026-01-01", &[]),
        ];
        let tags = TagIndex::build(&posts);
        let html = PageRenderer::new(&config, &templates, &posts, &tags).post(0);

        assert!(html.starts_with("<h1>First</h1><aside>"));
        assert!(html.contains("href=\"#Intro\""));
        assert!(html.contains("<div><h2 id=\"Intro\">Intro</h2></div>"));
        assert!(html.contains("<a class=\"post-tag\" href=\"/tags/x/\">x</a>"));
        assert!(html.contains("<section><ul class=\"related-list\">"));
        assert!(html.contains("<script data-repo=\"me/blog\"></script>"));
        // Newest post: nothing newer, "Second" is older.
        assert!(html.contains("|<a class=\"post-nav-next\" rel=\"next\" href=\"/posts/Second/\">"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn post_page_without_toc_tags_or_related() {
        let (config, templates) = (config(), templates());
        let posts = vec![post("Only", "2026-01-01", &[])];
        let tags = TagIndex::build(&posts);
        let html = PageRenderer::new(&config, &templates, &posts, &tags).post(0);
        assert!(!html.contains("<aside>"));
        assert!(!html.contains("<p>"));
        assert!(html.contains("no related"));
        assert!(html.ends_with("</script>|"));
    }

    #[test]
    fn tag_pages_list_their_posts() {
        let (config, templates) = (config(), templates());
        let posts = vec![
            post("One", "2026-01-03", &["a"]),
            post("Two", "2026-01-02", &["a", "b"]),
        ];
        let tags = TagIndex::build(&posts);
        let renderer = PageRenderer::new(&config, &templates, &posts, &tags);

        let cloud = renderer.tags();
        assert!(cloud.starts_with("2:"));
        assert!(cloud.find("/tags/a/").unwrap() < cloud.find("/tags/b/").unwrap());

        let page = renderer.tag(&tags.entries()[1]);
        assert!(page.starts_with("<h1>b (1)</h1>"));
        assert_eq!(page.matches("post-card\"").count(), 1);
    }

    #[test]
    fn archives_page_renders_buckets() {
        let (config, templates) = (config(), templates());
        let posts = vec![post("Jan", "2026-01-03", &[]), post("Dec", "2025-12-02", &[])];
        let tags = TagIndex::build(&posts);
        let buckets = aggregate::archives(&posts);
        let html = PageRenderer::new(&config, &templates, &posts, &tags).archives(&buckets);
        assert!(html.find("2026-01").unwrap() < html.find("2025-12").unwrap());
        assert_eq!(html.matches("archive-item").count(), 2);
    }

    #[test]
    fn missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "{{posts}}").unwrap();
        let err = Templates::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("post.html"));
    }
}
