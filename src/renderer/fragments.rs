use maud::{html, Markup};

use crate::{
    aggregate::{ArchiveBucket, TagEntry, TagIndex},
    markdown::TocEntry,
    post::Post,
    slug::slugify,
};

pub(crate) fn tag_url(slug: &str) -> String {
    format!("/tags/{slug}/")
}

fn tag_chip(tag: &str, tags: &TagIndex) -> Markup {
    let slug = tags
        .slug_of(tag)
        .map(str::to_string)
        .unwrap_or_else(|| slugify(tag));
    html! {
        a.post-tag href=(tag_url(&slug)) { (tag) }
    }
}

pub(super) fn tag_chips(post: &Post, tags: &TagIndex) -> Markup {
    html! {
        @for tag in &post.tags {
            (tag_chip(tag, tags))
        }
    }
}

fn post_date(post: &Post, date_format: &str) -> Markup {
    html! {
        time.post-date datetime=(post.date.format("%Y-%m-%d").to_string()) {
            (post.date.format(date_format).to_string())
        }
    }
}

pub(super) fn post_card(post: &Post, tags: &TagIndex, date_format: &str) -> Markup {
    html! {
        article.post-card {
            div.post-card-inner {
                h2.post-title {
                    a href=(post.url()) { (post.title) }
                }
                div.post-meta {
                    (post_date(post, date_format))
                    (tag_chips(post, tags))
                }
                p.post-excerpt { (post.excerpt) }
                a.read-more href=(post.url()) { "Read more →" }
            }
        }
    }
}

pub(super) fn post_cards<'a>(
    posts: impl IntoIterator<Item = &'a Post>,
    tags: &TagIndex,
    date_format: &str,
) -> Markup {
    html! {
        @for post in posts {
            (post_card(post, tags, date_format))
        }
    }
}

pub(super) fn archive_months(buckets: &[ArchiveBucket], date_format: &str) -> Markup {
    html! {
        @for bucket in buckets {
            div.archive-month {
                h3.archive-month-title { (bucket.key) }
                ul.archive-list {
                    @for post in &bucket.posts {
                        li.archive-item {
                            (post_date(post, date_format))
                            a.archive-title href=(post.url()) { (post.title) }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn tag_cloud(entries: &[TagEntry]) -> Markup {
    html! {
        @for entry in entries {
            a.tag-cloud-item href=(tag_url(&entry.slug)) {
                span.tag-name { (entry.name) }
                span.tag-count { (entry.posts.len().to_string()) }
            }
        }
    }
}

pub(super) fn toc(entries: &[TocEntry]) -> Markup {
    if entries.is_empty() {
        return html! {};
    }
    html! {
        nav.toc-list {
            @for entry in entries {
                a class={ "toc-item toc-level-" (entry.level.to_string()) } href={ "#" (entry.id) } {
                    (entry.title)
                }
            }
        }
    }
}

pub(super) fn related(posts: &[&Post], date_format: &str) -> Markup {
    if posts.is_empty() {
        return html! {};
    }
    html! {
        ul.related-list {
            @for post in posts {
                li.related-item {
                    a href=(post.url()) { (post.title) }
                    (post_date(post, date_format))
                }
            }
        }
    }
}

pub(super) fn neighbour(post: Option<&Post>, rel: &str, label: &str) -> Markup {
    let Some(post) = post else {
        return html! {};
    };
    html! {
        a class={ "post-nav-" (rel) } rel=(rel) href=(post.url()) {
            span.post-nav-label { (label) }
            span.post-nav-title { (post.title) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::tests::post;
    use pretty_assertions::assert_eq;

    #[test]
    fn card_escapes_text_and_links_tags() {
        let mut p = post("Fish & Chips", "2026-01-26", &["food"]);
        p.excerpt = "<b>not bold</b>".to_string();
        let posts = vec![p];
        let tags = TagIndex::build(&posts);
        let card = post_card(&posts[0], &tags, "%Y-%m-%d").into_string();
        assert!(card.contains(r#"<a href="/posts/Fish-Chips/">Fish &amp; Chips</a>"#));
        assert!(card.contains("&lt;b&gt;not bold&lt;/b&gt;"));
        assert!(card.contains(r#"<a class="post-tag" href="/tags/food/">food</a>"#));
        assert!(card.contains(r#"<time class="post-date" datetime="2026-01-26">2026-01-26</time>"#));
    }

    #[test]
    fn empty_collections_render_nothing() {
        assert_eq!(toc(&[]).into_string(), "");
        assert_eq!(related(&[], "%Y").into_string(), "");
        assert_eq!(neighbour(None, "prev", "Newer").into_string(), "");
    }

    #[test]
    fn toc_links_to_heading_ids() {
        let entries = vec![TocEntry {
            level: 3,
            title: "Details".to_string(),
            id: "Details".to_string(),
        }];
        assert_eq!(
            toc(&entries).into_string(),
            r##"<nav class="toc-list"><a class="toc-item toc-level-3" href="#Details">Details</a></nav>"##
        );
    }
}
