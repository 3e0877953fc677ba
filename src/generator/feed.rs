use atom_syndication::{Category, Content, Entry, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::{config::Config, post::Post};

fn timestamp(date: NaiveDate) -> DateTime<FixedOffset> {
    date.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

fn link(href: String, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}

fn authors(config: &Config) -> Vec<Person> {
    if config.site.author.is_empty() {
        return vec![];
    }
    let mut person = Person::default();
    person.set_name(config.site.author.as_str());
    vec![person]
}

fn entry(config: &Config, post: &Post) -> Entry {
    let url = format!("{}{}", config.site.url, post.url());
    let date = timestamp(post.date);

    let mut content = Content::default();
    content.set_content_type(Some("html".to_string()));
    content.set_value(Some(post.content.clone()));

    let categories = post
        .tags
        .iter()
        .map(|tag| {
            let mut category = Category::default();
            category.set_term(tag.as_str());
            category
        })
        .collect::<Vec<_>>();

    let mut entry = Entry::default();
    entry.set_title(post.title.as_str());
    entry.set_id(url.as_str());
    entry.set_updated(date);
    entry.set_published(Some(date));
    entry.set_links(vec![link(url, "alternate")]);
    entry.set_authors(authors(config));
    entry.set_summary(Some(Text::plain(post.excerpt.as_str())));
    entry.set_content(Some(content));
    entry.set_categories(categories);
    entry
}

/// `posts` must be sorted newest first; the first post dates the feed.
pub(super) fn build(config: &Config, posts: &[Post]) -> Feed {
    let site_url = &config.site.url;
    let updated = posts
        .first()
        .map(|post| timestamp(post.date))
        .unwrap_or_else(|| Utc::now().fixed_offset());

    let mut feed = Feed::default();
    feed.set_title(config.site.title.as_str());
    if !config.site.subtitle.is_empty() {
        feed.set_subtitle(Some(Text::plain(config.site.subtitle.as_str())));
    }
    feed.set_id(format!("{site_url}/"));
    feed.set_updated(updated);
    feed.set_authors(authors(config));
    feed.set_links(vec![
        link(format!("{site_url}/atom.xml"), "self"),
        link(format!("{site_url}/"), "alternate"),
    ]);
    feed.set_entries(posts.iter().map(|post| entry(config, post)).collect::<Vec<_>>());
    feed
}
