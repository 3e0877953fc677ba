use std::collections::{BTreeMap, HashMap};

use crate::{post::Post, slug::Slugger};

const SHARED_TAG_SCORE: usize = 10;
const TITLE_WORD_SCORE: usize = 2;

#[derive(Debug)]
pub(crate) struct ArchiveBucket<'a> {
    /// `YYYY-MM`
    pub key: String,
    pub posts: Vec<&'a Post>,
}

/// Buckets posts by month, most recent month first. Within a bucket the
/// input order is kept.
pub(crate) fn archives(posts: &[Post]) -> Vec<ArchiveBucket<'_>> {
    let mut buckets: BTreeMap<String, Vec<&Post>> = BTreeMap::new();
    for post in posts {
        buckets
            .entry(post.date.format("%Y-%m").to_string())
            .or_default()
            .push(post);
    }
    buckets
        .into_iter()
        .rev()
        .map(|(key, posts)| ArchiveBucket { key, posts })
        .collect()
}

#[derive(Debug)]
pub(crate) struct TagEntry<'a> {
    pub name: String,
    pub slug: String,
    pub posts: Vec<&'a Post>,
}

/// Tags ordered by post count, ties in first-seen order.
#[derive(Debug)]
pub(crate) struct TagIndex<'a> {
    entries: Vec<TagEntry<'a>>,
    slugs: HashMap<String, usize>,
}

impl<'a> TagIndex<'a> {
    pub fn build(posts: &'a [Post]) -> Self {
        let mut entries: Vec<TagEntry<'a>> = vec![];
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for post in posts {
            for tag in post.tags.iter() {
                match positions.get(tag.as_str()) {
                    Some(&i) => {
                        let tagged = &mut entries[i].posts;
                        if !tagged.last().is_some_and(|last| std::ptr::eq(*last, post)) {
                            tagged.push(post);
                        }
                    }
                    None => {
                        positions.insert(tag, entries.len());
                        entries.push(TagEntry {
                            name: tag.clone(),
                            slug: String::new(),
                            posts: vec![post],
                        });
                    }
                }
            }
        }
        entries.sort_by(|a, b| b.posts.len().cmp(&a.posts.len()));

        // Slugs are claimed in display order so busier tags win collisions.
        let mut slugger = Slugger::new("tag");
        let mut slugs = HashMap::new();
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.slug = slugger.claim(&entry.name);
            slugs.insert(entry.name.clone(), i);
        }
        TagIndex { entries, slugs }
    }

    pub fn entries(&self) -> &[TagEntry<'a>] {
        &self.entries
    }

    pub fn slug_of(&self, tag: &str) -> Option<&str> {
        self.slugs
            .get(tag)
            .map(|&i| self.entries[i].slug.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn relatedness(current: &Post, candidate: &Post) -> usize {
    let shared_tags = current
        .tags
        .iter()
        .enumerate()
        .filter(|&(i, tag)| !current.tags[..i].contains(tag) && candidate.tags.contains(tag))
        .count();
    let shared_words = current
        .title
        .split_whitespace()
        .filter(|word| word.chars().count() > 1 && candidate.title.contains(word))
        .count();
    shared_tags * SHARED_TAG_SCORE + shared_words * TITLE_WORD_SCORE
}

/// Up to `max` other posts ranked by shared tags and title words. Equal
/// scores keep the order of `posts`.
pub(crate) fn related(posts: &[Post], current: usize, max: usize) -> Vec<&Post> {
    let Some(this) = posts.get(current) else {
        return vec![];
    };
    let mut scored: Vec<(usize, &Post)> = posts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != current)
        .map(|(_, candidate)| (relatedness(this, candidate), candidate))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(max).map(|(_, post)| post).collect()
}
