use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

// ASCII word characters and CJK unified ideographs survive, anything else
// collapses into a single dash.
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_\x{4e00}-\x{9fa5}]+").unwrap());

/// Turns a title, heading or tag name into a URL path segment.
///
/// Case is preserved, so `Hello World` becomes `Hello-World`. The mapping is
/// not injective; use [`Slugger`] where uniqueness matters.
pub(crate) fn slugify(text: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(text, "-")
        .trim_matches('-')
        .to_string()
}

/// Hands out slugs that are unique within one namespace (the posts of a run,
/// the headings of a document, the tags of a run).
///
/// The first claim on a slug gets it bare; later claims get `-2`, `-3`, ...
#[derive(Debug)]
pub(crate) struct Slugger {
    used: HashSet<String>,
    fallback: &'static str,
}

impl Slugger {
    pub fn new(fallback: &'static str) -> Self {
        Self {
            used: HashSet::new(),
            fallback,
        }
    }

    /// Slugifies `text` and claims the result.
    pub fn claim(&mut self, text: &str) -> String {
        let base = slugify(text);
        let base = if base.is_empty() {
            self.fallback.to_string()
        } else {
            base
        };
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
