use std::collections::BTreeMap;
use std::sync::LazyLock;

// A `---` line, the metadata lines, a closing `---` line, then the body.
static HEADER_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::RegexBuilder::new(r"\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n(.*))?\z")
        .dot_matches_new_line(true)
        .build()
        .unwrap()
});

/// A front-matter value: either a bracketed list or a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attribute {
    Text(String),
    List(Vec<String>),
}

impl Attribute {
    fn parse(raw: &str) -> Self {
        if let Some(inner) = raw.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            return Attribute::List(
                inner
                    .split(',')
                    .map(|item| strip_quotes(item.trim()).to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            );
        }
        Attribute::Text(strip_quotes(raw).to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(s) => Some(s),
            Attribute::List(_) => None,
        }
    }

    /// A list attribute as-is; a plain string becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Attribute::List(items) => items.clone(),
            Attribute::Text(s) => vec![s.clone()],
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// A source document split into its metadata block and its Markdown body.
#[derive(Debug)]
pub(crate) struct FrontMatter<'a> {
    pub attributes: BTreeMap<String, Attribute>,
    pub body: &'a str,
}

impl FrontMatter<'_> {
    pub fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Attribute::as_text)
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.attributes
            .get(key)
            .map(Attribute::to_list)
            .unwrap_or_default()
    }
}

/// Splits `content` into attributes and body.
///
/// Never fails: without a complete `---` block the whole input is the body,
/// and metadata lines without a `key: value` shape are skipped.
pub(crate) fn parse(content: &str) -> FrontMatter<'_> {
    let Some(caps) = HEADER_PATTERN.captures(content) else {
        return FrontMatter {
            attributes: BTreeMap::new(),
            body: content,
        };
    };

    let mut attributes = BTreeMap::new();
    let header = caps.get(1).map_or("", |m| m.as_str());
    for line in header.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.is_empty() {
            continue;
        }
        attributes.insert(name.to_string(), Attribute::parse(value));
    }

    FrontMatter {
        attributes,
        body: caps.get(2).map_or("", |m| m.as_str()),
    }
}
