use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::Deserialize;

/// Site configuration, read from a JSON file such as:
///
/// ```json
/// {
///   "site": { "title": "My Blog", "url": "https://blog.example.com" },
///   "theme": { "accentColor": "#e11d48" },
///   "posts": { "directory": "posts" },
///   "output": "dist",
///   "giscus": { "enabled": true, "repo": "me/blog", "repoId": "R_1" }
/// }
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub posts: PostsConfig,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    #[serde(default)]
    pub giscus: GiscusConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// `chrono` format string used for human-readable dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ThemeConfig {
    pub accent_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent_color: "#3b82f6".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PostsConfig {
    pub directory: PathBuf,
    pub excerpt_length: usize,
    pub related_count: usize,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("posts"),
            excerpt_length: 150,
            related_count: 3,
        }
    }
}

/// Parameters of the giscus discussion widget.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GiscusConfig {
    pub enabled: bool,
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,
    pub mapping: String,
    pub theme: String,
}

impl Default for GiscusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo: String::new(),
            repo_id: String::new(),
            category: String::new(),
            category_id: String::new(),
            mapping: "pathname".to_string(),
            theme: "preferred_color_scheme".to_string(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_assets() -> PathBuf {
    PathBuf::from("assets")
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

// Unknown specifiers and time fields fail to format a bare date, and
// `to_string` panics on that, so try it once here.
fn is_valid_date_format(format: &str) -> bool {
    let mut out = String::new();
    write!(out, "{}", NaiveDate::MIN.format(format)).is_ok()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("while reading config {path:?}"))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("while parsing config {path:?}"))?;
        if !is_valid_date_format(&config.site.date_format) {
            bail!(
                "{path:?}: site.dateFormat {:?} is not a valid date format",
                config.site.date_format
            );
        }
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve(base))
    }

    fn resolve(mut self, base: &Path) -> Self {
        self.posts.directory = base.join(&self.posts.directory);
        self.output = base.join(&self.output);
        self.templates = base.join(&self.templates);
        self.assets = base.join(&self.assets);
        let url_len = self.site.url.trim_end_matches('/').len();
        self.site.url.truncate(url_len);
        self
    }
}
