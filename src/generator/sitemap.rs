use std::fmt::Write;

use crate::{aggregate::TagIndex, post::Post, renderer::tag_url};

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn push_url(out: &mut String, loc: &str, lastmod: Option<String>) {
    out.push_str("  <url>\n");
    let _ = writeln!(out, "    <loc>{}</loc>", escape_xml(loc));
    if let Some(lastmod) = lastmod {
        let _ = writeln!(out, "    <lastmod>{lastmod}</lastmod>");
    }
    out.push_str("  </url>\n");
}

pub(super) fn build(site_url: &str, posts: &[Post], tags: &TagIndex) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in ["/", "/archives/", "/tags/"] {
        push_url(&mut out, &format!("{site_url}{page}"), None);
    }
    for post in posts {
        push_url(
            &mut out,
            &format!("{site_url}{}", post.url()),
            Some(post.date.format("%Y-%m-%d").to_string()),
        );
    }
    for entry in tags.entries() {
        push_url(
            &mut out,
            &format!("{site_url}{}", tag_url(&entry.slug)),
            None,
        );
    }
    out.push_str("</urlset>\n");
    out
}
