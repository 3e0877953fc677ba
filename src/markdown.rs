use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::slug::Slugger;

/// One entry of a post's table of contents.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct TocEntry {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// The HTML for a Markdown body together with its table of contents.
#[derive(Debug, Clone)]
pub(crate) struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

pub(crate) fn render(markdown: &str) -> Rendered {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut rewriter = Rewriter::new();
    for event in Parser::new_ext(markdown, options) {
        rewriter.push(event);
    }

    let mut body_html = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut body_html, rewriter.out.into_iter());
    Rendered {
        html: body_html,
        toc: rewriter.toc,
    }
}

struct OpenHeading {
    start: usize,
    text: String,
}

struct OpenCodeBlock {
    lang: String,
    code: String,
}

struct OpenImage {
    src: String,
    title: String,
    alt: String,
}

struct Rewriter<'a> {
    out: Vec<Event<'a>>,
    toc: Vec<TocEntry>,
    anchors: Slugger,
    heading: Option<OpenHeading>,
    code_block: Option<OpenCodeBlock>,
    image: Option<OpenImage>,
}

impl<'a> Rewriter<'a> {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            toc: Vec::new(),
            anchors: Slugger::new("section"),
            heading: None,
            code_block: None,
            image: None,
        }
    }

    fn push(&mut self, event: Event<'a>) {
        if let Some(block) = self.code_block.as_mut() {
            match event {
                Event::Text(text) => block.code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = self.code_block.take() {
                        self.out.push(Event::Html(render_code_block(&block).into()));
                    }
                }
                _ => {}
            }
            return;
        }

        if let Some(image) = self.image.as_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => image.alt.push_str(&text),
                Event::End(TagEnd::Image) => {
                    if let Some(image) = self.image.take() {
                        self.out.push(Event::Html(render_image(&image).into()));
                    }
                }
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some(OpenCodeBlock {
                    lang: if lang.is_empty() { "text".to_string() } else { lang },
                    code: String::new(),
                });
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                self.image = Some(OpenImage {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::Start(Tag::Heading { .. }) => {
                self.heading = Some(OpenHeading {
                    start: self.out.len(),
                    text: String::new(),
                });
                self.out.push(event);
            }
            Event::Text(ref text) | Event::Code(ref text) => {
                if let Some(heading) = self.heading.as_mut() {
                    heading.text.push_str(text);
                }
                self.out.push(event);
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(heading) = self.heading.take() {
                    self.close_heading(level, heading);
                }
                self.out.push(event);
            }
            _ => self.out.push(event),
        }
    }

    fn close_heading(&mut self, level: HeadingLevel, heading: OpenHeading) {
        let level = match level {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            _ => return,
        };
        let title = heading.text.trim().to_string();
        let anchor = self.anchors.claim(&title);
        if let Event::Start(Tag::Heading { id, .. }) = &mut self.out[heading.start] {
            *id = Some(CowStr::from(anchor.clone()));
        }
        self.toc.push(TocEntry {
            level,
            title,
            id: anchor,
        });
    }
}

fn render_code_block(block: &OpenCodeBlock) -> String {
    let lang = escape_attr(&block.lang);
    format!(
        "<pre class=\"language-{lang}\" data-lang=\"{lang}\"><code class=\"language-{lang}\">{}</code></pre>\n",
        escape_text(block.code.trim_end_matches('\n'))
    )
}

fn render_image(image: &OpenImage) -> String {
    let mut tag = format!(
        "<img src=\"{}\" alt=\"{}\"",
        escape_attr(&image.src),
        escape_attr(&image.alt)
    );
    if !image.title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", escape_attr(&image.title)));
    }
    tag.push_str(" loading=\"lazy\">");
    tag
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}
