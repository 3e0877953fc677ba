use std::collections::HashMap;

use log::warn;
use thiserror::Error;

/// Errors found while parsing a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TemplateError {
    #[error("template `{template}`: closing tag `{name}` at byte {offset} has no open section")]
    UnexpectedClose {
        template: String,
        name: String,
        offset: usize,
    },

    #[error("template `{template}`: section `{expected}` is closed by `{found}` at byte {offset}")]
    MismatchedClose {
        template: String,
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("template `{template}`: section `{name}` is never closed")]
    Unclosed { template: String, name: String },
}

/// A value bound in a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value {
    Text(String),
    Bool(bool),
}

impl Value {
    /// `true` and non-empty strings are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }

    fn render(&self) -> &str {
        match self {
            Value::Text(s) => s,
            Value::Bool(true) => "true",
            Value::Bool(false) => "",
        }
    }
}

/// The data a template is rendered against. Keys are the dotted names used
/// in the template, e.g. `site.title`.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scope {
    values: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.values
            .insert(key.to_string(), Value::Text(value.into()));
        self
    }

    pub fn flag(&mut self, key: &str, value: bool) -> &mut Self {
        self.values.insert(key.to_string(), Value::Bool(value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_truthy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Value(String),
    Section {
        name: String,
        inverted: bool,
        body: Vec<Node>,
    },
}

enum Token<'s> {
    Text(&'s str),
    Value(&'s str),
    Open { name: &'s str, inverted: bool },
    Close { name: &'s str, offset: usize },
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn classify(inner: &str, offset: usize) -> Option<Token<'_>> {
    let inner = inner.trim();
    let (sigil, rest) = match inner.chars().next()? {
        c @ ('#' | '^' | '/') => (Some(c), inner[1..].trim()),
        _ => (None, inner),
    };
    if !is_name(rest) {
        return None;
    }
    Some(match sigil {
        Some('#') => Token::Open {
            name: rest,
            inverted: false,
        },
        Some('^') => Token::Open {
            name: rest,
            inverted: true,
        },
        Some(_) => Token::Close { name: rest, offset },
        None => Token::Value(rest),
    })
}

// Anything between braces that is not a well-formed token stays literal.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut literal_start = 0;
    let mut cursor = 0;
    while let Some(found) = source[cursor..].find("{{") {
        let open = cursor + found;
        let Some(close) = source[open + 2..].find("}}").map(|i| open + 2 + i) else {
            break;
        };
        match classify(&source[open + 2..close], open) {
            Some(token) => {
                if literal_start < open {
                    tokens.push(Token::Text(&source[literal_start..open]));
                }
                tokens.push(token);
                cursor = close + 2;
                literal_start = cursor;
            }
            None => cursor = open + 1,
        }
    }
    if literal_start < source.len() {
        tokens.push(Token::Text(&source[literal_start..]));
    }
    tokens
}

/// A parsed page shell.
#[derive(Debug, Clone)]
pub(crate) struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let mut stack: Vec<(&str, bool, Vec<Node>)> = vec![];
        let mut current: Vec<Node> = vec![];

        for token in tokenize(source) {
            match token {
                Token::Text(text) => current.push(Node::Text(text.to_string())),
                Token::Value(key) => current.push(Node::Value(key.to_string())),
                Token::Open { name, inverted } => {
                    stack.push((name, inverted, std::mem::take(&mut current)));
                }
                Token::Close { name: found, offset } => {
                    let Some((open, inverted, parent)) = stack.pop() else {
                        return Err(TemplateError::UnexpectedClose {
                            template: name.to_string(),
                            name: found.to_string(),
                            offset,
                        });
                    };
                    if open != found {
                        return Err(TemplateError::MismatchedClose {
                            template: name.to_string(),
                            expected: open.to_string(),
                            found: found.to_string(),
                            offset,
                        });
                    }
                    let body = std::mem::replace(&mut current, parent);
                    current.push(Node::Section {
                        name: open.to_string(),
                        inverted,
                        body,
                    });
                }
            }
        }

        if let Some((open, _, _)) = stack.pop() {
            return Err(TemplateError::Unclosed {
                template: name.to_string(),
                name: open.to_string(),
            });
        }

        Ok(Template {
            name: name.to_string(),
            nodes: current,
        })
    }

    pub fn render(&self, scope: &Scope) -> String {
        let mut out = String::new();
        self.render_nodes(&self.nodes, scope, &mut out);
        out
    }

    fn render_nodes(&self, nodes: &[Node], scope: &Scope, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value(key) => match scope.get(key) {
                    Some(value) => out.push_str(value.render()),
                    None => warn!("template `{}`: nothing bound to `{}`", self.name, key),
                },
                Node::Section {
                    name,
                    inverted,
                    body,
                } => {
                    if scope.is_truthy(name) != *inverted {
                        self.render_nodes(body, scope, out);
                    }
                }
            }
        }
    }
}
