//! Minimal logic-less template language for client profiles.
//!
//! ```text
//! client
//! {{#openvpn_servers}}
//! remote {{ . }}
//! {{/openvpn_servers}}
//! <cert>
//! {{ certificate }}
//! </cert>
//! {{#tlsauth}}
//! <tls-auth>
//! {{ tlsauth }}
//! </tls-auth>
//! {{/tlsauth}}
//! ```
//!
//! - `{{ name }}` inserts a field; list fields are joined with newlines.
//! - `{{#name}}...{{/name}}` renders its body once per list item (with `{{ . }}` bound to
//!   the item), once for a text field (with `{{ . }}` bound to the text), and not at all
//!   for an absent optional field.
//!
//! Every placeholder must name a field the caller declared, even inside sections that end
//! up skipped. A template is parsed completely before anything is rendered, so a broken
//! template never yields partial output.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::errors::{Error, Result};

const TAG_PATTERN: &str = r"\{\{\s*([#/]?)\s*([A-Za-z_][A-Za-z0-9_]*|\.)\s*\}\}";

/// A value supplied to [`Template::render`].
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    /// Declared optional field with no value
    Absent,
}

/// Named values for one render. Borrowed, so secrets are not copied into the map.
#[derive(Default)]
pub struct Fields<'a> {
    values: BTreeMap<&'a str, FieldValue<'a>>,
}

impl<'a> Fields<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'a str, value: &'a str) -> Self {
        self.values.insert(name, FieldValue::Text(value));
        self
    }

    pub fn list(mut self, name: &'a str, values: &'a [String]) -> Self {
        self.values.insert(name, FieldValue::List(values));
        self
    }

    /// Declare an optional field; `None` makes sections over it render nothing.
    pub fn optional(mut self, name: &'a str, value: Option<&'a str>) -> Self {
        self.values.insert(name, value.map_or(FieldValue::Absent, FieldValue::Text));
        self
    }

    /// Fail unless every name in `names` is set to a non-blank value.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        for name in names {
            let present = match self.get(name) {
                Some(FieldValue::Text(text)) => !text.trim().is_empty(),
                Some(FieldValue::List(items)) => items.iter().any(|item| !item.trim().is_empty()),
                Some(FieldValue::Absent) | None => false,
            };
            if !present {
                return Err(Error::template(format!("required field '{}' is missing or empty", name)));
            }
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Option<FieldValue<'a>> {
        self.values.get(name).copied()
    }
}

impl fmt::Debug for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fields").field("names", &self.values.keys().collect::<Vec<_>>()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(String),
    Item,
    Section { name: String, body: Vec<Node> },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source.
    ///
    /// # Errors
    ///
    /// `Error::Template` for unterminated or malformed tags and unbalanced sections.
    pub fn parse(source: &str) -> Result<Self> {
        let tag = Regex::new(TAG_PATTERN)
            .map_err(|e| Error::template(format!("invalid tag pattern: {}", e)))?;

        let mut stack: Vec<(String, Vec<Node>)> = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut cursor = 0;

        for caps in tag.captures_iter(source) {
            let (Some(whole), Some(sigil), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            push_text(&mut current, source, cursor, whole.start())?;
            cursor = whole.end();

            let name = name.as_str();
            match (sigil.as_str(), name) {
                ("", ".") => current.push(Node::Item),
                ("", _) => current.push(Node::Field(name.to_string())),
                ("#", ".") | ("/", ".") => {
                    return Err(Error::template(format!(
                        "line {}: '.' cannot open or close a section",
                        line_of(source, whole.start())
                    )));
                }
                ("#", _) => stack.push((name.to_string(), std::mem::take(&mut current))),
                _ => {
                    let (open, parent) = stack.pop().ok_or_else(|| {
                        Error::template(format!(
                            "line {}: '{{{{/{}}}}}' closes a section that was never opened",
                            line_of(source, whole.start()),
                            name
                        ))
                    })?;
                    if open != name {
                        return Err(Error::template(format!(
                            "line {}: section '{}' closed by '{{{{/{}}}}}'",
                            line_of(source, whole.start()),
                            open,
                            name
                        )));
                    }
                    let body = std::mem::replace(&mut current, parent);
                    current.push(Node::Section { name: open, body });
                }
            }
        }

        push_text(&mut current, source, cursor, source.len())?;

        if let Some((open, _)) = stack.last() {
            return Err(Error::template(format!("section '{}' is never closed", open)));
        }

        Ok(Self { nodes: current })
    }

    /// Render with `fields`.
    ///
    /// # Errors
    ///
    /// `Error::Template` if the template names a field that was not declared, inserts an
    /// absent optional field outside a section over it, or uses `{{ . }}` outside a
    /// section.
    pub fn render(&self, fields: &Fields<'_>) -> Result<String> {
        check_names(&self.nodes, fields)?;

        let mut out = String::new();
        render_nodes(&self.nodes, fields, None, &mut out)?;
        Ok(out)
    }
}

fn push_text(nodes: &mut Vec<Node>, source: &str, start: usize, end: usize) -> Result<()> {
    let text = &source[start..end];
    if text.is_empty() {
        return Ok(());
    }
    if let Some(offset) = text.find("{{") {
        return Err(Error::template(format!(
            "line {}: unterminated or malformed tag",
            line_of(source, start + offset)
        )));
    }
    nodes.push(Node::Text(text.to_string()));
    Ok(())
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn check_names(nodes: &[Node], fields: &Fields<'_>) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(_) | Node::Item => {}
            Node::Field(name) => {
                if fields.get(name).is_none() {
                    return Err(Error::template(format!("unknown field '{}'", name)));
                }
            }
            Node::Section { name, body } => {
                if fields.get(name).is_none() {
                    return Err(Error::template(format!("unknown section '{}'", name)));
                }
                check_names(body, fields)?;
            }
        }
    }
    Ok(())
}

fn render_nodes(
    nodes: &[Node],
    fields: &Fields<'_>,
    item: Option<&str>,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Item => {
                let item = item.ok_or_else(|| {
                    Error::template("'{{ . }}' used outside of a section".to_string())
                })?;
                out.push_str(item);
            }
            Node::Field(name) => match fields.get(name) {
                Some(FieldValue::Text(text)) => out.push_str(text),
                Some(FieldValue::List(items)) => out.push_str(&items.join("\n")),
                Some(FieldValue::Absent) => {
                    return Err(Error::template(format!(
                        "optional field '{name}' is not set; wrap it in '{{{{#{name}}}}}...{{{{/{name}}}}}'"
                    )));
                }
                None => return Err(Error::template(format!("unknown field '{}'", name))),
            },
            Node::Section { name, body } => match fields.get(name) {
                Some(FieldValue::List(items)) => {
                    for entry in items {
                        render_nodes(body, fields, Some(entry.as_str()), out)?;
                    }
                }
                Some(FieldValue::Text(text)) => render_nodes(body, fields, Some(text), out)?,
                Some(FieldValue::Absent) => {}
                None => return Err(Error::template(format!("unknown section '{}'", name))),
            },
        }
    }
    Ok(())
}
