//! URL path templates and placeholder bindings.
//!
//! A template is an ordered sequence of segments, each either a literal or a
//! named placeholder, with an optional `{+name}` prefix that expands to an
//! already-resolved base URL. Placeholder names in the template text may carry
//! percent-encoded reserved characters (`user%2Did`); the parsed name is the
//! decoded form (`user-id`).

use std::collections::HashMap;
use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::error::{Error, Result};

/// Characters escaped when substituting a bound value into a path segment.
const SEGMENT_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'\\');

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A fixed path segment, never empty.
    Literal(String),
    /// A named placeholder, bound to a concrete value before resolution.
    Placeholder(String),
}

/// An ordered sequence of path segments with an optional raw base prefix.
///
/// Invariants, enforced at construction: placeholder names are unique within
/// a template, and literal segments are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// Name of the `{+name}` raw-expansion prefix, if present. Its bound
    /// value is substituted verbatim (minus any trailing slash).
    base: Option<String>,
    /// Whether the template (after the base prefix, if any) starts with `/`.
    rooted: bool,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template string such as
    /// `{+baseurl}/admin/realms/{realm}/users/{user%2Did}`.
    pub fn parse(template: &str) -> Result<Self> {
        let mut rest = template;
        let mut base = None;

        if let Some(after) = rest.strip_prefix("{+") {
            let end = after
                .find('}')
                .ok_or_else(|| Error::Template(format!("unterminated base prefix: {template}")))?;
            let name = decode_name(&after[..end])?;
            if name.is_empty() {
                return Err(Error::Template("empty base prefix name".into()));
            }
            base = Some(name);
            rest = &after[end + 1..];
        }

        let rooted = rest.starts_with('/');
        let rest = rest.strip_prefix('/').unwrap_or(rest);

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for chunk in rest.split('/') {
                segments.push(parse_segment(chunk)?);
            }
        }

        let template = Self {
            base,
            rooted,
            segments,
        };
        template.check_unique_placeholders()?;
        Ok(template)
    }

    /// Name of the raw base prefix, if the template has one.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The template's segments, in path order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// All placeholder names in resolution order, the base prefix first.
    pub fn placeholder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(base) = &self.base {
            names.push(base);
        }
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                names.push(name);
            }
        }
        names
    }

    /// Extend the template with a fixed literal segment.
    pub fn join_literal(&self, segment: &str) -> Result<Self> {
        let parsed = parse_segment(segment)?;
        let Segment::Literal(_) = parsed else {
            return Err(Error::Template(format!(
                "expected a literal segment, got placeholder: {segment}"
            )));
        };
        let mut next = self.clone();
        next.segments.push(parsed);
        Ok(next)
    }

    /// Extend the template with a named placeholder segment.
    pub fn join_placeholder(&self, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Template("empty placeholder name".into()));
        }
        let mut next = self.clone();
        next.segments.push(Segment::Placeholder(name.to_string()));
        next.check_unique_placeholders()?;
        Ok(next)
    }

    /// Substitute every placeholder with its bound value, in template order.
    ///
    /// The base prefix value is inserted verbatim (minus any trailing slash);
    /// segment values are percent-encoded. An unbound placeholder yields
    /// [`Error::UnresolvedPath`].
    pub fn resolve(&self, bindings: &Bindings) -> Result<String> {
        let mut out = String::new();

        if let Some(name) = &self.base {
            let value = bindings.get(name).ok_or_else(|| Error::UnresolvedPath {
                name: name.clone(),
            })?;
            out.push_str(value.trim_end_matches('/'));
        }

        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 || self.base.is_some() || self.rooted {
                out.push('/');
            }
            match segment {
                Segment::Literal(literal) => out.push_str(literal),
                Segment::Placeholder(name) => {
                    let value = bindings.get(name).ok_or_else(|| Error::UnresolvedPath {
                        name: name.clone(),
                    })?;
                    out.push_str(&utf8_percent_encode(value, SEGMENT_ESCAPE).to_string());
                }
            }
        }

        if self.segments.is_empty() && self.base.is_none() && self.rooted {
            out.push('/');
        }

        Ok(out)
    }

    fn check_unique_placeholders(&self) -> Result<()> {
        let names = self.placeholder_names();
        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                return Err(Error::Template(format!("duplicate placeholder: {name}")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PathTemplate {
    /// Renders the template in canonical decoded form, e.g.
    /// `{+baseurl}/users/{user-id}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(base) = &self.base {
            write!(f, "{{+{base}}}")?;
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 || self.base.is_some() || self.rooted {
                f.write_str("/")?;
            }
            match segment {
                Segment::Literal(literal) => f.write_str(literal)?,
                Segment::Placeholder(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// Percent-encode a value for use as a single path segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_ESCAPE).to_string()
}

fn parse_segment(chunk: &str) -> Result<Segment> {
    if chunk.is_empty() {
        return Err(Error::Template("empty literal segment".into()));
    }
    if let Some(inner) = chunk.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| Error::Template(format!("unterminated placeholder: {chunk}")))?;
        let name = decode_name(name)?;
        if name.is_empty() {
            return Err(Error::Template("empty placeholder name".into()));
        }
        return Ok(Segment::Placeholder(name));
    }
    if chunk.contains(['{', '}']) {
        return Err(Error::Template(format!("malformed segment: {chunk}")));
    }
    Ok(Segment::Literal(chunk.to_string()))
}

fn decode_name(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|name| name.into_owned())
        .map_err(|e| Error::Template(format!("invalid placeholder name {raw}: {e}")))
}

/// A placeholder-name to value mapping, extended copy-on-write during node
/// descent so sibling nodes never alias each other's bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume and extend with one binding; later bindings for the same name
    /// take precedence.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Return a copy extended with one binding, leaving `self` untouched.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.clone().bind(name, value)
    }

    /// Look up the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether a value is bound for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bound placeholders.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no placeholder is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
