//! Operation descriptors and per-request configuration.
//!
//! Instead of one generated request-builder type per endpoint, a single
//! [`Operation`] value describes what varies between endpoints at the same
//! node: the verb, whether a body is required, and the declared response
//! shape. One executor on the node interprets every descriptor uniformly.

use restnode_core::Method;
use serde::Deserialize;

/// The declared shape of an operation's response, fixed at description time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// One parsed object.
    #[default]
    Single,
    /// An ordered sequence of parsed objects.
    Collection,
    /// Raw bytes; used for endpoints with no structured response schema.
    Raw,
}

/// Describes one HTTP operation valid at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// HTTP verb.
    pub method: Method,
    /// Declared response shape.
    pub shape: ResponseShape,
    /// Whether a request body must be supplied by the caller.
    pub body_required: bool,
}

impl Operation {
    /// Create a descriptor with no required body.
    pub fn new(method: Method, shape: ResponseShape) -> Self {
        Self {
            method,
            shape,
            body_required: false,
        }
    }

    /// A GET with the given response shape.
    pub fn get(shape: ResponseShape) -> Self {
        Self::new(Method::Get, shape)
    }

    /// A POST with the given response shape and a required body.
    pub fn post(shape: ResponseShape) -> Self {
        Self::new(Method::Post, shape).require_body()
    }

    /// A PUT with the given response shape and a required body.
    pub fn put(shape: ResponseShape) -> Self {
        Self::new(Method::Put, shape).require_body()
    }

    /// A DELETE with a raw response shape.
    pub fn delete() -> Self {
        Self::new(Method::Delete, ResponseShape::Raw)
    }

    /// Mark the request body as required.
    #[must_use]
    pub fn require_body(mut self) -> Self {
        self.body_required = true;
        self
    }

    /// Mark the request body as optional.
    #[must_use]
    pub fn optional_body(mut self) -> Self {
        self.body_required = false;
        self
    }

    /// The `Accept` header value matching the declared response shape.
    pub fn accept(&self) -> &'static str {
        match self.shape {
            ResponseShape::Single | ResponseShape::Collection => "application/json",
            ResponseShape::Raw => "*/*",
        }
    }
}

/// Per-request configuration: extra headers and query parameters.
///
/// Replaces the configuration-callback pattern with a plain optional value;
/// the default adds nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfig {
    /// Extra header name/value pairs, appended after the operation's own.
    pub headers: Vec<(String, String)>,
    /// Query-parameter name/value pairs, in insertion order.
    pub query: Vec<(String, String)>,
}

impl RequestConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}
