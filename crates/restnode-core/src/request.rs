//! Wire-free request and response descriptions.
//!
//! A [`RequestSpec`] is the fully-resolved description of one HTTP call,
//! ready for an [`Adapter`](crate::Adapter) to execute. Building one never
//! performs I/O.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Retrieve a resource or collection.
    Get,
    /// Replace or update a resource.
    Put,
    /// Create a resource or invoke an action.
    Post,
    /// Remove a resource.
    Delete,
    /// Partially update a resource.
    Patch,
    /// Retrieve headers only.
    Head,
}

impl Method {
    /// Uppercase wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized request body plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    bytes: Bytes,
    content_type: String,
}

impl Body {
    /// Serialize a value to a JSON body with `application/json` content type.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            bytes: Bytes::from(bytes),
            content_type: "application/json".to_string(),
        })
    }

    /// Wrap already-serialized bytes with an explicit content type.
    pub fn bytes(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// The serialized payload.
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The payload's content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Consume the body and return its payload.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// The fully-resolved description of one HTTP call.
///
/// All placeholders are substituted by the time a spec exists; adapters treat
/// the URL as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,
    /// Resolved absolute or root-relative URL.
    pub url: String,
    /// Header name/value pairs, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Query-parameter name/value pairs, in insertion order.
    pub query: Vec<(String, String)>,
    /// Optional serialized body.
    pub body: Option<Body>,
}

impl RequestSpec {
    /// Create a spec with no headers, query parameters, or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Append a header, keeping insertion order.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter, keeping insertion order.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Attach a serialized body.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// First value of a header, looked up case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The undecoded result of one HTTP exchange, as returned by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` of the response, if the server sent one.
    pub content_type: Option<String>,
    /// Raw response payload; may be empty (e.g. 204 No Content).
    pub bytes: Bytes,
}

impl ResponseBody {
    /// Whether the response carried no payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
