//! # restnode-http
//!
//! reqwest-based [`Adapter`](restnode_core::Adapter) for the restnode
//! resource-node runtime.
//!
//! One [`HttpAdapter`] wraps one pooled `reqwest::Client` and is shared by
//! every node minted from it. Configuration covers the request timeout,
//! an optional bearer token, default headers, and the user agent; everything
//! else about a request comes from the node's `RequestSpec`.
//!
//! ```rust,ignore
//! use restnode_http::{HttpAdapter, HttpAdapterConfig};
//!
//! let adapter = HttpAdapter::new(HttpAdapterConfig {
//!     auth_token: Some(token),
//!     ..HttpAdapterConfig::default()
//! })?;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod adapter;

pub use adapter::{HttpAdapter, HttpAdapterConfig};
