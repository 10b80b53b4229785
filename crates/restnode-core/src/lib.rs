//! # restnode-core
//!
//! Foundation types for the restnode resource-node runtime.
//! This crate provides the abstractions the runtime and every adapter
//! implementation depend on.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Templates**: [`PathTemplate`], [`Segment`], [`Bindings`]
//! - **Requests**: [`Method`], [`Body`], [`RequestSpec`], [`ResponseBody`]
//! - **Errors**: [`Error`], [`Result`]
//! - **Traits**: [`Adapter`]
//!
//! ## Usage
//!
//! Adapter implementations should depend on this crate and implement the
//! [`Adapter`] trait:
//!
//! ```rust,ignore
//! use restnode_core::{Adapter, CancellationToken, RequestSpec, ResponseBody, Result};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct MyAdapter { /* ... */ }
//!
//! #[async_trait]
//! impl Adapter for MyAdapter {
//!     async fn send(&self, spec: RequestSpec, cancel: CancellationToken) -> Result<ResponseBody> {
//!         /* ... */
//!     }
//! }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod adapter;
mod error;
mod request;
mod template;

pub use adapter::{Adapter, CancellationToken};
pub use error::{Error, Result};
pub use request::{Body, Method, RequestSpec, ResponseBody};
pub use template::{Bindings, PathTemplate, Segment, encode_segment};
