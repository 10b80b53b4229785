//! # restnode
//!
//! A path-templated REST resource-node runtime: typed client trees derived
//! from a resource-path grammar, with per-node path-parameter binding,
//! collection indexing, and request building: the structural core of a
//! generated REST SDK, without the generated boilerplate.
//!
//! ## Overview
//!
//! - [`ResourceNode`]: one point in the resource-path tree, holding bound
//!   path parameters; descent (`child`, `item`) is copy-on-extend and never
//!   mutates the parent.
//! - [`Operation`]: one generic descriptor (verb, body-required flag,
//!   response shape) interpreted by a single executor on the node.
//! - [`EndpointSet`] / [`ResourceTree`]: declarative description rows folded
//!   into one recursive tree, walked to mint bound nodes.
//!
//! The actual HTTP exchange lives behind the [`Adapter`] trait from
//! `restnode-core`; `restnode-http` provides a reqwest-based implementation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use restnode::{Operation, RequestConfig, ResourceNode, ResponseShape};
//! use restnode_core::CancellationToken;
//!
//! let users = ResourceNode::root(adapter, "https://id.example.com")?
//!     .child("admin")?
//!     .child("realms")?
//!     .item("realm", "master")?
//!     .child("users")?;
//!
//! let list: Vec<UserRepresentation> = users
//!     .send_collection(
//!         &Operation::get(ResponseShape::Collection),
//!         None,
//!         &RequestConfig::new().query("max", "20"),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
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

mod endpoint;
mod node;
mod operation;

pub use endpoint::{EndpointDef, EndpointSet, ResourceTree, TreeNode};
pub use node::{BASE_PLACEHOLDER, Payload, ResourceNode};
pub use operation::{Operation, RequestConfig, ResponseShape};

// Re-export the foundation types callers need alongside the runtime.
pub use restnode_core::{
    Adapter, Bindings, Body, CancellationToken, Error, Method, PathTemplate, RequestSpec,
    ResponseBody, Result, Segment,
};
