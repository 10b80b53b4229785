//! Declarative endpoint sets and the folded resource tree.
//!
//! The generator feeding this runtime resolves an API description into rows
//! of (path template, verb, response shape). [`EndpointSet`] holds those
//! rows, validates their templates, and folds them into one recursive
//! [`ResourceTree`]: a single tree type walked to mint bound nodes, instead
//! of one generated type per path segment.

use std::collections::BTreeMap;
use std::sync::Arc;

use restnode_core::{Adapter, Error, Method, PathTemplate, Result, Segment};
use serde::Deserialize;

use crate::node::{BASE_PLACEHOLDER, ResourceNode};
use crate::operation::{Operation, ResponseShape};

/// One row of a resolved API description.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointDef {
    /// Path template, e.g. `/admin/realms/{realm}/users/{user-id}`.
    pub path: String,
    /// HTTP verb valid at that path.
    pub method: Method,
    /// Declared response shape; defaults to a single object.
    #[serde(default)]
    pub shape: ResponseShape,
    /// Whether the operation requires a request body.
    #[serde(default)]
    pub body_required: bool,
}

impl EndpointDef {
    /// The operation descriptor for this row.
    pub fn operation(&self) -> Operation {
        Operation {
            method: self.method,
            shape: self.shape,
            body_required: self.body_required,
        }
    }
}

/// Serialized form of an endpoint description document.
#[derive(Debug, Deserialize)]
struct Description {
    endpoints: Vec<EndpointDef>,
}

/// A validated set of endpoint rows sharing one base URL placeholder.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    endpoints: Vec<(PathTemplate, EndpointDef)>,
}

impl EndpointSet {
    /// Build a set from rows, validating each path template.
    pub fn from_defs(defs: Vec<EndpointDef>) -> Result<Self> {
        let mut endpoints = Vec::with_capacity(defs.len());
        for def in defs {
            let template = PathTemplate::parse(&def.path)?;
            endpoints.push((template, def));
        }
        Ok(Self { endpoints })
    }

    /// Parse a description document holding `{"endpoints": [...]}`.
    ///
    /// Detects JSON or YAML based on content, JSON first.
    pub fn parse(content: &str) -> Result<Self> {
        let description: Description = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)
                .map_err(|e| Error::Deserialization(format!("endpoint description: {e}")))?
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| Error::Deserialization(format!("endpoint description: {e}")))?
        };
        Self::from_defs(description.endpoints)
    }

    /// Number of endpoint rows.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Iterate the validated rows.
    pub fn iter(&self) -> impl Iterator<Item = (&PathTemplate, &EndpointDef)> {
        self.endpoints.iter().map(|(t, d)| (t, d))
    }

    /// Fold the rows into a resource tree.
    pub fn tree(&self) -> ResourceTree {
        let mut tree = ResourceTree::default();
        for (template, def) in &self.endpoints {
            tree.insert(template, def.operation());
        }
        tree
    }

    /// Mint the root node for this description against a concrete base URL.
    ///
    /// Every row must anchor on the `{+baseurl}` prefix the minted root
    /// binds; a row with a different or missing prefix could never be
    /// reached by descent from that root.
    pub fn bind_root(&self, adapter: Arc<dyn Adapter>, base_url: &str) -> Result<ResourceNode> {
        for (template, def) in &self.endpoints {
            if template.base() != Some(BASE_PLACEHOLDER) {
                return Err(Error::Template(format!(
                    "endpoint {} is not anchored on {{+{BASE_PLACEHOLDER}}}",
                    def.path
                )));
            }
        }
        ResourceNode::root(adapter, base_url)
    }
}

/// Recursive resource-path tree: one node per path segment, literal children
/// keyed by their text and placeholder children keyed as `{name}`.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    root: TreeNode,
}

impl ResourceTree {
    fn insert(&mut self, template: &PathTemplate, operation: Operation) {
        let mut node = &mut self.root;
        for segment in template.segments() {
            node = node.children.entry(segment_key(segment)).or_default();
        }
        node.operations.push(operation);
    }

    /// The tree's root node (the service base).
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Look up a node by template-space path, e.g.
    /// `admin/realms/{realm}/users`.
    pub fn at(&self, path: &str) -> Option<&TreeNode> {
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// The operation with the given verb at a template-space path, if any.
    pub fn operation(&self, method: Method, path: &str) -> Option<&Operation> {
        self.at(path)?
            .operations
            .iter()
            .find(|op| op.method == method)
    }
}

/// One point of the resource tree.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    children: BTreeMap<String, TreeNode>,
    operations: Vec<Operation>,
}

impl TreeNode {
    /// Operations valid at this node.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Child node for a segment key (`users` or `{user-id}`).
    pub fn child(&self, key: &str) -> Option<&TreeNode> {
        self.children.get(key)
    }

    /// Iterate child segments in lexicographic order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn segment_key(segment: &Segment) -> String {
    match segment {
        Segment::Literal(literal) => literal.clone(),
        Segment::Placeholder(name) => format!("{{{name}}}"),
    }
}
