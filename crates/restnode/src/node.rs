//! Bound resource nodes and the operation executor.
//!
//! A [`ResourceNode`] represents one point in the resource-path tree: a path
//! template plus the placeholder values bound so far, sharing one adapter
//! with every other node of the same client. Nodes are immutable; descending
//! into a child produces a new node and never touches the parent, so sibling
//! nodes derived from the same root can be used concurrently without locking.

use std::sync::Arc;

use bytes::Bytes;
use restnode_core::{
    Adapter, Bindings, Body, CancellationToken, Error, PathTemplate, RequestSpec, ResponseBody,
    Result, encode_segment,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::operation::{Operation, RequestConfig, ResponseShape};

/// Placeholder name used for the resolved service base URL.
pub const BASE_PLACEHOLDER: &str = "baseurl";

/// Where a node's requests go: a template with bindings, or a raw URL.
#[derive(Debug, Clone)]
enum Target {
    Template {
        template: PathTemplate,
        bindings: Bindings,
    },
    /// Arbitrary absolute URL; template substitution is bypassed entirely.
    Raw(String),
}

/// One point in the resource-path tree, carrying bound path-parameter values.
///
/// Construction never performs I/O; the node holds no state beyond its
/// immutable bindings and the shared adapter reference.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    adapter: Arc<dyn Adapter>,
    target: Target,
}

impl ResourceNode {
    /// Build a node from a template string and a full parameter mapping.
    pub fn new(
        adapter: Arc<dyn Adapter>,
        template: &str,
        bindings: Bindings,
    ) -> Result<Self> {
        Ok(Self {
            adapter,
            target: Target::Template {
                template: PathTemplate::parse(template)?,
                bindings,
            },
        })
    }

    /// Build the root node of a service: template `{+baseurl}` with the
    /// given base URL bound.
    pub fn root(adapter: Arc<dyn Adapter>, base_url: &str) -> Result<Self> {
        url::Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        Self::new(
            adapter,
            &format!("{{+{BASE_PLACEHOLDER}}}"),
            Bindings::new().bind(BASE_PLACEHOLDER, base_url),
        )
    }

    /// Build a node from an already-resolved absolute URL.
    ///
    /// Exists so callers can follow server-provided links (pagination and the
    /// like) without re-deriving them from the template grammar.
    pub fn from_raw_url(adapter: Arc<dyn Adapter>, raw_url: &str) -> Result<Self> {
        url::Url::parse(raw_url).map_err(|e| Error::InvalidUrl(format!("{raw_url}: {e}")))?;
        Ok(Self {
            adapter,
            target: Target::Raw(raw_url.to_string()),
        })
    }

    /// Rebuild this node against an arbitrary absolute URL, keeping the
    /// shared adapter. Subsequent operations use the raw URL as-is.
    pub fn with_url(&self, raw_url: &str) -> Result<Self> {
        Self::from_raw_url(Arc::clone(&self.adapter), raw_url)
    }

    /// Descend into a fixed child segment. Bindings are inherited unchanged.
    pub fn child(&self, segment: &str) -> Result<Self> {
        let target = match &self.target {
            Target::Template { template, bindings } => Target::Template {
                template: template.join_literal(segment)?,
                bindings: bindings.clone(),
            },
            Target::Raw(url) => {
                if segment.is_empty() || segment.contains('/') {
                    return Err(Error::Template(format!("invalid child segment: {segment}")));
                }
                Target::Raw(splice_raw_segment(url, segment))
            }
        };
        Ok(Self {
            adapter: Arc::clone(&self.adapter),
            target,
        })
    }

    /// Descend into an indexable child: the template gains a `{name}`
    /// segment and the returned node binds `name` to `value`. The parent's
    /// binding map is copied, never mutated.
    ///
    /// On a raw-URL node the identifier is appended as an encoded path
    /// segment and `name` is not recorded.
    pub fn item(&self, name: &str, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let target = match &self.target {
            Target::Template { template, bindings } => Target::Template {
                template: template.join_placeholder(name)?,
                bindings: bindings.with(name, value),
            },
            Target::Raw(url) => Target::Raw(splice_raw_segment(url, &encode_segment(&value))),
        };
        Ok(Self {
            adapter: Arc::clone(&self.adapter),
            target,
        })
    }

    /// The node's effective bindings; `None` for raw-URL nodes.
    pub fn bindings(&self) -> Option<&Bindings> {
        match &self.target {
            Target::Template { bindings, .. } => Some(bindings),
            Target::Raw(_) => None,
        }
    }

    /// The node's path template; `None` for raw-URL nodes.
    pub fn template(&self) -> Option<&PathTemplate> {
        match &self.target {
            Target::Template { template, .. } => Some(template),
            Target::Raw(_) => None,
        }
    }

    /// Resolve the node's URL with its current bindings.
    pub fn url(&self) -> Result<String> {
        match &self.target {
            Target::Template { template, bindings } => template.resolve(bindings),
            Target::Raw(url) => Ok(url.clone()),
        }
    }

    /// Build the request description for one operation at this node.
    ///
    /// Fails before any I/O: [`Error::ArgumentMissing`] when a required body
    /// is absent, [`Error::UnresolvedPath`] when a placeholder is unbound.
    pub fn to_request(
        &self,
        op: &Operation,
        config: &RequestConfig,
        body: Option<Body>,
    ) -> Result<RequestSpec> {
        if op.body_required && body.is_none() {
            return Err(Error::ArgumentMissing);
        }

        let mut spec = RequestSpec::new(op.method, self.url()?).header("Accept", op.accept());
        for (name, value) in &config.headers {
            spec = spec.header(name.clone(), value.clone());
        }
        for (name, value) in &config.query {
            spec = spec.query(name.clone(), value.clone());
        }
        if let Some(body) = body {
            spec = spec.body(body);
        }
        Ok(spec)
    }

    /// Execute one operation and return the undecoded response.
    ///
    /// Exactly one adapter call per invocation: no retry, no caching, no
    /// backoff. Adapter failures propagate unchanged.
    pub async fn execute(
        &self,
        op: &Operation,
        body: Option<Body>,
        config: &RequestConfig,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        let spec = self.to_request(op, config, body)?;
        self.adapter.send(spec, cancel.clone()).await
    }

    /// Execute one operation and decode the response per the descriptor's
    /// declared shape.
    pub async fn invoke(
        &self,
        op: &Operation,
        body: Option<Body>,
        config: &RequestConfig,
        cancel: &CancellationToken,
    ) -> Result<Payload> {
        let response = self.execute(op, body, config, cancel).await?;
        match op.shape {
            ResponseShape::Single => Ok(Payload::Single(decode(&response)?)),
            ResponseShape::Collection => Ok(Payload::Collection(decode(&response)?)),
            ResponseShape::Raw => Ok(Payload::Raw(response.bytes)),
        }
    }

    /// Execute an operation declared [`ResponseShape::Single`] and decode
    /// into `T`.
    pub async fn send_single<T: DeserializeOwned>(
        &self,
        op: &Operation,
        body: Option<Body>,
        config: &RequestConfig,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.execute(op, body, config, cancel).await?;
        decode(&response)
    }

    /// Execute an operation declared [`ResponseShape::Collection`] and
    /// decode into an ordered `Vec<T>`, preserving the payload order.
    pub async fn send_collection<T: DeserializeOwned>(
        &self,
        op: &Operation,
        body: Option<Body>,
        config: &RequestConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let response = self.execute(op, body, config, cancel).await?;
        decode(&response)
    }

    /// Execute an operation declared [`ResponseShape::Raw`] and return the
    /// raw payload bytes; may be empty (e.g. 204 No Content).
    pub async fn send_raw(
        &self,
        op: &Operation,
        body: Option<Body>,
        config: &RequestConfig,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        let response = self.execute(op, body, config, cancel).await?;
        Ok(response.bytes)
    }
}

/// A decoded operation result, shaped per the operation descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// One parsed object.
    Single(Value),
    /// An ordered sequence of parsed objects.
    Collection(Vec<Value>),
    /// Raw bytes for endpoints with no structured response schema.
    Raw(Bytes),
}

fn decode<T: DeserializeOwned>(response: &ResponseBody) -> Result<T> {
    serde_json::from_slice(&response.bytes).map_err(|e| Error::Deserialization(e.to_string()))
}

/// Insert one path segment into a raw URL, ahead of any query string or
/// fragment the URL carries.
fn splice_raw_segment(url: &str, segment: &str) -> String {
    match url.find(['?', '#']) {
        Some(index) => format!("{}/{segment}{}", &url[..index], &url[index..]),
        None => format!("{url}/{segment}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use restnode_core::Method;
    use serde::Deserialize;

    use super::*;

    /// Adapter double that records every spec it sees and can either answer
    /// with canned bytes or park until cancelled.
    #[derive(Debug, Default)]
    struct SpyAdapter {
        calls: AtomicUsize,
        aborts: AtomicUsize,
        canned: Mutex<Option<ResponseBody>>,
        last_spec: Mutex<Option<RequestSpec>>,
        park_until_cancelled: bool,
    }

    impl SpyAdapter {
        fn answering(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                canned: Mutex::new(Some(ResponseBody {
                    status,
                    content_type: Some("application/json".into()),
                    bytes: Bytes::copy_from_slice(body.as_bytes()),
                })),
                ..Self::default()
            })
        }

        fn parked() -> Arc<Self> {
            Arc::new(Self {
                park_until_cancelled: true,
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn aborts(&self) -> usize {
            self.aborts.load(Ordering::SeqCst)
        }

        fn last_spec(&self) -> Option<RequestSpec> {
            self.last_spec.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Adapter for SpyAdapter {
        async fn send(
            &self,
            spec: RequestSpec,
            cancel: CancellationToken,
        ) -> Result<ResponseBody> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_spec.lock().unwrap() = Some(spec);

            if self.park_until_cancelled {
                cancel.cancelled().await;
                self.aborts.fetch_add(1, Ordering::SeqCst);
                return Err(Error::Cancelled);
            }

            Ok(self
                .canned
                .lock()
                .unwrap()
                .take()
                .unwrap_or(ResponseBody {
                    status: 204,
                    content_type: None,
                    bytes: Bytes::new(),
                }))
        }
    }

    fn users_node(adapter: Arc<SpyAdapter>) -> ResourceNode {
        ResourceNode::root(adapter, "https://id.example.com")
            .unwrap()
            .child("admin")
            .unwrap()
            .child("realms")
            .unwrap()
            .item("realm", "master")
            .unwrap()
            .child("users")
            .unwrap()
    }

    #[test]
    fn child_extends_template_and_keeps_bindings() {
        let node = users_node(SpyAdapter::answering(200, "[]"));
        let counted = node.child("count").unwrap();

        assert_eq!(
            counted.template().unwrap().to_string(),
            "{+baseurl}/admin/realms/{realm}/users/count"
        );
        assert_eq!(counted.bindings(), node.bindings());
    }

    #[test]
    fn item_copies_bindings_without_aliasing() {
        let node = users_node(SpyAdapter::answering(200, "[]"));
        let user = node.item("user-id", "42").unwrap();

        assert_eq!(user.bindings().unwrap().get("user-id"), Some("42"));
        assert_eq!(user.bindings().unwrap().get("realm"), Some("master"));
        // The parent is untouched by the descent.
        assert!(!node.bindings().unwrap().contains("user-id"));
        assert_eq!(node.bindings().unwrap().len(), 2);
    }

    #[test]
    fn sibling_items_are_independent() {
        let node = users_node(SpyAdapter::answering(200, "[]"));
        let alice = node.item("user-id", "alice").unwrap();
        let bob = node.item("user-id", "bob").unwrap();

        assert_eq!(alice.url().unwrap(), "https://id.example.com/admin/realms/master/users/alice");
        assert_eq!(bob.url().unwrap(), "https://id.example.com/admin/realms/master/users/bob");
    }

    #[test]
    fn to_request_sets_accept_and_merges_config() {
        let node = users_node(SpyAdapter::answering(200, "[]"));
        let config = RequestConfig::new()
            .query("first", "0")
            .query("max", "20")
            .header("X-Request-Id", "abc");

        let spec = node
            .to_request(&Operation::get(ResponseShape::Collection), &config, None)
            .unwrap();

        assert_eq!(spec.method, Method::Get);
        assert_eq!(spec.url, "https://id.example.com/admin/realms/master/users");
        assert_eq!(spec.header_value("accept"), Some("application/json"));
        assert_eq!(spec.header_value("x-request-id"), Some("abc"));
        assert_eq!(spec.query.len(), 2);
        assert!(spec.body.is_none());
    }

    #[test]
    fn to_request_fails_on_unbound_placeholder() {
        let adapter = SpyAdapter::answering(200, "[]");
        let node = ResourceNode::new(
            adapter,
            "{+baseurl}/admin/realms/{realm}",
            Bindings::new().bind("baseurl", "https://id.example.com"),
        )
        .unwrap();

        let err = node
            .to_request(&Operation::get(ResponseShape::Single), &RequestConfig::new(), None)
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedPath { ref name } if name == "realm"));
    }

    #[tokio::test]
    async fn missing_required_body_fails_before_any_adapter_call() {
        let adapter = SpyAdapter::answering(201, "{}");
        let node = users_node(Arc::clone(&adapter));

        let err = node
            .send_raw(
                &Operation::post(ResponseShape::Raw),
                None,
                &RequestConfig::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ArgumentMissing));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn collection_preserves_payload_order() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            username: String,
        }

        let adapter =
            SpyAdapter::answering(200, r#"[{"username":"a"},{"username":"b"}]"#);
        let node = users_node(Arc::clone(&adapter));

        let users: Vec<User> = node
            .send_collection(
                &Operation::get(ResponseShape::Collection),
                None,
                &RequestConfig::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(users, vec![
            User {
                username: "a".into()
            },
            User {
                username: "b".into()
            },
        ]);
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn invoke_decodes_per_declared_shape() {
        let adapter = SpyAdapter::answering(200, r#"{"realm":"master"}"#);
        let node = users_node(Arc::clone(&adapter));

        let payload = node
            .invoke(
                &Operation::get(ResponseShape::Single),
                None,
                &RequestConfig::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let Payload::Single(value) = payload else {
            panic!("expected single payload");
        };
        assert_eq!(value["realm"], "master");
    }

    #[tokio::test]
    async fn malformed_payload_is_a_deserialization_failure() {
        let adapter = SpyAdapter::answering(200, "not json");
        let node = users_node(adapter);

        let err = node
            .send_single::<Value>(
                &Operation::get(ResponseShape::Single),
                None,
                &RequestConfig::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[tokio::test]
    async fn cancellation_aborts_exactly_once() {
        let adapter = SpyAdapter::parked();
        let node = users_node(Arc::clone(&adapter));
        let cancel = CancellationToken::new();

        let task = {
            let node = node.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                node.send_raw(
                    &Operation::get(ResponseShape::Raw),
                    None,
                    &RequestConfig::new(),
                    &cancel,
                )
                .await
            })
        };

        // Let the request reach the adapter before cancelling.
        tokio::task::yield_now().await;
        cancel.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(adapter.calls(), 1);
        assert_eq!(adapter.aborts(), 1);
    }

    #[tokio::test]
    async fn body_travels_with_content_type() {
        let adapter = SpyAdapter::answering(201, "{}");
        let node = users_node(Arc::clone(&adapter));

        node.send_raw(
            &Operation::post(ResponseShape::Raw),
            Some(Body::json(&serde_json::json!({"username": "a"})).unwrap()),
            &RequestConfig::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let spec = adapter.last_spec().unwrap();
        let body = spec.body.as_ref().expect("body forwarded to adapter");
        assert_eq!(body.content_type(), "application/json");
        assert_eq!(spec.header_value("accept"), Some("*/*"));
    }

    #[test]
    fn raw_url_bypasses_template_substitution() {
        let adapter = SpyAdapter::answering(200, "[]");
        let node = users_node(Arc::clone(&adapter));

        let next_page = node
            .with_url("https://id.example.com/admin/realms/master/users?first=20")
            .unwrap();

        assert!(next_page.template().is_none());
        assert!(next_page.bindings().is_none());
        assert_eq!(
            next_page.url().unwrap(),
            "https://id.example.com/admin/realms/master/users?first=20"
        );
    }

    #[test]
    fn raw_url_descent_appends_segments() {
        let adapter = SpyAdapter::answering(200, "{}");
        let node = ResourceNode::from_raw_url(adapter, "https://id.example.com/admin").unwrap();

        let sessions = node
            .child("sessions")
            .unwrap()
            .item("session-id", "s 1")
            .unwrap();
        assert_eq!(
            sessions.url().unwrap(),
            "https://id.example.com/admin/sessions/s%201"
        );
    }

    #[test]
    fn raw_url_descent_keeps_query_string_after_segments() {
        let adapter = SpyAdapter::answering(200, "[]");
        let node = ResourceNode::from_raw_url(
            adapter,
            "https://id.example.com/admin/realms/master/users?first=20&max=20",
        )
        .unwrap();

        let counted = node.child("count").unwrap();
        assert_eq!(
            counted.url().unwrap(),
            "https://id.example.com/admin/realms/master/users/count?first=20&max=20"
        );

        let indexed = node.item("user-id", "u 1").unwrap();
        assert_eq!(
            indexed.url().unwrap(),
            "https://id.example.com/admin/realms/master/users/u%201?first=20&max=20"
        );
    }

    #[test]
    fn invalid_urls_are_rejected_up_front() {
        let adapter = SpyAdapter::answering(200, "{}");
        assert!(matches!(
            ResourceNode::root(Arc::clone(&adapter) as Arc<dyn Adapter>, "not a url"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            ResourceNode::from_raw_url(adapter, "/relative/only"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
