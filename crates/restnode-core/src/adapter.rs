//! The adapter seam between the node runtime and an HTTP transport.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::{RequestSpec, ResponseBody};

pub use tokio_util::sync::CancellationToken;

/// The external HTTP transport consumed by the node runtime.
///
/// One adapter instance is constructed per client and shared by every node;
/// it holds whatever per-connection state it needs (pooling, auth-token
/// attachment) and must be safe for concurrent invocation from multiple
/// nodes; the `Send + Sync` bounds assert that contract here.
///
/// All resilience policy lives behind this trait: timeouts, retries, and
/// backoff are adapter concerns. The node layer issues exactly one
/// `send` per operation and propagates failures unchanged.
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    /// Execute one fully-resolved request.
    ///
    /// On cancellation of `cancel`, the in-flight call must be aborted and
    /// [`Error::Cancelled`](crate::Error::Cancelled) returned; no partial
    /// result is ever produced.
    async fn send(&self, spec: RequestSpec, cancel: CancellationToken) -> Result<ResponseBody>;
}
