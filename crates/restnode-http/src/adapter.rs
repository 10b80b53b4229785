//! reqwest-based adapter implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, header};
use tracing::{debug, warn};

use restnode_core::{
    Adapter, CancellationToken, Error, Method, RequestSpec, ResponseBody, Result,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP adapter configuration.
#[derive(Clone, Debug)]
pub struct HttpAdapterConfig {
    /// Request timeout, enforced by the underlying client.
    pub timeout: Duration,

    /// Bearer token attached to every request as `Authorization`.
    pub auth_token: Option<String>,

    /// Default headers attached to every request before per-request ones.
    pub headers: HashMap<String, String>,

    /// User agent string (set to `None` to disable the `User-Agent` header).
    ///
    /// Default: `restnode/{version}`
    pub user_agent: Option<String>,
}

impl Default for HttpAdapterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auth_token: None,
            headers: HashMap::new(),
            user_agent: Some(format!("restnode/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// [`Adapter`] implementation backed by one pooled `reqwest::Client`.
///
/// Constructed once and shared by every node; the inner `reqwest::Client`
/// is cheap to clone and safe for concurrent use. One `send` is one
/// request/response round trip with no retries.
#[derive(Clone, Debug)]
pub struct HttpAdapter {
    config: HttpAdapterConfig,
    http_client: HttpClient,
}

impl HttpAdapter {
    /// Build an adapter and its pooled client from a configuration.
    pub fn new(config: HttpAdapterConfig) -> Result<Self> {
        // Explicit rustls: cargo features are additive and another dependency
        // may bring in native-tls.
        let mut builder = HttpClient::builder()
            .use_rustls_tls()
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let http_client = builder
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build an adapter around an existing `reqwest::Client`.
    ///
    /// The caller keeps responsibility for the client's timeout settings.
    pub fn with_client(http_client: HttpClient, config: HttpAdapterConfig) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn build_headers(&self, spec: &RequestSpec) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();

        // Skip invalid header values rather than panic.
        for (name, value) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        for (name, value) in &spec.headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                header::HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        if let Some(token) = &self.config.auth_token
            && let Ok(value) = header::HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(header::AUTHORIZATION, value);
        }

        headers
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
    async fn send(&self, spec: RequestSpec, cancel: CancellationToken) -> Result<ResponseBody> {
        debug!("sending {} {}", spec.method, spec.url);

        let headers = self.build_headers(&spec);
        let mut request = self
            .http_client
            .request(reqwest_method(spec.method), &spec.url)
            .headers(headers);

        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }

        if let Some(body) = spec.body {
            request = request
                .header(header::CONTENT_TYPE, body.content_type().to_string())
                .body(body.into_bytes());
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;

            let status = response.status();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;

            if !status.is_success() {
                warn!("{} {} answered {}", spec.method, spec.url, status);
                return Err(Error::Api {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }

            Ok(ResponseBody {
                status: status.as_u16(),
                content_type,
                bytes,
            })
        };

        // Dropping the exchange future aborts the in-flight call; no partial
        // result ever escapes.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("{} {} cancelled", spec.method, spec.url);
                Err(Error::Cancelled)
            }
            result = exchange => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HttpAdapterConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.auth_token.is_none());
        assert!(config.user_agent.unwrap().starts_with("restnode/"));
    }

    #[test]
    fn header_assembly_precedence() {
        let mut config = HttpAdapterConfig::default();
        config
            .headers
            .insert("X-Tenant".to_string(), "default".to_string());
        config.auth_token = Some("secret".to_string());
        let adapter = HttpAdapter::new(config).unwrap();

        let spec = RequestSpec::new(Method::Get, "https://api.example.com")
            .header("Accept", "application/json")
            .header("X-Tenant", "override");
        let headers = adapter.build_headers(&spec);

        // Per-request headers win over configured defaults.
        assert_eq!(headers.get("x-tenant").unwrap(), "override");
        assert_eq!(headers.get("accept").unwrap(), "application/json");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer secret");
    }

    #[test]
    fn invalid_header_values_are_skipped() {
        let mut config = HttpAdapterConfig::default();
        config
            .headers
            .insert("X-Bad".to_string(), "line\nbreak".to_string());
        let adapter = HttpAdapter::new(config).unwrap();

        let headers = adapter.build_headers(&RequestSpec::new(Method::Get, "https://x"));
        assert!(headers.get("x-bad").is_none());
    }
}
