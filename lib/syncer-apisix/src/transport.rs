//! HTTP transport for the gateway admin API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::fmt;
use syncer_core::{config::API_KEY, GatewayConfig, Result, SyncerError};
use tracing::debug;

/// Admin API methods used by the syncer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminMethod {
    Get,
    Put,
    Patch,
}

impl AdminMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminMethod::Get => "GET",
            AdminMethod::Put => "PUT",
            AdminMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for AdminMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdminRequest {
    pub method: AdminMethod,
    pub url: String,
    pub body: Option<String>,
}

impl AdminRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: AdminMethod::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn put(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: AdminMethod::Put,
            url: url.into(),
            body: Some(body.into()),
        }
    }

    pub fn patch(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: AdminMethod::Patch,
            url: url.into(),
            body: Some(body.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdminResponse {
    pub status: u16,
    pub body: String,
}

impl AdminResponse {
    /// Client or server error reported by the gateway
    pub fn is_rejection(&self) -> bool {
        self.status >= 400
    }
}

/// A single-attempt request/response exchange with the admin API.
///
/// Connection failures and timeouts are `SyncerError::Transport`; any HTTP
/// status, including errors, is returned as a response.
#[async_trait]
pub trait AdminTransport: Send + Sync {
    async fn send(&self, request: AdminRequest) -> Result<AdminResponse>;
}

/// reqwest-backed transport carrying the admin headers on every call
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key() {
            let value = HeaderValue::from_str(key).map_err(|e| {
                SyncerError::InvalidConfiguration(format!("invalid {} value: {}", API_KEY, e))
            })?;
            headers.insert(HeaderName::from_static("x-api-key"), value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| SyncerError::Transport {
                url: config.admin_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AdminTransport for HttpTransport {
    async fn send(&self, request: AdminRequest) -> Result<AdminResponse> {
        let AdminRequest { method, url, body } = request;

        let mut builder = match method {
            AdminMethod::Get => self.client.get(&url),
            AdminMethod::Put => self.client.put(&url),
            AdminMethod::Patch => self.client.patch(&url),
        };
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(|e| SyncerError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| SyncerError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        debug!("{} {} -> {}", method, url, status);
        Ok(AdminResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let get = AdminRequest::get("http://gw/apisix/admin/routes");
        assert_eq!(get.method, AdminMethod::Get);
        assert!(get.body.is_none());

        let patch = AdminRequest::patch("http://gw/apisix/admin/upstreams/1/nodes", "{}");
        assert_eq!(patch.method.as_str(), "PATCH");
        assert_eq!(patch.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_rejection_threshold() {
        let ok = AdminResponse { status: 201, body: String::new() };
        let missing = AdminResponse { status: 404, body: String::new() };
        let failed = AdminResponse { status: 503, body: String::new() };
        assert!(!ok.is_rejection());
        assert!(missing.is_rejection());
        assert!(failed.is_rejection());
    }

    #[test]
    fn test_http_transport_rejects_bad_api_key() {
        let config = GatewayConfig::new("http://127.0.0.1:9080").with_api_key("bad\nkey");
        let err = HttpTransport::new(&config).err().unwrap();
        assert!(matches!(err, SyncerError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_http_transport_connection_failure() {
        let config = GatewayConfig::new("http://127.0.0.1:1").with_api_key("key");
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport
            .send(AdminRequest::get(config.url_for("routes")))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncerError::Transport { .. }));
    }
}
