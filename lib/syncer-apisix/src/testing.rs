//! In-memory admin transport for tests

use crate::client::ApisixClient;
use crate::transport::{AdminMethod, AdminRequest, AdminResponse, AdminTransport};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use syncer_core::{GatewayConfig, Result};

pub const ADMIN_URL: &str = "http://gateway:9080";

type Handler = Box<dyn Fn(&AdminRequest) -> Result<AdminResponse> + Send + Sync>;

/// Records every request and answers through a handler closure
pub struct MockTransport {
    requests: Mutex<Vec<AdminRequest>>,
    handler: Handler,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&AdminRequest) -> Result<AdminResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    pub fn requests(&self) -> Vec<AdminRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests with the given method whose URL ends with `suffix`
    pub fn count(&self, method: AdminMethod, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl AdminTransport for MockTransport {
    async fn send(&self, request: AdminRequest) -> Result<AdminResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

pub fn respond(status: u16, body: impl Into<String>) -> Result<AdminResponse> {
    Ok(AdminResponse {
        status,
        body: body.into(),
    })
}

/// Admin path of a request, relative to the default prefix
pub fn admin_path(request: &AdminRequest) -> &str {
    request
        .url
        .strip_prefix(ADMIN_URL)
        .and_then(|rest| rest.strip_prefix("/apisix/admin/"))
        .unwrap_or(&request.url)
}

pub fn client(transport: Arc<MockTransport>) -> ApisixClient {
    let config = GatewayConfig::new(ADMIN_URL).with_api_key("test-key");
    ApisixClient::with_transport(config, transport)
}

pub fn client_with_config(config: GatewayConfig, transport: Arc<MockTransport>) -> ApisixClient {
    ApisixClient::with_transport(config, transport)
}
