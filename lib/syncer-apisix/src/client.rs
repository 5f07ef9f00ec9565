//! APISIX admin client: upstream instance lookup and reconciliation

use crate::template::TemplateEngine;
use crate::transport::{AdminRequest, AdminTransport, HttpTransport};
use std::sync::Arc;
use syncer_api::{node_map, Instance, PayloadShape, UpstreamValue};
use syncer_core::{
    upstream_path, GatewayConfig, RegistryGuard, Result, UpstreamRegistry, UPSTREAM_COLLECTION,
};
use tracing::{debug, error, warn};

/// Result of one reconciliation pass for an upstream
#[derive(Clone, Debug, PartialEq)]
pub enum SyncOutcome {
    /// Nothing to write: no desired instances and no diff
    Skipped,
    /// The upstream did not exist and was created
    Created,
    /// The node set of an existing upstream was replaced
    Updated,
    /// The gateway answered the write with a status >= 400.
    ///
    /// Reconciliation of other upstreams should carry on; the caller decides
    /// whether this is fatal.
    Rejected { status: u16, body: String },
}

impl SyncOutcome {
    /// Whether the gateway accepted a write
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Created | SyncOutcome::Updated)
    }
}

/// Client for one APISIX admin endpoint
///
/// All upstream-name resolution for this gateway goes through one
/// [`UpstreamRegistry`] lock, so concurrent reconciliations are serialized.
pub struct ApisixClient {
    config: GatewayConfig,
    transport: Arc<dyn AdminTransport>,
    registry: UpstreamRegistry,
    templates: TemplateEngine,
}

impl ApisixClient {
    /// Create a client talking HTTP to the configured admin URL
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn AdminTransport>) -> Self {
        Self {
            config,
            transport,
            registry: UpstreamRegistry::new(),
            templates: TemplateEngine::new(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &UpstreamRegistry {
        &self.registry
    }

    pub(crate) fn transport(&self) -> &dyn AdminTransport {
        self.transport.as_ref()
    }

    pub(crate) fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Instances currently registered in the gateway for an upstream.
    ///
    /// Lists all upstreams unless the name is already cached, and indexes
    /// every upstream seen into the registry.
    pub async fn get_service_all_instances(&self, upstream_name: &str) -> Result<Vec<Instance>> {
        let mut registry = self.registry.lock().await;
        let path = registry
            .resolve(upstream_name)
            .unwrap_or_else(|| UPSTREAM_COLLECTION.to_string());
        let upstreams = self.list_upstreams(&mut registry, &path).await?;
        drop(registry);

        let mut instances = Vec::new();
        for upstream in upstreams
            .iter()
            .filter(|u| u.name.as_deref() == Some(upstream_name))
        {
            let (found, malformed) = upstream.instances();
            for key in malformed {
                warn!("Skipping malformed node {} in upstream {}", key, upstream_name);
            }
            instances.extend(found);
        }

        debug!(
            "Fetched upstream {} from {}, {} instances",
            upstream_name,
            path,
            instances.len()
        );
        Ok(instances)
    }

    /// Push the desired instance set for an upstream to the gateway.
    ///
    /// A cached upstream gets its whole node set replaced through
    /// `<path>/nodes`. An unknown name triggers one listing; if the name is
    /// still unknown the upstream is created from `template` (or the default
    /// template) at `upstreams/<name>`.
    ///
    /// Transport and decode failures are errors. A gateway rejection of the
    /// write is logged and returned as [`SyncOutcome::Rejected`].
    pub async fn sync_instances(
        &self,
        name: &str,
        template: Option<&str>,
        desired: &[Instance],
        diff: &[Instance],
    ) -> Result<SyncOutcome> {
        if desired.is_empty() && diff.is_empty() {
            debug!("No instances for upstream {}, skipping", name);
            return Ok(SyncOutcome::Skipped);
        }

        let nodes = node_map(desired);

        let mut registry = self.registry.lock().await;
        let mut resolved = registry.resolve(name);
        if resolved.is_none() {
            self.list_upstreams(&mut registry, UPSTREAM_COLLECTION).await?;
            resolved = registry.resolve(name);
        }

        let request = match &resolved {
            Some(path) => AdminRequest::patch(
                self.config.url_for(&format!("{}/nodes", path)),
                serde_json::to_string(&nodes)?,
            ),
            None => AdminRequest::put(
                self.config.url_for(&upstream_path(name)),
                self.templates.render_upstream(template, name, &nodes)?,
            ),
        };

        let method = request.method;
        let uri = request.url.clone();
        let body = request.body.clone().unwrap_or_default();
        debug!("Updating upstream uri:{} method:{} body:{}", uri, method, body);

        let response = self.transport.send(request).await.map_err(|e| {
            error!("Update upstream uri:{} method:{} body:{} failed: {}", uri, method, body, e);
            e
        })?;

        debug!("Upstream uri:{} method:{} resp:{}", uri, method, response.body);

        if response.is_rejection() {
            error!(
                "Update upstream uri:{} method:{} body:{} rejected with status {}: {}",
                uri, method, body, response.status, response.body
            );
            return Ok(SyncOutcome::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        match resolved {
            Some(_) => Ok(SyncOutcome::Updated),
            None => {
                registry.record(name, upstream_path(name));
                Ok(SyncOutcome::Created)
            }
        }
    }

    /// GET an upstream path and index every upstream it returns
    async fn list_upstreams(
        &self,
        registry: &mut RegistryGuard<'_>,
        path: &str,
    ) -> Result<Vec<UpstreamValue>> {
        let records = self.fetch_path(path, PayloadShape::Tree).await?;

        let mut upstreams = Vec::with_capacity(records.len());
        for record in records {
            match UpstreamValue::from_record(record) {
                Ok(upstream) => upstreams.push(upstream),
                Err(e) => warn!("Skipping unreadable upstream from {}: {}", path, e),
            }
        }

        registry.warm(upstreams.iter().filter_map(|upstream| {
            let name = upstream.name.clone()?;
            let id = upstream.id_segment()?;
            Some((name, upstream_path(&id)))
        }));

        Ok(upstreams)
    }
}
