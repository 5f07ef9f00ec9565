//! Export of the admin-plane configuration as a standalone YAML snapshot

use crate::client::ApisixClient;
use futures::future::join_all;
use std::path::PathBuf;
use syncer_api::{ConfigSnapshot, ResourceKind};
use syncer_core::Result;
use tracing::{error, info, warn};

/// A rendered snapshot and where it was written
#[derive(Clone, Debug)]
pub struct SnapshotExport {
    pub rendered: String,
    pub path: PathBuf,
    /// Kinds that could not be fetched and are missing from the document
    pub skipped: Vec<ResourceKind>,
}

impl ApisixClient {
    /// Kinds selected by `export-kinds`, in snapshot order; all kinds when unset.
    ///
    /// Unknown names are logged and ignored.
    pub fn export_kinds(&self) -> Vec<ResourceKind> {
        let Some(names) = &self.config().export_kinds else {
            return ResourceKind::ALL.to_vec();
        };

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match ResourceKind::from_name(name) {
                Some(kind) => selected.push(kind),
                None => warn!("[admin_api_to_yaml] unknown resource kind {}, ignoring", name),
            }
        }
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| selected.contains(kind))
            .collect()
    }

    /// Fetch the exported resource kinds into a snapshot.
    ///
    /// Kinds are fetched concurrently. A kind that fails is logged and left
    /// out; the rest of the snapshot is still returned.
    pub async fn collect_snapshot(&self) -> (ConfigSnapshot, Vec<ResourceKind>) {
        let fetches = self
            .export_kinds()
            .into_iter()
            .map(|kind| async move { (kind, self.fetch(kind).await) });

        let mut snapshot = ConfigSnapshot::new();
        let mut skipped = Vec::new();
        for (kind, result) in join_all(fetches).await {
            match result {
                Ok(records) => snapshot.assign(kind, records),
                Err(e) => {
                    error!("[admin_api_to_yaml] fetch {} failed, skipping: {}", kind, e);
                    skipped.push(kind);
                }
            }
        }
        (snapshot, skipped)
    }

    /// Serialize a snapshot to YAML and wrap it in the generated-file banner.
    ///
    /// The struct is serialized to YAML directly, without an intermediate
    /// `serde_json::Value`, so the kinds keep their declared order.
    pub fn render_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<String> {
        let yaml = serde_yaml::to_string(snapshot).map_err(|e| {
            error!("[admin_api_to_yaml] convert snapshot to yaml failed: {}", e);
            e
        })?;
        self.templates().render_snapshot(&yaml)
    }

    /// Export the whole admin configuration to the snapshot path,
    /// overwriting any previous snapshot.
    pub async fn fetch_admin_api_to_file(&self) -> Result<SnapshotExport> {
        let (snapshot, skipped) = self.collect_snapshot().await;
        let rendered = self.render_snapshot(&snapshot)?;

        let path = self.config().snapshot_path();
        tokio::fs::write(&path, rendered.as_bytes()).await.map_err(|e| {
            error!("[admin_api_to_yaml] failed to write {}: {}", path.display(), e);
            e
        })?;

        info!(
            "Exported admin configuration to {} ({} kinds skipped)",
            path.display(),
            skipped.len()
        );
        Ok(SnapshotExport {
            rendered,
            path,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::template::PROVENANCE;
    use crate::testing::{admin_path, client_with_config, respond, MockTransport, ADMIN_URL};
    use serde_json::json;
    use syncer_api::ResourceKind;
    use syncer_core::{GatewayConfig, SyncerError};

    fn temp_snapshot_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("apisix-{}.yaml", uuid::Uuid::new_v4()))
    }

    fn tree(id: &str) -> String {
        json!({"node": {"nodes": [{"key": format!("/apisix/x/{}", id), "value": {"id": id}}]}})
            .to_string()
    }

    fn gateway(failing: &'static str) -> std::sync::Arc<MockTransport> {
        MockTransport::new(move |request| {
            let path = admin_path(request).to_string();
            if path == failing {
                return Err(SyncerError::Transport {
                    url: request.url.clone(),
                    message: "connection reset".to_string(),
                });
            }
            match path.as_str() {
                "plugins/list" => respond(200, r#"["limit-count","mqtt-proxy"]"#),
                other => respond(200, tree(&format!("{}-1", other))),
            }
        })
    }

    #[tokio::test]
    async fn test_collect_snapshot_fetches_every_kind() {
        let transport = gateway("none");
        let client = client_with_config(GatewayConfig::new(ADMIN_URL), transport.clone());

        let (snapshot, skipped) = client.collect_snapshot().await;
        assert!(skipped.is_empty());
        assert_eq!(transport.requests().len(), ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let expected = if kind == ResourceKind::Plugins { 2 } else { 1 };
            assert_eq!(snapshot.get(kind).map(|r| r.len()), Some(expected), "{}", kind);
        }
        assert_eq!(
            snapshot.get(ResourceKind::StreamRoutes).unwrap()[0]["id"],
            json!("stream_routes-1")
        );
    }

    #[tokio::test]
    async fn test_collect_snapshot_honours_export_kinds() {
        let transport = gateway("none");
        let config =
            GatewayConfig::new(ADMIN_URL).with_export_kinds(["plugins", "bogus", "routes"]);
        let client = client_with_config(config, transport.clone());

        assert_eq!(
            client.export_kinds(),
            vec![ResourceKind::Routes, ResourceKind::Plugins]
        );

        let (snapshot, skipped) = client.collect_snapshot().await;
        assert!(skipped.is_empty());
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(snapshot.get(ResourceKind::Routes).map(|r| r.len()), Some(1));
        assert_eq!(snapshot.get(ResourceKind::Plugins).map(|r| r.len()), Some(2));
        assert!(snapshot.get(ResourceKind::Upstreams).is_none());
    }

    #[test]
    fn test_render_snapshot_keeps_kind_order() {
        let client = client_with_config(GatewayConfig::new(ADMIN_URL), gateway("none"));
        let mut snapshot = syncer_api::ConfigSnapshot::new();
        for kind in ResourceKind::ALL.iter().rev() {
            snapshot.assign(*kind, vec![]);
        }

        let rendered = client.render_snapshot(&snapshot).unwrap();
        let positions: Vec<usize> = ResourceKind::ALL
            .iter()
            .map(|kind| rendered.find(&format!("\n{}:", kind.field())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_export_kinds_defaults_to_all() {
        let client = client_with_config(GatewayConfig::new(ADMIN_URL), gateway("none"));
        assert_eq!(client.export_kinds(), ResourceKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_export_skips_failed_kind() {
        let path = temp_snapshot_path();
        let transport = gateway("consumers");
        let config = GatewayConfig::new(ADMIN_URL).with_snapshot_path(&path);
        let client = client_with_config(config, transport);

        let export = client.fetch_admin_api_to_file().await.unwrap();
        assert_eq!(export.path, path);
        assert_eq!(export.skipped, vec![ResourceKind::Consumers]);

        let rendered = &export.rendered;
        let banner = format!("\n# Auto generate by {}, Don't Modify\n", PROVENANCE);
        assert!(rendered.starts_with(&banner));
        assert!(rendered.ends_with("#END\n"));
        assert!(!rendered.contains("consumers:"));
        for kind in ResourceKind::ALL.iter().filter(|k| **k != ResourceKind::Consumers) {
            assert!(rendered.contains(&format!("\n{}:\n", kind.field())), "missing {}", kind);
        }
        assert!(rendered.contains("stream: true"));
        assert!(rendered.contains("global_rules-1"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(&written, rendered);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_export_overwrites_previous_snapshot() {
        let path = temp_snapshot_path();
        std::fs::write(&path, "stale").unwrap();
        let config = GatewayConfig::new(ADMIN_URL).with_snapshot_path(&path);
        let client = client_with_config(config, gateway("none"));

        client.fetch_admin_api_to_file().await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        assert!(written.contains("routes:"));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_export_with_everything_failing() {
        let path = temp_snapshot_path();
        let transport = MockTransport::new(|_| respond(500, "boom"));
        let config = GatewayConfig::new(ADMIN_URL).with_snapshot_path(&path);
        let client = client_with_config(config, transport);

        let export = client.fetch_admin_api_to_file().await.unwrap();
        assert_eq!(export.skipped.len(), ResourceKind::ALL.len());
        assert!(export.rendered.contains("{}"));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_export_write_failure() {
        let dir = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        let config = GatewayConfig::new(ADMIN_URL).with_snapshot_path(dir.join("apisix.yaml"));
        let client = client_with_config(config, gateway("none"));

        let err = client.fetch_admin_api_to_file().await.unwrap_err();
        assert!(matches!(err, SyncerError::Io(_)));
    }
}
