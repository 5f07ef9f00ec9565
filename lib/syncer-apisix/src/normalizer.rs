//! Normalization of admin GET responses into flat record lists

use crate::client::ApisixClient;
use crate::transport::AdminRequest;
use syncer_api::{AdminPayload, PayloadShape, Record, ResourceKind};
use syncer_core::{Result, SyncerError};
use tracing::{debug, error};

impl ApisixClient {
    /// Fetch one resource kind and normalize it into records
    pub async fn fetch(&self, kind: ResourceKind) -> Result<Vec<Record>> {
        let records = self.fetch_path(kind.path(), kind.shape()).await?;
        debug!("Fetched {} {} records", records.len(), kind);
        Ok(records)
    }

    /// GET an admin path and decode it with the expected shape
    pub(crate) async fn fetch_path(&self, path: &str, shape: PayloadShape) -> Result<Vec<Record>> {
        let body = self.get(path).await?;
        let url = self.config().url_for(path);
        let payload = AdminPayload::decode(shape, &body).map_err(|source| {
            error!("Failed to decode admin response from {}: {}", url, source);
            SyncerError::Decode { url, source }
        })?;
        Ok(payload.into_records())
    }

    /// GET an admin path, treating a status >= 400 as an error
    pub(crate) async fn get(&self, path: &str) -> Result<String> {
        let url = self.config().url_for(path);
        let response = self
            .transport()
            .send(AdminRequest::get(url.clone()))
            .await
            .map_err(|e| {
                error!("Failed to fetch {}: {}", url, e);
                e
            })?;

        if response.is_rejection() {
            error!("Gateway rejected GET {} with status {}", url, response.status);
            return Err(SyncerError::GatewayRejection {
                method: "GET".to_string(),
                url,
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}
