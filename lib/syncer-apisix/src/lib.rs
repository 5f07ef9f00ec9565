//! APISIX admin API integration
//!
//! Reconciles discovered instances into APISIX upstreams and exports the
//! admin-plane configuration as a standalone YAML snapshot.
pub mod client;
pub mod normalizer;
pub mod snapshot;
pub mod template;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{ApisixClient, SyncOutcome};
pub use snapshot::SnapshotExport;
pub use template::{TemplateEngine, DEFAULT_UPSTREAM_TEMPLATE, PROVENANCE};
pub use transport::{AdminMethod, AdminRequest, AdminResponse, AdminTransport, HttpTransport};
