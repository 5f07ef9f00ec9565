//! Core pieces of the gateway syncer
//!
//! This library provides:
//! - Upstream registry caching logical upstream names to admin resource paths
//! - Gateway admin configuration
//! - The shared error taxonomy

pub mod config;
pub mod error;
pub mod registry;

pub use config::GatewayConfig;
pub use error::{Result, SyncerError};
pub use registry::{upstream_path, RegistryGuard, UpstreamRegistry, UPSTREAM_COLLECTION};
