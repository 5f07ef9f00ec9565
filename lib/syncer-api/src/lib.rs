//! Data types shared between the discovery side and the gateway admin client
//!
//! This library defines:
//! - Instance: a discovered backend endpoint and its translation to a node map
//! - ResourceKind / ConfigSnapshot: the admin resource collections and their export composite
//! - Admin response shapes returned by the gateway's admin API

pub mod admin;
pub mod instance;
pub mod resource;

pub use admin::{AdminEnvelope, AdminPayload, NodeTree, PayloadShape, UpstreamNodes, UpstreamValue};
pub use instance::{node_map, Instance, NodeMap};
pub use resource::{ConfigSnapshot, Record, ResourceKind};
