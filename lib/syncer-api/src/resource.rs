//! Admin resource kinds and the configuration snapshot composite

use crate::admin::PayloadShape;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// An opaque admin record
pub type Record = Map<String, Value>;

/// Resource collections exported from the gateway admin API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Routes,
    Services,
    Upstreams,
    Plugins,
    Ssl,
    GlobalRules,
    Consumers,
    PluginMetadata,
    StreamRoutes,
}

impl ResourceKind {
    /// Every exportable kind, in snapshot order
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Routes,
        ResourceKind::Services,
        ResourceKind::Upstreams,
        ResourceKind::Plugins,
        ResourceKind::Ssl,
        ResourceKind::GlobalRules,
        ResourceKind::Consumers,
        ResourceKind::PluginMetadata,
        ResourceKind::StreamRoutes,
    ];

    /// Admin API path, relative to the configured prefix
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Routes => "routes",
            ResourceKind::Services => "services",
            ResourceKind::Upstreams => "upstreams",
            ResourceKind::Plugins => "plugins/list",
            ResourceKind::Ssl => "ssl",
            ResourceKind::GlobalRules => "global_rules",
            ResourceKind::Consumers => "consumers",
            ResourceKind::PluginMetadata => "plugin_metadata",
            ResourceKind::StreamRoutes => "stream_routes",
        }
    }

    /// Key of this kind in the exported snapshot
    pub fn field(&self) -> &'static str {
        match self {
            ResourceKind::Plugins => "plugins",
            other => other.path(),
        }
    }

    pub fn shape(&self) -> PayloadShape {
        match self {
            ResourceKind::Plugins => PayloadShape::PluginNames,
            _ => PayloadShape::Tree,
        }
    }

    /// Look a kind up by its admin path or snapshot field name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == name || kind.field() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Point-in-time export of every admin resource collection.
///
/// A kind that could not be fetched stays `None` and is left out of the
/// serialized document.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstreams: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_rules: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumers: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_metadata: Option<Vec<Record>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_routes: Option<Vec<Record>>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut Option<Vec<Record>> {
        match kind {
            ResourceKind::Routes => &mut self.routes,
            ResourceKind::Services => &mut self.services,
            ResourceKind::Upstreams => &mut self.upstreams,
            ResourceKind::Plugins => &mut self.plugins,
            ResourceKind::Ssl => &mut self.ssl,
            ResourceKind::GlobalRules => &mut self.global_rules,
            ResourceKind::Consumers => &mut self.consumers,
            ResourceKind::PluginMetadata => &mut self.plugin_metadata,
            ResourceKind::StreamRoutes => &mut self.stream_routes,
        }
    }

    /// Store the records fetched for `kind`, replacing any earlier value
    pub fn assign(&mut self, kind: ResourceKind, records: Vec<Record>) {
        *self.slot_mut(kind) = Some(records);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&[Record]> {
        let slot = match kind {
            ResourceKind::Routes => &self.routes,
            ResourceKind::Services => &self.services,
            ResourceKind::Upstreams => &self.upstreams,
            ResourceKind::Plugins => &self.plugins,
            ResourceKind::Ssl => &self.ssl,
            ResourceKind::GlobalRules => &self.global_rules,
            ResourceKind::Consumers => &self.consumers,
            ResourceKind::PluginMetadata => &self.plugin_metadata,
            ResourceKind::StreamRoutes => &self.stream_routes,
        };
        slot.as_deref()
    }
}
