//! Response shapes of the gateway admin API
//!
//! The admin API answers a GET in one of a few shapes depending on the
//! resource kind:
//! - `plugins/list` returns a flat array of plugin names
//! - collections return `{"node": {"nodes": [{"key": ..., "value": {...}}]}}`
//! - a single resource returns `{"node": {"key": ..., "value": {...}}}`
//! - v3 collections return `{"list": [{"value": {...}}], "total": N}`
//! - a v3 single resource returns `{"key": ..., "value": {...}}`
//!
//! The shape to expect is picked by the caller from the resource kind, then
//! decoded once into [`AdminPayload`].

use crate::instance::Instance;
use crate::resource::Record;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Plugins that run at the stream (L4) layer instead of HTTP
pub const STREAM_PLUGINS: [&str; 2] = ["mqtt-proxy", "dubbo-proxy"];

/// Which response shape an admin endpoint produces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    PluginNames,
    Tree,
}

/// Top-level body of a generic admin GET
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdminEnvelope {
    #[serde(default)]
    pub node: Option<NodeTree>,
    #[serde(default)]
    pub list: Option<Vec<Value>>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// The `node` field, either a directory of children or one resource
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeTree {
    Collection { nodes: Vec<Value> },
    Single(Value),
}

impl NodeTree {
    /// Children of the tree; a single resource becomes a one-element list
    pub fn into_children(self) -> Vec<Value> {
        match self {
            NodeTree::Collection { nodes } => nodes,
            NodeTree::Single(node) => vec![node],
        }
    }
}

impl AdminEnvelope {
    /// Extract the `value` map of every child, skipping children without one.
    ///
    /// A top-level `value` is treated as a one-element list.
    pub fn into_records(self) -> Vec<Record> {
        let top_level = match self.value {
            Some(Value::Object(value)) => Some(value),
            _ => None,
        };

        self.node
            .map(NodeTree::into_children)
            .unwrap_or_default()
            .into_iter()
            .chain(self.list.unwrap_or_default())
            .filter_map(child_value)
            .chain(top_level)
            .collect()
    }
}

fn child_value(child: Value) -> Option<Record> {
    match child {
        Value::Object(mut fields) => match fields.remove("value") {
            Some(Value::Object(value)) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// A decoded admin response
#[derive(Clone, Debug)]
pub enum AdminPayload {
    PluginNames(Vec<String>),
    Tree(AdminEnvelope),
}

impl AdminPayload {
    pub fn decode(shape: PayloadShape, body: &str) -> Result<Self, serde_json::Error> {
        match shape {
            PayloadShape::PluginNames => serde_json::from_str(body).map(AdminPayload::PluginNames),
            PayloadShape::Tree => serde_json::from_str(body).map(AdminPayload::Tree),
        }
    }

    /// Normalize into records, preserving response order
    pub fn into_records(self) -> Vec<Record> {
        match self {
            AdminPayload::PluginNames(names) => names.into_iter().map(plugin_record).collect(),
            AdminPayload::Tree(envelope) => envelope.into_records(),
        }
    }
}

fn plugin_record(name: String) -> Record {
    let mut record = Record::new();
    let stream = STREAM_PLUGINS.contains(&name.as_str());
    record.insert("name".to_string(), Value::String(name));
    if stream {
        record.insert("stream".to_string(), Value::Bool(true));
    }
    record
}

/// The fields of an upstream record the syncer cares about
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpstreamValue {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Option<UpstreamNodes>,
}

/// Upstream nodes, in either the hash or the array form
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum UpstreamNodes {
    Map(BTreeMap<String, f64>),
    List(Vec<UpstreamNode>),
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpstreamNode {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub weight: f64,
}

impl UpstreamValue {
    pub fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }

    /// The id as a path segment; numeric ids are rendered in decimal
    pub fn id_segment(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Translate the nodes back into instances.
    ///
    /// Returns the parsed instances and the node keys that could not be parsed.
    pub fn instances(&self) -> (Vec<Instance>, Vec<String>) {
        let mut instances = Vec::new();
        let mut malformed = Vec::new();
        match &self.nodes {
            Some(UpstreamNodes::Map(nodes)) => {
                for (key, weight) in nodes {
                    match Instance::from_node_key(key, *weight) {
                        Some(instance) => instances.push(instance),
                        None => malformed.push(key.clone()),
                    }
                }
            }
            Some(UpstreamNodes::List(nodes)) => {
                instances.extend(
                    nodes
                        .iter()
                        .map(|node| Instance::new(node.host.clone(), node.port, node.weight)),
                );
            }
            None => {}
        }
        (instances, malformed)
    }
}
