//! Discovered instances and the gateway node map
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Endpoint-to-weight mapping, keyed by `"address:port"`
pub type NodeMap = BTreeMap<String, f64>;

/// A backend instance reported by service discovery
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub ip: String,
    pub port: u16,
    pub weight: f64,
}

impl Instance {
    pub fn new(ip: impl Into<String>, port: u16, weight: f64) -> Self {
        Self {
            ip: ip.into(),
            port,
            weight,
        }
    }

    /// Key under which this instance appears in a node map
    pub fn node_key(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Parse a node map entry back into an instance.
    ///
    /// The port is taken after the last colon so bracketed IPv6 hosts survive.
    pub fn from_node_key(key: &str, weight: f64) -> Option<Self> {
        let (ip, port) = key.rsplit_once(':')?;
        if ip.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some(Self::new(ip, port, weight))
    }
}

/// Translate instances into the gateway's node map.
///
/// Instances sharing an `address:port` collapse to the last weight seen.
/// Weights are passed through unchanged.
pub fn node_map(instances: &[Instance]) -> NodeMap {
    instances
        .iter()
        .map(|instance| (instance.node_key(), instance.weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_map_keys() {
        let instances = vec![
            Instance::new("10.0.0.1", 8080, 1.0),
            Instance::new("10.0.0.2", 8080, 2.0),
        ];
        let nodes = node_map(&instances);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.get("10.0.0.1:8080"), Some(&1.0));
        assert_eq!(nodes.get("10.0.0.2:8080"), Some(&2.0));
    }

    #[test]
    fn test_node_map_duplicate_keeps_last_weight() {
        let instances = vec![
            Instance::new("10.0.0.1", 8080, 1.0),
            Instance::new("10.0.0.1", 9090, 5.0),
            Instance::new("10.0.0.1", 8080, 3.0),
        ];
        let nodes = node_map(&instances);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.get("10.0.0.1:8080"), Some(&3.0));
    }

    #[test]
    fn test_node_map_passes_weight_through() {
        let nodes = node_map(&[
            Instance::new("10.0.0.1", 80, 0.0),
            Instance::new("10.0.0.2", 80, 250.5),
        ]);
        assert_eq!(nodes.get("10.0.0.1:80"), Some(&0.0));
        assert_eq!(nodes.get("10.0.0.2:80"), Some(&250.5));
    }

    #[test]
    fn test_node_map_empty() {
        assert!(node_map(&[]).is_empty());
    }

    #[test]
    fn test_from_node_key() {
        assert_eq!(
            Instance::from_node_key("10.0.0.1:8080", 1.0),
            Some(Instance::new("10.0.0.1", 8080, 1.0))
        );
        assert_eq!(
            Instance::from_node_key("[::1]:80", 2.0),
            Some(Instance::new("[::1]", 80, 2.0))
        );
        assert_eq!(Instance::from_node_key("10.0.0.1", 1.0), None);
        assert_eq!(Instance::from_node_key("10.0.0.1:http", 1.0), None);
        assert_eq!(Instance::from_node_key(":80", 1.0), None);
    }
}
