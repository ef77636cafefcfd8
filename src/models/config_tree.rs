use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One level of a device's hierarchical running configuration.
///
/// Mirrors the JSON form of `show running-config`: every statement maps to
/// either `null` (a leaf command) or a nested block with its own `cmds`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    #[serde(default)]
    pub cmds: BTreeMap<String, Option<ConfigNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl ConfigNode {
    /// Iterate `(statement, child block)` pairs at this level
    pub fn statements(&self) -> impl Iterator<Item = (&str, Option<&ConfigNode>)> {
        self.cmds.iter().map(|(line, child)| (line.as_str(), child.as_ref()))
    }
}

/// Hand-assembled trees for tests
#[cfg(test)]
impl ConfigNode {
    pub fn child(&self, statement: &str) -> Option<&ConfigNode> {
        self.cmds.get(statement).and_then(|c| c.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Add a leaf statement
    pub fn with_leaf(mut self, statement: &str) -> Self {
        self.cmds.insert(statement.to_string(), None);
        self
    }

    /// Add a block statement owning `child`
    pub fn with_block(mut self, statement: &str, child: ConfigNode) -> Self {
        self.cmds.insert(statement.to_string(), Some(child));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_eos_running_config() {
        let raw = serde_json::json!({
            "cmds": {
                "hostname leaf1": null,
                "router bgp 65001": {
                    "comments": [],
                    "cmds": {
                        "neighbor 10.0.0.1 remote-as 65000": null,
                        "vrf RED": {
                            "cmds": { "neighbor 10.1.0.1 remote-as 65100": null }
                        }
                    }
                }
            }
        });

        let root: ConfigNode = serde_json::from_value(raw).unwrap();
        assert!(root.child("hostname leaf1").is_none());

        let bgp = root.child("router bgp 65001").unwrap();
        assert_eq!(bgp.statements().count(), 2);
        let vrf = bgp.child("vrf RED").unwrap();
        assert!(vrf.cmds.contains_key("neighbor 10.1.0.1 remote-as 65100"));
    }

    #[test]
    fn test_builder_helpers() {
        let node = ConfigNode::default()
            .with_leaf("network 10.0.0.0/24")
            .with_block("vrf BLUE", ConfigNode::default().with_leaf("neighbor 1.1.1.1 remote-as 1"));
        assert_eq!(node.cmds.len(), 2);
        assert!(!node.child("vrf BLUE").unwrap().is_empty());
    }
}
