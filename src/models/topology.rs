use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of `show lldp neighbors`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LldpNeighbor {
    pub port: String,
    pub neighbor_device: String,
    pub neighbor_port: String,
}

/// A physical link between two switches as seen over LLDP
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyLink {
    pub local_device: String,
    pub remote_device: String,
    pub local_port: String,
    pub remote_port: String,
    /// Local port bandwidth in Gbps, when the interface reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_gbps: Option<f64>,
}

impl TopologyLink {
    /// Key that is identical for both ends of the same cable
    pub fn undirected_key(&self) -> (String, String, String, String) {
        let a = (self.local_device.as_str(), self.local_port.as_str());
        let b = (self.remote_device.as_str(), self.remote_port.as_str());
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        (
            first.0.to_string(),
            first.1.to_string(),
            second.0.to_string(),
            second.1.to_string(),
        )
    }
}

/// Physical topology gathered across the fleet
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyReport {
    pub links: Vec<TopologyLink>,
    pub errors: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(ld: &str, lp: &str, rd: &str, rp: &str) -> TopologyLink {
        TopologyLink {
            local_device: ld.to_string(),
            remote_device: rd.to_string(),
            local_port: lp.to_string(),
            remote_port: rp.to_string(),
            speed_gbps: None,
        }
    }

    #[test]
    fn test_undirected_key_matches_both_ends() {
        let a = link("leaf1", "Ethernet49", "spine1", "Ethernet1");
        let b = link("spine1", "Ethernet1", "leaf1", "Ethernet49");
        assert_eq!(a.undirected_key(), b.undirected_key());

        let parallel = link("leaf1", "Ethernet50", "spine1", "Ethernet2");
        assert_ne!(a.undirected_key(), parallel.undirected_key());
    }
}
