use std::collections::{BTreeMap, HashSet};

use crate::models::{Device, LldpNeighbor, TopologyLink};

/// Turn one device's LLDP table into links, annotated with local port speed
pub fn device_links(
    device: &Device,
    neighbors: &[LldpNeighbor],
    bandwidths: &BTreeMap<String, f64>,
) -> Vec<TopologyLink> {
    neighbors
        .iter()
        .map(|n| TopologyLink {
            local_device: device.name().to_string(),
            remote_device: n.neighbor_device.clone(),
            local_port: n.port.clone(),
            remote_port: n.neighbor_port.clone(),
            speed_gbps: bandwidths
                .get(&n.port)
                .filter(|bps| **bps > 0.0)
                .map(|bps| bps / 1_000_000_000.0),
        })
        .collect()
}

/// Merge per-device links, keeping the first sighting of each cable
pub fn merge_links(per_device: impl IntoIterator<Item = Vec<TopologyLink>>) -> Vec<TopologyLink> {
    let mut seen = HashSet::new();
    per_device
        .into_iter()
        .flatten()
        .filter(|link| seen.insert(link.undirected_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(port: &str, device: &str, remote_port: &str) -> LldpNeighbor {
        LldpNeighbor {
            port: port.to_string(),
            neighbor_device: device.to_string(),
            neighbor_port: remote_port.to_string(),
        }
    }

    fn named(address: &str, hostname: &str) -> Device {
        Device {
            address: address.to_string(),
            hostname: Some(hostname.to_string()),
        }
    }

    #[test]
    fn test_device_links_speed() {
        let mut bw = BTreeMap::new();
        bw.insert("Ethernet49".to_string(), 100_000_000_000.0);
        bw.insert("Ethernet50".to_string(), 0.0);

        let links = device_links(
            &named("10.0.0.11", "leaf1"),
            &[neighbor("Ethernet49", "spine1", "Ethernet1"), neighbor("Ethernet50", "spine2", "Ethernet1")],
            &bw,
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].local_device, "leaf1");
        assert_eq!(links[0].speed_gbps, Some(100.0));
        assert_eq!(links[1].speed_gbps, None);
    }

    #[test]
    fn test_merge_drops_reverse_direction() {
        let bw = BTreeMap::new();
        let leaf = device_links(&named("10.0.0.11", "leaf1"), &[neighbor("Ethernet49", "spine1", "Ethernet1")], &bw);
        let spine = device_links(
            &named("10.0.0.1", "spine1"),
            &[neighbor("Ethernet1", "leaf1", "Ethernet49"), neighbor("Ethernet2", "leaf2", "Ethernet49")],
            &bw,
        );

        let links = merge_links(vec![leaf, spine]);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].local_device, "leaf1");
        assert_eq!(links[1].remote_device, "leaf2");
    }

    #[test]
    fn test_fqdn_named_switches_share_one_link() {
        use crate::eapi::types::ShowHostname;

        let learned = |hostname: &str, fqdn: &str| ShowHostname {
            hostname: hostname.to_string(),
            fqdn: fqdn.to_string(),
        }
        .into_name();

        let bw = BTreeMap::new();
        let leaf = device_links(
            &named("10.0.0.11", &learned("leaf1", "leaf1.lab")),
            &[neighbor("Ethernet49", "spine1.lab", "Ethernet1")],
            &bw,
        );
        let spine = device_links(
            &named("10.0.0.1", &learned("spine1", "spine1.lab")),
            &[neighbor("Ethernet1", "leaf1.lab", "Ethernet49")],
            &bw,
        );

        let links = merge_links(vec![leaf, spine]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].local_device, "leaf1.lab");
        assert_eq!(links[0].remote_device, "spine1.lab");
    }
}
