use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{BgpRuntimeState, LldpNeighbor};

// --- JSON-RPC envelope ---

#[derive(Debug, Serialize)]
pub struct RunCmdsRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RunCmdsParams<'a>,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RunCmdsParams<'a> {
    pub version: u32,
    pub cmds: &'a [&'a str],
    pub format: &'static str,
}

impl<'a> RunCmdsRequest<'a> {
    pub fn new(cmds: &'a [&'a str]) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: 1,
                cmds,
                format: "json",
            },
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunCmdsResponse {
    #[serde(default)]
    pub result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

// --- Command outputs ---

#[derive(Debug, Deserialize)]
pub struct ShowHostname {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub fqdn: String,
}

impl ShowHostname {
    /// LLDP advertises the FQDN as the system name, so it is the identity
    /// that lines up with neighbor tables. Short hostname only as fallback.
    pub fn into_name(self) -> String {
        if self.fqdn.is_empty() {
            self.hostname
        } else {
            self.fqdn
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShowBgpSummary {
    #[serde(default)]
    pub vrfs: BTreeMap<String, BgpVrfSummary>,
}

#[derive(Debug, Deserialize)]
pub struct BgpVrfSummary {
    #[serde(default)]
    pub peers: BTreeMap<String, BgpPeerSummary>,
}

#[derive(Debug, Deserialize)]
pub struct BgpPeerSummary {
    #[serde(rename = "peerState", default)]
    pub peer_state: String,
}

impl From<ShowBgpSummary> for BgpRuntimeState {
    fn from(summary: ShowBgpSummary) -> Self {
        let vrfs = summary
            .vrfs
            .into_iter()
            .map(|(vrf, data)| {
                let peers = data
                    .peers
                    .into_iter()
                    .map(|(addr, peer)| (addr, peer.peer_state))
                    .collect();
                (vrf, peers)
            })
            .collect();
        Self { vrfs }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShowLldpNeighbors {
    #[serde(rename = "lldpNeighbors", default)]
    pub lldp_neighbors: Vec<LldpNeighbor>,
}

#[derive(Debug, Deserialize)]
pub struct ShowInterfacesStatus {
    #[serde(rename = "interfaceStatuses", default)]
    pub interface_statuses: BTreeMap<String, InterfaceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct InterfaceStatus {
    /// Bits per second
    #[serde(default)]
    pub bandwidth: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_VRF;

    #[test]
    fn test_request_envelope() {
        let cmds = ["enable", "show running-config"];
        let value = serde_json::to_value(RunCmdsRequest::new(&cmds)).unwrap();
        assert_eq!(value["method"], "runCmds");
        assert_eq!(value["params"]["version"], 1);
        assert_eq!(value["params"]["format"], "json");
        assert_eq!(value["params"]["cmds"][1], "show running-config");
    }

    #[test]
    fn test_bgp_summary_into_runtime_state() {
        let raw = serde_json::json!({
            "vrfs": {
                "default": {
                    "routerId": "10.255.0.1",
                    "asn": "65001",
                    "peers": {
                        "10.0.0.1": { "peerState": "Established", "prefixReceived": 12 },
                        "10.0.0.2": { "peerState": "Active" }
                    }
                },
                "RED": { "peers": {} }
            }
        });
        let summary: ShowBgpSummary = serde_json::from_value(raw).unwrap();
        let state = BgpRuntimeState::from(summary);
        let peers = state.peers(DEFAULT_VRF).unwrap();
        assert_eq!(peers["10.0.0.1"], "Established");
        assert_eq!(peers["10.0.0.2"], "Active");
        assert!(state.peers("RED").unwrap().is_empty());
    }

    #[test]
    fn test_hostname_prefers_fqdn() {
        let h: ShowHostname =
            serde_json::from_value(serde_json::json!({ "hostname": "leaf1", "fqdn": "leaf1.lab" })).unwrap();
        assert_eq!(h.into_name(), "leaf1.lab");

        let h: ShowHostname = serde_json::from_value(serde_json::json!({ "hostname": "leaf1", "fqdn": "" })).unwrap();
        assert_eq!(h.into_name(), "leaf1");
    }
}
