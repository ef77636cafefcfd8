//! BGP intent extraction from the running configuration and reconciliation
//! against live session state.

use std::collections::BTreeMap;

use crate::models::{
    BgpIntent, BgpRuntimeState, ConfigNode, NeighborAnomaly, VrfFinding, VrfIntent, VrfStatus,
    DEFAULT_VRF, ESTABLISHED,
};
use crate::utils::looks_like_ipv4;

const ROUTER_BGP: &str = "router bgp";
const NEIGHBOR: &str = "neighbor";
const NETWORK: &str = "network";
const ADDRESS_FAMILY_IPV4: &str = "address-family ipv4";
const VRF: &str = "vrf";

/// The `router bgp <asn>` statement and its block
#[derive(Debug, Clone, Copy)]
pub struct RouterBgp<'a> {
    pub statement: &'a str,
    pub block: Option<&'a ConfigNode>,
}

impl<'a> RouterBgp<'a> {
    pub fn local_asn(&self) -> Option<&'a str> {
        self.statement.split_whitespace().nth(2)
    }
}

/// Locate the top-level `router bgp` block, if BGP is configured at all
pub fn find_router_bgp(root: &ConfigNode) -> Option<RouterBgp<'_>> {
    root.statements()
        .find(|(statement, _)| statement.starts_with(ROUTER_BGP))
        .map(|(statement, block)| RouterBgp { statement, block })
}

/// Where in the `router bgp` hierarchy a statement sits
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    RouterBgp,
    Vrf(&'a str),
    AddressFamily(&'a str),
}

impl<'a> Scope<'a> {
    fn vrf(self) -> &'a str {
        match self {
            Scope::RouterBgp => DEFAULT_VRF,
            Scope::Vrf(name) | Scope::AddressFamily(name) => name,
        }
    }
}

/// Accumulates intent for a single extraction pass
#[derive(Debug, Default)]
struct IntentBuilder {
    local_asn: Option<String>,
    vrfs: BTreeMap<String, VrfIntent>,
}

impl IntentBuilder {
    fn vrf_mut(&mut self, vrf: &str) -> &mut VrfIntent {
        self.vrfs.entry(vrf.to_string()).or_default()
    }

    fn add_neighbor(&mut self, vrf: &str, address: &str) {
        self.vrf_mut(vrf).neighbors.insert(address.to_string());
    }

    fn add_network(&mut self, vrf: &str, prefix: &str) {
        self.vrf_mut(vrf).networks.insert(prefix.to_string());
    }

    fn build(self) -> BgpIntent {
        BgpIntent {
            local_asn: self.local_asn,
            vrfs: self.vrfs,
        }
    }
}

/// Second whitespace-separated token: the address of `neighbor <addr> ...`
/// or the prefix of `network <prefix> ...`
fn argument(statement: &str) -> Option<&str> {
    statement.split_whitespace().nth(1)
}

fn walk<'a>(node: &'a ConfigNode, scope: Scope<'a>, builder: &mut IntentBuilder) {
    for (statement, child) in node.statements() {
        let vrf = scope.vrf();

        if let Scope::AddressFamily(_) = scope {
            // An explicit ipv4 address-family is trusted; no shape check
            if statement.starts_with(NETWORK) {
                if let Some(prefix) = argument(statement) {
                    builder.add_network(vrf, prefix);
                }
            }
            continue;
        }

        if statement.starts_with(NEIGHBOR) {
            if let Some(address) = argument(statement).filter(|a| looks_like_ipv4(a)) {
                builder.add_neighbor(vrf, address);
            }
        } else if statement.starts_with(NETWORK) {
            if let Some(prefix) = argument(statement).filter(|p| looks_like_ipv4(p)) {
                builder.add_network(vrf, prefix);
            }
        } else if statement.starts_with(ADDRESS_FAMILY_IPV4) {
            if let Some(child) = child {
                walk(child, Scope::AddressFamily(vrf), builder);
            }
        } else if statement.starts_with(VRF) && matches!(scope, Scope::RouterBgp) {
            if let (Some(name), Some(child)) = (argument(statement), child) {
                walk(child, Scope::Vrf(name), builder);
            }
        }
    }
}

/// Build the declared BGP topology from a `router bgp` block.
/// Never fails; a block with nothing recognisable yields an empty intent.
pub fn extract(router_bgp: &RouterBgp<'_>) -> BgpIntent {
    let mut builder = IntentBuilder {
        local_asn: router_bgp.local_asn().map(String::from),
        ..Default::default()
    };
    if let Some(block) = router_bgp.block {
        walk(block, Scope::RouterBgp, &mut builder);
    }
    builder.build()
}

fn reconcile_vrf(intent: &VrfIntent, peers: Option<&BTreeMap<String, String>>) -> VrfFinding {
    let configured_neighbors: Vec<String> = intent.neighbors.iter().cloned().collect();

    let Some(peers) = peers else {
        return VrfFinding {
            status: Some(VrfStatus::NoOperationalNeighbors),
            anomalies: BTreeMap::new(),
            configured_neighbors,
        };
    };

    let anomalies: BTreeMap<String, NeighborAnomaly> = configured_neighbors
        .iter()
        .filter_map(|neighbor| match peers.get(neighbor) {
            None => Some((neighbor.clone(), NeighborAnomaly::NotOperational)),
            Some(state) if state != ESTABLISHED => {
                Some((neighbor.clone(), NeighborAnomaly::State(state.clone())))
            }
            Some(_) => None,
        })
        .collect();

    VrfFinding {
        status: anomalies.is_empty().then_some(VrfStatus::AllPeersUp),
        anomalies,
        configured_neighbors,
    }
}

/// Compare declared neighbors against observed sessions, per VRF.
/// VRFs that declare no neighbors (networks only) produce no finding.
pub fn reconcile(intent: &BgpIntent, runtime: &BgpRuntimeState) -> BTreeMap<String, VrfFinding> {
    intent
        .vrfs
        .iter()
        .filter(|(_, vrf)| !vrf.neighbors.is_empty())
        .map(|(name, vrf)| (name.clone(), reconcile_vrf(vrf, runtime.peers(name))))
        .collect()
}
