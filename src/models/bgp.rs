use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// VRF name used for statements outside any `vrf` block
pub const DEFAULT_VRF: &str = "default";

/// Session state label that counts as healthy
pub const ESTABLISHED: &str = "Established";

/// Declared BGP neighbors and networks for one VRF
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VrfIntent {
    pub neighbors: BTreeSet<String>,
    pub networks: BTreeSet<String>,
}

/// BGP topology a device declares in its running configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BgpIntent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_asn: Option<String>,
    pub vrfs: BTreeMap<String, VrfIntent>,
}

/// Observed BGP sessions: VRF -> peer address -> session state label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BgpRuntimeState {
    pub vrfs: BTreeMap<String, BTreeMap<String, String>>,
}

impl BgpRuntimeState {
    pub fn peers(&self, vrf: &str) -> Option<&BTreeMap<String, String>> {
        self.vrfs.get(vrf)
    }

    #[cfg(test)]
    pub fn with_peer(mut self, vrf: &str, peer: &str, state: &str) -> Self {
        self.vrfs
            .entry(vrf.to_string())
            .or_default()
            .insert(peer.to_string(), state.to_string());
        self
    }

    /// Register a VRF with no peers
    #[cfg(test)]
    pub fn with_vrf(mut self, vrf: &str) -> Self {
        self.vrfs.entry(vrf.to_string()).or_default();
        self
    }
}

/// Overall status line for a VRF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrfStatus {
    AllPeersUp,
    NoOperationalNeighbors,
}

impl fmt::Display for VrfStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllPeersUp => write!(f, "All the configured BGP peers are up in this VRF"),
            Self::NoOperationalNeighbors => {
                write!(f, "There are no operational BGP neighbors in this VRF.")
            }
        }
    }
}

/// Why a configured neighbor is unhealthy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborAnomaly {
    /// Neighbor is configured but absent from the VRF's session table
    NotOperational,
    /// Session exists but is not Established
    State(String),
}

impl fmt::Display for NeighborAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOperational => write!(f, "BGP is NOT operational for this neighbor"),
            Self::State(label) => write!(f, "Neighbor state is {}", label),
        }
    }
}

/// Reconciliation result for one VRF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrfFinding {
    pub status: Option<VrfStatus>,
    pub anomalies: BTreeMap<String, NeighborAnomaly>,
    pub configured_neighbors: Vec<String>,
}

impl VrfFinding {
    /// Flatten into `(label, message)` lines in report order
    pub fn lines(&self) -> Vec<(String, String)> {
        let mut lines = Vec::with_capacity(self.anomalies.len() + 2);
        if let Some(status) = &self.status {
            lines.push(("Status".to_string(), status.to_string()));
        }
        for (neighbor, anomaly) in &self.anomalies {
            lines.push((neighbor.clone(), anomaly.to_string()));
        }
        lines.push((
            "Configured Neighbors".to_string(),
            self.configured_neighbors.join(", "),
        ));
        lines
    }
}

impl Serialize for VrfFinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.anomalies.len() + usize::from(self.status.is_some()) + 1;
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(status) = &self.status {
            map.serialize_entry("Status", &status.to_string())?;
        }
        for (neighbor, anomaly) in &self.anomalies {
            map.serialize_entry(neighbor, &anomaly.to_string())?;
        }
        map.serialize_entry("Configured Neighbors", &self.configured_neighbors)?;
        map.end()
    }
}

/// Per-device BGP assessment outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceBgpFindings {
    /// No `router bgp` block in the running configuration
    NotConfigured,
    Vrfs(BTreeMap<String, VrfFinding>),
}

impl DeviceBgpFindings {
    pub const NOT_CONFIGURED: &'static str = "BGP is not configured on this switch.";

    /// An empty VRF map carries nothing worth reporting
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Vrfs(vrfs) if vrfs.is_empty())
    }
}

impl Serialize for DeviceBgpFindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotConfigured => serializer.serialize_str(Self::NOT_CONFIGURED),
            Self::Vrfs(vrfs) => vrfs.serialize(serializer),
        }
    }
}
