use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Control-plane state label that counts as healthy
pub const MLAG_ACTIVE: &str = "active";

/// Port-channel counts by MLAG class, as reported under `mlagPorts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlagPortCounts {
    #[serde(rename = "Active-full", default)]
    pub active_full: u32,
    #[serde(rename = "Inactive", default)]
    pub inactive: u32,
    #[serde(rename = "Active-partial", default)]
    pub active_partial: u32,
}

/// Flat `show mlag` snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlagRuntimeState {
    #[serde(default, deserialize_with = "present")]
    pub domain_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub peer_link: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub local_interface: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub mlag_ports: MlagPortCounts,
}

/// Absent key stays `None`; a key that is present maps to `Some` even when null
fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_default()))
}

impl MlagRuntimeState {
    /// MLAG counts as configured only when all three identifiers are present
    pub fn is_configured(&self) -> bool {
        self.domain_id.is_some() && self.peer_link.is_some() && self.local_interface.is_some()
    }
}

/// Port-channel classes, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortChannelClass {
    ActiveFull,
    Inactive,
    ActivePartial,
}

impl PortChannelClass {
    pub const ALL: [PortChannelClass; 3] = [Self::ActiveFull, Self::Inactive, Self::ActivePartial];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ActiveFull => "MLAG Active-full Port Channels",
            Self::Inactive => "MLAG Inactive Port Channels",
            Self::ActivePartial => "MLAG Active-partial Port Channels",
        }
    }

    pub fn count(&self, ports: &MlagPortCounts) -> u32 {
        match self {
            Self::ActiveFull => ports.active_full,
            Self::Inactive => ports.inactive,
            Self::ActivePartial => ports.active_partial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPlane {
    Active,
    NotActive(String),
}

impl fmt::Display for ControlPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "MLAG Control Plane is active"),
            Self::NotActive(state) => write!(
                f,
                "MLAG Control Plane is not Active. Its current state is {}",
                state
            ),
        }
    }
}

/// Per-device MLAG classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlagFindings {
    NotConfigured,
    Assessed {
        control_plane: ControlPlane,
        /// Only classes with a non-zero count
        port_channels: Vec<(PortChannelClass, u32)>,
    },
}

impl MlagFindings {
    pub const NOT_CONFIGURED: &'static str = "MLAG is not configured in this switch";

    pub fn lines(&self) -> Vec<(String, String)> {
        match self {
            Self::NotConfigured => Vec::new(),
            Self::Assessed { control_plane, port_channels } => {
                let mut lines = vec![("MLAG Control Plane".to_string(), control_plane.to_string())];
                lines.extend(
                    port_channels
                        .iter()
                        .map(|(class, count)| (class.label().to_string(), count.to_string())),
                );
                lines
            }
        }
    }
}

impl Serialize for MlagFindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotConfigured => serializer.serialize_str(Self::NOT_CONFIGURED),
            Self::Assessed { .. } => {
                let lines = self.lines();
                let mut map = serializer.serialize_map(Some(lines.len()))?;
                for (label, message) in &lines {
                    map.serialize_entry(label, message)?;
                }
                map.end()
            }
        }
    }
}
