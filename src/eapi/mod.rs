pub mod client;
pub mod types;

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{BgpRuntimeState, ConfigNode, Device, LldpNeighbor, MlagRuntimeState};

pub use client::EapiClient;

/// Failure talking to a device. Only two kinds are recognised; both are
/// recorded against the device and never abort a fleet run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Device unreachable, timed out, or refused the session
    Connectivity { device: String, detail: String },
    /// Device rejected the command or answered with an unexpected shape
    Command { device: String, detail: String },
}

impl DeviceError {
    pub fn connectivity(device: &str, detail: impl fmt::Display) -> Self {
        Self::Connectivity {
            device: device.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn command(device: &str, detail: impl fmt::Display) -> Self {
        Self::Command {
            device: device.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn device(&self) -> &str {
        match self {
            Self::Connectivity { device, .. } | Self::Command { device, .. } => device,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "ConnectionError: unable to connect to eAPI",
            Self::Command { .. } => "CommandError: Check your EOS command syntax",
        }
    }

    /// Categorised, human-readable reason for the error maps
    pub fn reason(&self) -> String {
        match self {
            Self::Connectivity { detail, .. } | Self::Command { detail, .. } if !detail.is_empty() => {
                format!("{} ({})", self.category(), detail)
            }
            _ => self.category().to_string(),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device(), self.reason())
    }
}

impl std::error::Error for DeviceError {}

/// Structured command access to a switch
#[async_trait::async_trait]
pub trait DeviceApi: Send + Sync {
    async fn hostname(&self, device: &Device) -> Result<String, DeviceError>;

    async fn running_config(&self, device: &Device) -> Result<ConfigNode, DeviceError>;

    async fn bgp_summary(&self, device: &Device) -> Result<BgpRuntimeState, DeviceError>;

    async fn mlag_status(&self, device: &Device) -> Result<MlagRuntimeState, DeviceError>;

    async fn lldp_neighbors(&self, device: &Device) -> Result<Vec<LldpNeighbor>, DeviceError>;

    /// Interface name -> bandwidth in bits per second
    async fn interface_bandwidths(&self, device: &Device) -> Result<BTreeMap<String, f64>, DeviceError>;
}
