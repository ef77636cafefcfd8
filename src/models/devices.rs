use serde::Serialize;

/// Device represents one switch in the assessed fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Management address as listed in the inventory; also the report key
    pub address: String,
    /// Hostname learned during the reachability pre-check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Device {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            hostname: None,
        }
    }

    /// Hostname if known, otherwise the management address
    pub fn name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.address)
    }
}
