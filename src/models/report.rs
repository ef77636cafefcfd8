use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Device, DeviceBgpFindings, MlagFindings, TopologyReport};

/// Findings and failures of one validator across the fleet.
/// A device appears in at most one of the two maps.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatorReport<T> {
    pub findings: BTreeMap<String, T>,
    pub errors: BTreeMap<String, String>,
}

impl<T> Default for ValidatorReport<T> {
    fn default() -> Self {
        Self {
            findings: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

impl<T> ValidatorReport<T> {
    pub fn insert_finding(&mut self, device: &str, finding: T) {
        self.errors.remove(device);
        self.findings.insert(device.to_string(), finding);
    }

    pub fn insert_error(&mut self, device: &str, reason: impl Into<String>) {
        self.findings.remove(device);
        self.errors.insert(device.to_string(), reason.into());
    }
}

/// Everything one assessment run produced, handed to the report renderer
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub devices: Vec<Device>,
    pub reachability_errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologyReport>,
    pub bgp: ValidatorReport<DeviceBgpFindings>,
    pub mlag: ValidatorReport<MlagFindings>,
}

impl FleetReport {
    pub fn has_errors(&self) -> bool {
        !self.reachability_errors.is_empty()
            || self.topology.as_ref().map_or(false, |t| !t.errors.is_empty())
            || !self.bgp.errors.is_empty()
            || !self.mlag.errors.is_empty()
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} devices, {} unreachable, BGP {} reported/{} failed, MLAG {} reported/{} failed",
            self.devices.len(),
            self.reachability_errors.len(),
            self.bgp.findings.len(),
            self.bgp.errors.len(),
            self.mlag.findings.len(),
            self.mlag.errors.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_report_keeps_device_in_one_map() {
        let mut report: ValidatorReport<MlagFindings> = ValidatorReport::default();
        report.insert_error("10.0.0.1", "ConnectionError: unable to connect to eAPI");
        report.insert_finding("10.0.0.1", MlagFindings::NotConfigured);
        assert!(report.errors.is_empty());
        assert_eq!(report.findings.len(), 1);

        report.insert_error("10.0.0.1", "CommandError: Check your EOS command syntax");
        assert!(report.findings.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_has_errors() {
        let mut report = FleetReport::default();
        assert!(!report.has_errors());
        report.mlag.insert_error("10.0.0.9", "boom");
        assert!(report.has_errors());
        assert!(report.summary().contains("MLAG 0 reported/1 failed"));
    }
}
