use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use super::{bgp, mlag, topology};
use crate::eapi::{DeviceApi, DeviceError};
use crate::models::{
    Device, DeviceBgpFindings, FleetReport, MlagFindings, TopologyLink, TopologyReport,
    ValidatorReport,
};

/// Run the BGP validator against one device
pub async fn assess_device_bgp(
    api: &dyn DeviceApi,
    device: &Device,
) -> Result<DeviceBgpFindings, DeviceError> {
    let running_config = api.running_config(device).await?;

    let Some(router_bgp) = bgp::find_router_bgp(&running_config) else {
        return Ok(DeviceBgpFindings::NotConfigured);
    };
    let intent = bgp::extract(&router_bgp);

    let runtime = api.bgp_summary(device).await?;
    Ok(DeviceBgpFindings::Vrfs(bgp::reconcile(&intent, &runtime)))
}

/// Run the MLAG validator against one device
pub async fn assess_device_mlag(
    api: &dyn DeviceApi,
    device: &Device,
) -> Result<MlagFindings, DeviceError> {
    let state = api.mlag_status(device).await?;
    Ok(mlag::classify(&state))
}

async fn collect_device_links(
    api: &dyn DeviceApi,
    device: &Device,
) -> Result<Vec<TopologyLink>, DeviceError> {
    let neighbors = api.lldp_neighbors(device).await?;
    if neighbors.is_empty() {
        return Ok(Vec::new());
    }
    let bandwidths = api.interface_bandwidths(device).await?;
    Ok(topology::device_links(device, &neighbors, &bandwidths))
}

/// FleetAssessor drives every validator across the device set.
/// Devices are processed independently; a device failure only lands in the
/// error map of the stage that failed.
pub struct FleetAssessor {
    api: Arc<dyn DeviceApi>,
    concurrency: usize,
    precheck: bool,
    topology: bool,
}

impl FleetAssessor {
    pub fn new(api: Arc<dyn DeviceApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
            precheck: true,
            topology: true,
        }
    }

    pub fn with_precheck(mut self, enabled: bool) -> Self {
        self.precheck = enabled;
        self
    }

    pub fn with_topology(mut self, enabled: bool) -> Self {
        self.topology = enabled;
        self
    }

    /// Run `op` for every device with at most `concurrency` in flight.
    /// Results come back in completion order.
    async fn fan_out<T, F, Fut>(&self, devices: &[Device], op: F) -> Vec<(Device, T)>
    where
        F: Fn(Device) -> Fut,
        Fut: Future<Output = T>,
    {
        stream::iter(devices.iter().cloned())
            .map(|device| {
                let fut = op(device.clone());
                async move { (device, fut.await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }

    /// Fetch every device's hostname. Returns the reachable devices (with
    /// hostnames filled in, inventory order kept) and the failures.
    pub async fn check_reachability(
        &self,
        devices: Vec<Device>,
    ) -> (Vec<Device>, BTreeMap<String, String>) {
        let api = self.api.as_ref();
        let results = self
            .fan_out(&devices, |device| async move { api.hostname(&device).await })
            .await;

        let mut hostnames = HashMap::new();
        let mut errors = BTreeMap::new();
        for (device, outcome) in results {
            match outcome {
                Ok(hostname) => {
                    hostnames.insert(device.address, hostname);
                }
                Err(e) => {
                    tracing::warn!("Device {} unreachable: {}", device.address, e.reason());
                    errors.insert(device.address, e.reason());
                }
            }
        }

        let reachable = devices
            .into_iter()
            .filter_map(|mut device| {
                let hostname = hostnames.remove(&device.address)?;
                device.hostname = Some(hostname);
                Some(device)
            })
            .collect();

        (reachable, errors)
    }

    pub async fn assess_bgp(&self, devices: &[Device]) -> ValidatorReport<DeviceBgpFindings> {
        let api = self.api.as_ref();
        let results = self
            .fan_out(devices, |device| async move { assess_device_bgp(api, &device).await })
            .await;

        let mut report = ValidatorReport::default();
        for (device, outcome) in results {
            match outcome {
                Ok(findings) if findings.is_empty() => {
                    tracing::debug!("No BGP findings for {}", device.address);
                }
                Ok(findings) => report.insert_finding(&device.address, findings),
                Err(e) => {
                    tracing::warn!("BGP assessment failed for {}: {}", device.address, e.reason());
                    report.insert_error(&device.address, e.reason());
                }
            }
        }
        report
    }

    pub async fn assess_mlag(&self, devices: &[Device]) -> ValidatorReport<MlagFindings> {
        let api = self.api.as_ref();
        let results = self
            .fan_out(devices, |device| async move { assess_device_mlag(api, &device).await })
            .await;

        let mut report = ValidatorReport::default();
        for (device, outcome) in results {
            match outcome {
                Ok(findings) => report.insert_finding(&device.address, findings),
                Err(e) => {
                    tracing::warn!("MLAG assessment failed for {}: {}", device.address, e.reason());
                    report.insert_error(&device.address, e.reason());
                }
            }
        }
        report
    }

    pub async fn collect_topology(&self, devices: &[Device]) -> TopologyReport {
        let api = self.api.as_ref();
        let mut results = self
            .fan_out(devices, |device| async move { collect_device_links(api, &device).await })
            .await;
        // Stable link order regardless of completion order
        results.sort_by(|a, b| a.0.address.cmp(&b.0.address));

        let mut per_device = Vec::with_capacity(results.len());
        let mut errors = BTreeMap::new();
        for (device, outcome) in results {
            match outcome {
                Ok(links) => per_device.push(links),
                Err(e) => {
                    tracing::warn!("Topology collection failed for {}: {}", device.address, e.reason());
                    errors.insert(device.address, e.reason());
                }
            }
        }

        TopologyReport {
            links: topology::merge_links(per_device),
            errors,
        }
    }

    /// Full assessment: reachability pre-check, topology, then BGP and MLAG
    pub async fn run(&self, devices: Vec<Device>) -> FleetReport {
        let started_at = Utc::now();
        tracing::info!(
            "Assessing {} devices (concurrency={}, precheck={})",
            devices.len(),
            self.concurrency,
            self.precheck
        );

        let (reachable, reachability_errors) = if self.precheck {
            self.check_reachability(devices.clone()).await
        } else {
            (devices.clone(), BTreeMap::new())
        };

        let inventory = devices
            .into_iter()
            .map(|device| {
                reachable
                    .iter()
                    .find(|r| r.address == device.address)
                    .cloned()
                    .unwrap_or(device)
            })
            .collect();

        let topology = if self.topology {
            Some(self.collect_topology(&reachable).await)
        } else {
            None
        };

        let (bgp, mlag) = tokio::join!(self.assess_bgp(&reachable), self.assess_mlag(&reachable));

        let report = FleetReport {
            started_at,
            completed_at: Utc::now(),
            devices: inventory,
            reachability_errors,
            topology,
            bgp,
            mlag,
        };
        tracing::info!("Assessment finished: {}", report.summary());
        report
    }
}
