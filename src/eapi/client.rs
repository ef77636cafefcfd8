use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

use super::types::*;
use super::{DeviceApi, DeviceError};
use crate::config::EapiSettings;
use crate::models::{BgpRuntimeState, ConfigNode, Device, LldpNeighbor, MlagRuntimeState};

const CMD_ENABLE: &str = "enable";
const CMD_HOSTNAME: &str = "show hostname";
const CMD_RUNNING_CONFIG: &str = "show running-config";
const CMD_BGP_SUMMARY: &str = "show ip bgp summary vrf all";
const CMD_MLAG: &str = "show mlag";
const CMD_LLDP_NEIGHBORS: &str = "show lldp neighbors";
const CMD_INTERFACES_STATUS: &str = "show interfaces status";

/// Arista eAPI client (JSON-RPC `runCmds` over HTTP/HTTPS)
pub struct EapiClient {
    settings: EapiSettings,
    client: Client,
}

impl EapiClient {
    pub fn new(settings: EapiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { settings, client })
    }

    fn api_url(&self, host: &str) -> String {
        match self.settings.port {
            Some(port) => format!("{}://{}:{}/command-api", self.settings.transport, host, port),
            None => format!("{}://{}/command-api", self.settings.transport, host),
        }
    }

    /// Run a batch of commands, returning one JSON result per command
    async fn run_cmds(&self, device: &Device, cmds: &[&str]) -> Result<Vec<serde_json::Value>, DeviceError> {
        let request = RunCmdsRequest::new(cmds);

        let resp = self
            .client
            .post(self.api_url(&device.address))
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| DeviceError::connectivity(&device.address, e))?;

        if !resp.status().is_success() {
            return Err(DeviceError::connectivity(
                &device.address,
                format!("eAPI returned HTTP {}", resp.status()),
            ));
        }

        let rpc: RunCmdsResponse = resp
            .json()
            .await
            .map_err(|e| DeviceError::command(&device.address, format!("invalid eAPI response: {}", e)))?;

        if let Some(err) = rpc.error {
            return Err(DeviceError::command(
                &device.address,
                format!("{} (code {})", err.message, err.code),
            ));
        }

        rpc.result
            .ok_or_else(|| DeviceError::command(&device.address, "eAPI response has no result"))
    }

    async fn run_one<T: DeserializeOwned>(&self, device: &Device, cmd: &str) -> Result<T, DeviceError> {
        let results = self.run_cmds(device, &[cmd]).await?;
        decode(device, cmd, results, 0)
    }
}

/// Decode the output of the command at `index`
fn decode<T: DeserializeOwned>(
    device: &Device,
    cmd: &str,
    results: Vec<serde_json::Value>,
    index: usize,
) -> Result<T, DeviceError> {
    let value = results
        .into_iter()
        .nth(index)
        .ok_or_else(|| DeviceError::command(&device.address, format!("no output for '{}'", cmd)))?;

    serde_json::from_value(value).map_err(|e| {
        DeviceError::command(&device.address, format!("unexpected output for '{}': {}", cmd, e))
    })
}

#[async_trait::async_trait]
impl DeviceApi for EapiClient {
    async fn hostname(&self, device: &Device) -> Result<String, DeviceError> {
        let output: ShowHostname = self.run_one(device, CMD_HOSTNAME).await?;
        Ok(output.into_name())
    }

    async fn running_config(&self, device: &Device) -> Result<ConfigNode, DeviceError> {
        let results = self.run_cmds(device, &[CMD_ENABLE, CMD_RUNNING_CONFIG]).await?;
        decode(device, CMD_RUNNING_CONFIG, results, 1)
    }

    async fn bgp_summary(&self, device: &Device) -> Result<BgpRuntimeState, DeviceError> {
        let output: ShowBgpSummary = self.run_one(device, CMD_BGP_SUMMARY).await?;
        Ok(output.into())
    }

    async fn mlag_status(&self, device: &Device) -> Result<MlagRuntimeState, DeviceError> {
        self.run_one(device, CMD_MLAG).await
    }

    async fn lldp_neighbors(&self, device: &Device) -> Result<Vec<LldpNeighbor>, DeviceError> {
        let output: ShowLldpNeighbors = self.run_one(device, CMD_LLDP_NEIGHBORS).await?;
        Ok(output.lldp_neighbors)
    }

    async fn interface_bandwidths(&self, device: &Device) -> Result<BTreeMap<String, f64>, DeviceError> {
        let output: ShowInterfacesStatus = self.run_one(device, CMD_INTERFACES_STATUS).await?;
        Ok(output
            .interface_statuses
            .into_iter()
            .map(|(name, status)| (name, status.bandwidth))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    // admin:secret
    const AUTH: &str = "Basic YWRtaW46c2VjcmV0";

    async fn fake_eapi(headers: HeaderMap, Json(req): Json<Value>) -> Response {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(AUTH) {
            return StatusCode::UNAUTHORIZED.into_response();
        }

        let cmds: Vec<String> = req["params"]["cmds"]
            .as_array()
            .map(|a| a.iter().filter_map(|c| c.as_str().map(String::from)).collect())
            .unwrap_or_default();

        if cmds.iter().any(|c| c == "show mlag") {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": { "code": 1002, "message": "CLI command 1 of 1 'show mlag' failed: invalid command" }
            }))
            .into_response();
        }

        let result: Vec<Value> = cmds
            .iter()
            .map(|cmd| match cmd.as_str() {
                "show hostname" => json!({ "hostname": "leaf1", "fqdn": "leaf1.lab" }),
                "show running-config" => json!({
                    "header": ["! device: leaf1"],
                    "cmds": {
                        "router bgp 65001": {
                            "comments": [],
                            "cmds": { "neighbor 10.0.0.1 remote-as 65000": null }
                        }
                    }
                }),
                "show lldp neighbors" => json!({
                    "lldpNeighbors": [
                        { "port": "Ethernet49", "neighborDevice": "spine1", "neighborPort": "Ethernet1", "ttl": 120 }
                    ]
                }),
                "show interfaces status" => json!({
                    "interfaceStatuses": { "Ethernet49": { "bandwidth": 100000000000u64 } }
                }),
                // Wrong shape on purpose
                "show ip bgp summary vrf all" => json!({ "vrfs": "none" }),
                _ => json!({}),
            })
            .collect();

        Json(json!({ "jsonrpc": "2.0", "id": req["id"], "result": result })).into_response()
    }

    async fn spawn_fake_eapi() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route("/command-api", post(fake_eapi));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    fn client(port: u16, password: &str) -> EapiClient {
        EapiClient::new(EapiSettings {
            username: "admin".to_string(),
            password: password.to_string(),
            transport: "http".to_string(),
            port: Some(port),
            timeout_secs: 5,
            verify_tls: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_hostname_and_running_config() {
        let port = spawn_fake_eapi().await;
        let api = client(port, "secret");
        let device = Device::new("127.0.0.1");

        assert_eq!(api.hostname(&device).await.unwrap(), "leaf1.lab");

        let config = api.running_config(&device).await.unwrap();
        let bgp = config.child("router bgp 65001").unwrap();
        assert!(bgp.cmds.contains_key("neighbor 10.0.0.1 remote-as 65000"));
    }

    #[tokio::test]
    async fn test_topology_commands() {
        let port = spawn_fake_eapi().await;
        let api = client(port, "secret");
        let device = Device::new("127.0.0.1");

        let neighbors = api.lldp_neighbors(&device).await.unwrap();
        assert_eq!(neighbors[0].neighbor_device, "spine1");

        let speeds = api.interface_bandwidths(&device).await.unwrap();
        assert_eq!(speeds["Ethernet49"], 100_000_000_000.0);
    }

    #[tokio::test]
    async fn test_rpc_error_is_command_error() {
        let port = spawn_fake_eapi().await;
        let err = client(port, "secret")
            .mlag_status(&Device::new("127.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Command { .. }));
        assert!(err.reason().contains("invalid command"));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_command_error() {
        let port = spawn_fake_eapi().await;
        let err = client(port, "secret")
            .bgp_summary(&Device::new("127.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Command { .. }));
    }

    #[tokio::test]
    async fn test_auth_failure_is_connectivity_error() {
        let port = spawn_fake_eapi().await;
        let err = client(port, "wrong")
            .hostname(&Device::new("127.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Connectivity { .. }));
        assert!(err.reason().contains("401"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connectivity_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client(port, "secret")
            .hostname(&Device::new("127.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Connectivity { .. }));
        assert_eq!(err.device(), "127.0.0.1");
    }
}
