use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::Device;

/// Loose dotted-quad pattern. Not anchored and no per-octet range check, so
/// tokens such as `10.0.0.0/24` or `1.2.3.4:179` still qualify.
fn ipv4_shape() -> Option<&'static regex_lite::Regex> {
    static RE: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    RE.get_or_init(|| regex_lite::Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").ok())
        .as_ref()
}

/// True if the token contains something shaped like an IPv4 address
pub fn looks_like_ipv4(token: &str) -> bool {
    ipv4_shape().map_or(false, |re| re.is_match(token))
}

/// Validate a hostname.
/// Allows alphanumeric, hyphens, dots, underscores and colons (IPv6 literals).
/// No path separators, whitespace or shell metacharacters.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }
    hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == ':')
}

/// Parse a device inventory: one management address per line.
/// Blank lines and `#` comments are skipped; duplicates keep the first entry.
pub fn parse_devices(content: &str) -> Vec<Device> {
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    for line in content.lines() {
        let entry = line.split('#').next().unwrap_or("").trim();
        if entry.is_empty() {
            continue;
        }
        if !is_valid_hostname(entry) {
            tracing::warn!("Skipping invalid device entry: {:?}", entry);
            continue;
        }
        if seen.insert(entry.to_string()) {
            devices.push(Device::new(entry));
        }
    }

    devices
}

/// Read and parse the device inventory file
pub async fn load_devices(path: &str) -> Result<Vec<Device>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read device list {}", path))?;
    Ok(parse_devices(&content))
}
