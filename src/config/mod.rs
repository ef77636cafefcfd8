use std::env;

/// Connection settings for the eAPI device client
#[derive(Debug, Clone)]
pub struct EapiSettings {
    pub username: String,
    pub password: String,
    pub transport: String,
    pub port: Option<u16>,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub db_max_connections: u32,
    pub devices_file: String,
    pub eapi: EapiSettings,
    pub concurrency: usize,
    pub precheck: bool,
    pub schedule: String,
    pub report_path: String,
    pub topology_path: String,
    pub listen_addr: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            db_path: get_env("DB_PATH", "/data/fabric-audit.db"),
            db_max_connections: get_env("DB_MAX_CONNECTIONS", "5")
                .parse()
                .unwrap_or(5),
            devices_file: get_env("DEVICES_FILE", "switches.txt"),
            eapi: EapiSettings {
                username: get_env("EAPI_USERNAME", "admin"),
                password: get_env("EAPI_PASSWORD", ""),
                transport: parse_transport(&get_env("EAPI_TRANSPORT", "https")),
                port: get_env("EAPI_PORT", "").parse().ok(),
                timeout_secs: get_env("EAPI_TIMEOUT_SECS", "30").parse().unwrap_or(30),
                verify_tls: parse_bool(&get_env("EAPI_VERIFY_TLS", "false")),
            },
            concurrency: get_env("ASSESS_CONCURRENCY", "16")
                .parse()
                .unwrap_or(16)
                .max(1),
            precheck: parse_bool(&get_env("ASSESS_PRECHECK", "true")),
            schedule: get_env("ASSESS_SCHEDULE", ""),
            report_path: get_env("REPORT_PATH", "network_validation.html"),
            topology_path: get_env("TOPOLOGY_PATH", "network.graphml"),
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Only `http` and `https` are valid; anything else falls back to `https`
fn parse_transport(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "http" => "http".to_string(),
        _ => "https".to_string(),
    }
}
