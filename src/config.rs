// src/config.rs
use anyhow::Result;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub socket: SocketConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProbeConfig {
    pub host: String,
    pub service: String,
    pub request_path: String,
    pub accepted_versions: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            host: "www.google.com".to_string(),
            service: "http".to_string(),
            request_path: "/".to_string(),
            accepted_versions: vec!["HTTP/1.0".to_string(), "HTTP/1.1".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SocketConfig {
    /// Seconds to wait for connect/read. 0 disables the timeout.
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        SocketConfig {
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}
