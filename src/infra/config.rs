//! Configuration loading from TOML files
//!
//! The worker's identity segments (gateway, sink, network, endpoints) pin
//! the corresponding topic-pattern segments; any left unset matches all
//! values on that level.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Identifier segments configured for this worker, all optional
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkerConfig {
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub sink_id: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub source_endpoint: Option<String>,
    #[serde(default)]
    pub destination_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// File path for stored records (JSONL format)
    #[serde(default = "default_storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { file: default_storage_file() }
    }
}

fn default_storage_file() -> String {
    "records.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Enable the HTTP control channel
    #[serde(default = "default_control_enabled")]
    pub enabled: bool,
    /// Endpoint receiving gateway-status items as JSON
    #[serde(default = "default_control_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_control_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: default_control_enabled(),
            endpoint: default_control_endpoint(),
            timeout_ms: default_control_timeout_ms(),
        }
    }
}

fn default_control_enabled() -> bool {
    true
}

fn default_control_endpoint() -> String {
    "http://localhost:8000/gateway_status".to_string()
}

fn default_control_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Start an embedded broker instead of expecting an external one
    #[serde(default)]
    pub embedded: bool,
    #[serde(default = "default_broker_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_broker_port")]
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            embedded: false,
            bind_address: default_broker_bind_address(),
            port: default_broker_port(),
        }
    }
}

fn default_broker_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Bound of each fanout queue
    #[serde(default = "default_queue_buffer")]
    pub buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { buffer: default_queue_buffer() }
    }
}

fn default_queue_buffer() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub queues: QueueConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    gateway_id: Option<String>,
    sink_id: Option<String>,
    network_id: Option<String>,
    source_endpoint: Option<String>,
    destination_endpoint: Option<String>,
    storage_file: String,
    control_enabled: bool,
    control_endpoint: String,
    control_timeout_ms: u64,
    broker_embedded: bool,
    broker_bind_address: String,
    broker_port: u16,
    metrics_interval_secs: u64,
    queue_buffer: usize,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_host: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_username: None,
            mqtt_password: None,
            gateway_id: None,
            sink_id: None,
            network_id: None,
            source_endpoint: None,
            destination_endpoint: None,
            storage_file: default_storage_file(),
            control_enabled: true,
            control_endpoint: default_control_endpoint(),
            control_timeout_ms: default_control_timeout_ms(),
            broker_embedded: false,
            broker_bind_address: default_broker_bind_address(),
            broker_port: default_broker_port(),
            metrics_interval_secs: default_metrics_interval(),
            queue_buffer: default_queue_buffer(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text; `origin` names the source in
    /// errors and logs.
    pub fn from_toml_str(content: &str, origin: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config {}", origin))?;

        Ok(Self {
            mqtt_host: toml_config.mqtt.host,
            mqtt_port: toml_config.mqtt.port,
            mqtt_username: toml_config.mqtt.username,
            mqtt_password: toml_config.mqtt.password,
            gateway_id: toml_config.worker.gateway_id,
            sink_id: toml_config.worker.sink_id,
            network_id: toml_config.worker.network_id,
            source_endpoint: toml_config.worker.source_endpoint,
            destination_endpoint: toml_config.worker.destination_endpoint,
            storage_file: toml_config.storage.file,
            control_enabled: toml_config.control.enabled,
            control_endpoint: toml_config.control.endpoint,
            control_timeout_ms: toml_config.control.timeout_ms,
            broker_embedded: toml_config.broker.embedded,
            broker_bind_address: toml_config.broker.bind_address,
            broker_port: toml_config.broker.port,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            queue_buffer: toml_config.queues.buffer,
            config_file: origin.to_string(),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt_username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt_password.as_deref()
    }

    pub fn gateway_id(&self) -> Option<&str> {
        self.gateway_id.as_deref()
    }

    pub fn sink_id(&self) -> Option<&str> {
        self.sink_id.as_deref()
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    pub fn source_endpoint(&self) -> Option<&str> {
        self.source_endpoint.as_deref()
    }

    pub fn destination_endpoint(&self) -> Option<&str> {
        self.destination_endpoint.as_deref()
    }

    pub fn storage_file(&self) -> &str {
        &self.storage_file
    }

    pub fn control_enabled(&self) -> bool {
        self.control_enabled
    }

    pub fn control_endpoint(&self) -> &str {
        &self.control_endpoint
    }

    pub fn control_timeout_ms(&self) -> u64 {
        self.control_timeout_ms
    }

    pub fn broker_embedded(&self) -> bool {
        self.broker_embedded
    }

    pub fn broker_bind_address(&self) -> &str {
        &self.broker_bind_address
    }

    pub fn broker_port(&self) -> u16 {
        self.broker_port
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn queue_buffer(&self) -> usize {
        self.queue_buffer
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
