//! Configuration types for fleet

use serde::{Deserialize, Serialize};

use crate::model::ClusterNode;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// API server configuration
    pub api: ApiConfig,
    /// Job dispatch configuration
    pub dispatch: DispatchConfig,
    /// Cron trigger configuration
    pub cron: CronConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Nodes seeded into the in-memory cluster registry
    pub clusters: Vec<ClusterNode>,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::FleetError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::FleetError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| crate::FleetError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the REST API server
    pub address: String,
    /// Port for the REST API server
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9090,
            cors_enabled: true,
        }
    }
}

/// Job dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Client-level timeout for `/execute` calls; unbounded when unset
    pub timeout_secs: Option<u64>,
    /// Base URL used to derive repository clone URLs for scheduled firings
    pub repository_base_url: String,
    /// Branch used for scheduled firings
    pub default_branch: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            repository_base_url: "http://localhost:3000".to_string(),
            default_branch: "main".to_string(),
        }
    }
}

/// Resources requested by cron-triggered jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CronConfig {
    /// Tier scheduled jobs are billed against
    pub tier: String,
    /// CPU cores requested per firing
    pub cores: u32,
    /// Memory in megabytes requested per firing
    pub memory_mb: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            tier: "free".to_string(),
            cores: 2,
            memory_mb: 2048,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,
    /// Log format (json or text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}
