use replygen_common::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Inference server (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base address of the inference server's HTTP API
    pub base_url: String,
    /// Explicit path to the server executable; PATH is searched otherwise
    pub executable: Option<PathBuf>,
    /// Readiness probe attempts before boot is declared failed
    pub startup_probe_attempts: u32,
    /// Delay between readiness probes, in milliseconds
    pub startup_probe_interval_ms: u64,
    /// Grace period before a forceful kill on shutdown, in seconds
    pub shutdown_grace_secs: u64,
    /// Per-request timeout for generation calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            upstream: UpstreamConfig {
                base_url: "http://127.0.0.1:11434".to_string(),
                executable: None,
                startup_probe_attempts: 30,
                startup_probe_interval_ms: 500,
                shutdown_grace_secs: 5,
                request_timeout_secs: 300,
            },
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file or defaults, then apply env overrides
    pub fn load_with_env(path: Option<&PathBuf>) -> Result<AppConfig> {
        let mut config = Self::load(path)?;
        Self::apply_env(&mut config);
        Ok(config)
    }

    /// Load configuration from file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<AppConfig> {
        if let Some(path) = path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: AppConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        // Check default locations
        let default_paths = vec![
            PathBuf::from("replygen.json"),
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("replygen/config.json"),
        ];

        for path in default_paths {
            if path.exists() {
                debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                let config: AppConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        // Use defaults
        Ok(AppConfig::default())
    }

    /// Environment variables take precedence over the config file
    pub fn apply_env(config: &mut AppConfig) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            if !host.is_empty() {
                config.upstream.base_url = host;
            }
        }
        if let Ok(path) = std::env::var("OLLAMA_PATH") {
            if !path.is_empty() {
                config.upstream.executable = Some(PathBuf::from(path));
            }
        }
        if let Ok(port) = std::env::var("REPLYGEN_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
    }

    /// Save configuration to file
    pub fn save(config: &AppConfig, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
