use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults;

/// Top-level configuration for the pixeltrap service.
/// Deserializes from a TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "defaults::default_server_config")]
    pub server: ServerConfig,

    #[serde(default = "defaults::default_storage_config")]
    pub storage: StorageConfig,

    #[serde(default = "defaults::default_geo_config")]
    pub geo: GeoConfig,

    #[serde(default = "defaults::default_assets_config")]
    pub assets: AssetsConfig,

    #[serde(default = "defaults::default_landing_config")]
    pub landing: LandingConfig,

    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Load from `path` if it exists, otherwise fall back to built-in defaults.
    ///
    /// An explicitly requested file that is missing is an error; the implicit
    /// default path is allowed to be absent.
    pub fn load_or_default(path: &str, explicit: bool) -> Result<Self> {
        if explicit || Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Apply the `PORT` environment override.
    pub fn apply_env(&mut self) {
        self.apply_port_override(std::env::var("PORT").ok().as_deref());
    }

    fn apply_port_override(&mut self, value: Option<&str>) {
        if let Some(port) = value.and_then(|v| v.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: defaults::default_server_config(),
            storage: defaults::default_storage_config(),
            geo: defaults::default_geo_config(),
            assets: defaults::default_assets_config(),
            landing: defaults::default_landing_config(),
            logging: defaults::default_logging_config(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::default_host")]
    pub host: String,

    #[serde(default = "defaults::default_port")]
    pub port: u16,
}

/// Which persistence backend holds captured visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
}

/// Visit store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::default_storage_backend")]
    pub backend: StorageBackend,

    #[serde(default = "defaults::default_sqlite_path")]
    pub sqlite_path: String,

    #[serde(default = "defaults::default_json_path")]
    pub json_path: String,
}

/// Source of geolocation data for captured addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoProvider {
    Ipapi,
    Maxmind,
    Disabled,
}

/// Geolocation lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "defaults::default_geo_provider")]
    pub provider: GeoProvider,

    /// Base URL of the ipapi-compatible lookup service.
    #[serde(default = "defaults::default_geo_endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::default_geo_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "defaults::default_city_db")]
    pub city_db: String,

    #[serde(default = "defaults::default_asn_db")]
    pub asn_db: String,
}

/// Static asset locations.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "defaults::default_public_dir")]
    pub public_dir: String,

    /// File name, relative to `public_dir`, served by the tracking endpoint.
    #[serde(default = "defaults::default_tracking_image")]
    pub tracking_image: String,
}

impl AssetsConfig {
    pub fn tracking_image_path(&self) -> PathBuf {
        Path::new(&self.public_dir).join(&self.tracking_image)
    }
}

/// Social-preview copy for the landing page.
#[derive(Debug, Clone, Deserialize)]
pub struct LandingConfig {
    #[serde(default = "defaults::default_landing_title")]
    pub title: String,

    #[serde(default = "defaults::default_landing_description")]
    pub description: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    pub level: String,

    /// Log file path; an empty string disables file output.
    #[serde(default = "defaults::default_log_file")]
    pub file: String,
}
