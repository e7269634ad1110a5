use super::settings::{
    AssetsConfig, GeoConfig, GeoProvider, LandingConfig, LoggingConfig, ServerConfig,
    StorageBackend, StorageConfig,
};

// ---------------------------------------------------------------------------
// Top-level struct defaults
// ---------------------------------------------------------------------------

pub fn default_server_config() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

pub fn default_storage_config() -> StorageConfig {
    StorageConfig {
        backend: default_storage_backend(),
        sqlite_path: default_sqlite_path(),
        json_path: default_json_path(),
    }
}

pub fn default_geo_config() -> GeoConfig {
    GeoConfig {
        provider: default_geo_provider(),
        endpoint: default_geo_endpoint(),
        timeout_ms: default_geo_timeout_ms(),
        city_db: default_city_db(),
        asn_db: default_asn_db(),
    }
}

pub fn default_assets_config() -> AssetsConfig {
    AssetsConfig {
        public_dir: default_public_dir(),
        tracking_image: default_tracking_image(),
    }
}

pub fn default_landing_config() -> LandingConfig {
    LandingConfig {
        title: default_landing_title(),
        description: default_landing_description(),
    }
}

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file: default_log_file(),
    }
}

// ---------------------------------------------------------------------------
// ServerConfig field defaults
// ---------------------------------------------------------------------------

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    3000
}

// ---------------------------------------------------------------------------
// StorageConfig field defaults
// ---------------------------------------------------------------------------

pub fn default_storage_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

pub fn default_sqlite_path() -> String {
    "data/pixeltrap.db".to_string()
}

pub fn default_json_path() -> String {
    "leaks.json".to_string()
}

// ---------------------------------------------------------------------------
// GeoConfig field defaults
// ---------------------------------------------------------------------------

pub fn default_geo_provider() -> GeoProvider {
    GeoProvider::Ipapi
}

pub fn default_geo_endpoint() -> String {
    "https://ipapi.co".to_string()
}

pub fn default_geo_timeout_ms() -> u64 {
    5000
}

pub fn default_city_db() -> String {
    "data/GeoLite2-City.mmdb".to_string()
}

pub fn default_asn_db() -> String {
    "data/GeoLite2-ASN.mmdb".to_string()
}

// ---------------------------------------------------------------------------
// AssetsConfig / LandingConfig field defaults
// ---------------------------------------------------------------------------

pub fn default_public_dir() -> String {
    "public".to_string()
}

pub fn default_tracking_image() -> String {
    "meme.jpg".to_string()
}

pub fn default_landing_title() -> String {
    "GTA Meme".to_string()
}

pub fn default_landing_description() -> String {
    "Relatable GTA V moment 😂".to_string()
}

// ---------------------------------------------------------------------------
// LoggingConfig field defaults
// ---------------------------------------------------------------------------

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_file() -> String {
    "logs/pixeltrap.log".to_string()
}
