pub mod ipapi;
pub mod maxmind;

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::settings::{GeoConfig, GeoProvider};
use crate::models::visit::GeoRecord;

use self::ipapi::IpApiClient;
use self::maxmind::MaxMindLookup;

/// Maps a captured address to a best-effort location.
///
/// [`GeoResolver::resolve`] never fails: every error path collapses into
/// [`GeoRecord::placeholder`].
pub enum GeoResolver {
    IpApi(IpApiClient),
    MaxMind(MaxMindLookup),
    Disabled,
}

impl GeoResolver {
    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        let resolver = match config.provider {
            GeoProvider::Ipapi => {
                let client =
                    IpApiClient::new(&config.endpoint, Duration::from_millis(config.timeout_ms))
                        .context("Failed to build geo lookup HTTP client")?;
                info!(endpoint = %config.endpoint, timeout_ms = config.timeout_ms, "Using ipapi geo lookup");
                GeoResolver::IpApi(client)
            }
            GeoProvider::Maxmind => {
                let db = MaxMindLookup::new(&config.city_db, &config.asn_db);
                if !db.has_city_db() && !db.has_asn_db() {
                    warn!("No MaxMind database available, every lookup will use the placeholder");
                }
                info!(city = db.has_city_db(), asn = db.has_asn_db(), "Using MaxMind geo lookup");
                GeoResolver::MaxMind(db)
            }
            GeoProvider::Disabled => {
                info!("Geo lookup disabled");
                GeoResolver::Disabled
            }
        };
        Ok(resolver)
    }

    /// Resolve the address string recorded for a capture.
    ///
    /// Strings that are not IP addresses (`"unknown"`, spoofed header values)
    /// are never forwarded to a provider.
    pub async fn resolve(&self, ip: &str) -> GeoRecord {
        let addr = match ip.parse::<IpAddr>() {
            Ok(addr) => addr.to_canonical(),
            Err(_) => {
                debug!(ip, "Not an IP address, skipping geo lookup");
                return GeoRecord::placeholder();
            }
        };

        match self {
            GeoResolver::IpApi(client) => client.lookup(addr).await,
            GeoResolver::MaxMind(db) => db.lookup(addr),
            GeoResolver::Disabled => GeoRecord::placeholder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;

    #[tokio::test]
    async fn test_disabled_returns_placeholder() {
        let resolver = GeoResolver::Disabled;
        assert_eq!(resolver.resolve("8.8.8.8").await, GeoRecord::placeholder());
    }

    #[tokio::test]
    async fn test_non_ip_input_skips_provider() {
        let mut config = defaults::default_geo_config();
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.timeout_ms = 500;
        let resolver = GeoResolver::from_config(&config).unwrap();
        assert_eq!(resolver.resolve("unknown").await, GeoRecord::placeholder());
        assert_eq!(resolver.resolve("1.2.3.4; rm -rf").await, GeoRecord::placeholder());
    }

    #[test]
    fn test_from_config_selects_provider() {
        let mut config = defaults::default_geo_config();
        assert!(matches!(GeoResolver::from_config(&config).unwrap(), GeoResolver::IpApi(_)));

        config.provider = GeoProvider::Maxmind;
        config.city_db = "/nonexistent/city.mmdb".to_string();
        config.asn_db = "/nonexistent/asn.mmdb".to_string();
        assert!(matches!(GeoResolver::from_config(&config).unwrap(), GeoResolver::MaxMind(_)));

        config.provider = GeoProvider::Disabled;
        assert!(matches!(GeoResolver::from_config(&config).unwrap(), GeoResolver::Disabled));
    }
}
