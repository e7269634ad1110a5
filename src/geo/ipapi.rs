use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::visit::GeoRecord;

/// Client for an ipapi.co-compatible JSON lookup service.
pub struct IpApiClient {
    client: reqwest::Client,
    endpoint: String,
}

/// Subset of the ipapi.co response body we keep.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    org: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpApiClient {
    pub fn new(endpoint: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Look up `ip`. Any failure yields [`GeoRecord::placeholder`].
    pub async fn lookup(&self, ip: IpAddr) -> GeoRecord {
        match self.fetch(ip).await {
            Ok(record) => record,
            Err(e) => {
                warn!(ip = %ip, error = %e, "Geo lookup failed, using placeholder");
                GeoRecord::placeholder()
            }
        }
    }

    async fn fetch(&self, ip: IpAddr) -> reqwest::Result<GeoRecord> {
        let url = format!("{}/{}/json/", self.endpoint, ip);
        let body: IpApiResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.error {
            debug!(ip = %ip, reason = body.reason.as_deref().unwrap_or("-"), "Geo service has no data for address");
        }

        Ok(GeoRecord {
            city: body.city,
            region: body.region,
            country: body.country_name,
            isp: body.org,
        })
    }
}
