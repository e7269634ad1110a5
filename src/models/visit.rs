use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort location of a captured address.
///
/// Every field is optional: a provider that answers but knows nothing about an
/// address (reserved ranges, for example) leaves them empty, which the report
/// renders as `N/A`.
///
/// Also reads geo objects stored as raw ipapi bodies, where the country name
/// and operator live under `country_name` and `org`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredGeo")]
pub struct GeoRecord {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub isp: Option<String>,
}

/// On-disk geo object in either the native or the ipapi layout. Both may
/// carry `country`; in ipapi bodies it is only the ISO code.
#[derive(Deserialize)]
struct StoredGeo {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
}

impl From<StoredGeo> for GeoRecord {
    fn from(stored: StoredGeo) -> Self {
        Self {
            city: stored.city,
            region: stored.region,
            country: stored.country_name.or(stored.country),
            isp: stored.isp.or(stored.org),
        }
    }
}

impl GeoRecord {
    /// Record substituted whenever a lookup fails.
    pub fn placeholder() -> Self {
        Self {
            city: Some("Unknown".to_string()),
            region: Some("Unknown".to_string()),
            country: Some("Unknown".to_string()),
            isp: Some("Unknown ISP".to_string()),
        }
    }
}

/// A capture that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    pub ip: String,
    pub geo: GeoRecord,
    pub user_agent: String,
    pub referrer: String,
    pub timestamp: String,
}

impl NewVisit {
    /// Build a capture stamped with the current UTC time.
    pub fn now(ip: String, geo: GeoRecord, user_agent: String, referrer: String) -> Self {
        Self {
            ip,
            geo,
            user_agent,
            referrer,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn with_id(self, id: i64) -> Visit {
        Visit {
            id,
            ip: self.ip,
            geo: self.geo,
            user_agent: self.user_agent,
            referrer: self.referrer,
            timestamp: self.timestamp,
        }
    }
}

/// One persisted capture. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default)]
    pub id: i64,
    pub ip: String,
    #[serde(default)]
    pub geo: GeoRecord,
    pub user_agent: String,
    pub referrer: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_iso8601_millis_utc() {
        let visit = NewVisit::now(
            "1.2.3.4".into(),
            GeoRecord::default(),
            "ua".into(),
            "direct".into(),
        );
        assert!(visit.timestamp.ends_with('Z'));
        assert_eq!(visit.timestamp.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&visit.timestamp).is_ok());
    }

    #[test]
    fn test_serialized_field_names() {
        let visit = NewVisit {
            ip: "1.2.3.4".into(),
            geo: GeoRecord::placeholder(),
            user_agent: "curl/8.0".into(),
            referrer: "direct".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
        }
        .with_id(7);

        let json = serde_json::to_value(&visit).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["userAgent"], "curl/8.0");
        assert_eq!(json["geo"]["isp"], "Unknown ISP");
    }

    #[test]
    fn test_missing_geo_fields_deserialize_as_none() {
        let geo: GeoRecord = serde_json::from_str(r#"{"city":"Oslo"}"#).unwrap();
        assert_eq!(geo.city.as_deref(), Some("Oslo"));
        assert!(geo.region.is_none());
        assert!(geo.isp.is_none());
    }

    #[test]
    fn test_ipapi_layout_prefers_full_names() {
        let geo: GeoRecord = serde_json::from_str(
            r#"{"city":"Oslo","region":"Oslo","country":"NO","country_name":"Norway","org":"Telenor","asn":"AS2119"}"#,
        )
        .unwrap();
        assert_eq!(geo.country.as_deref(), Some("Norway"));
        assert_eq!(geo.isp.as_deref(), Some("Telenor"));

        let native: GeoRecord =
            serde_json::from_str(r#"{"country":"Norway","isp":"Telenor"}"#).unwrap();
        assert_eq!(native.country, geo.country);
        assert_eq!(native.isp, geo.isp);
    }
}
