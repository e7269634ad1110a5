use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use tracing::{info, warn};

use crate::models::visit::GeoRecord;

/// Offline geolocation backed by MaxMind GeoLite2 databases.
///
/// Either database may be absent; the parts it would have supplied keep their
/// placeholder values.
pub struct MaxMindLookup {
    city_reader: Option<maxminddb::Reader<Vec<u8>>>,
    asn_reader: Option<maxminddb::Reader<Vec<u8>>>,
}

#[derive(serde::Deserialize, Debug)]
struct NamedRecord {
    names: Option<HashMap<String, String>>,
}

impl NamedRecord {
    fn english(self) -> Option<String> {
        self.names.and_then(|mut names| names.remove("en"))
    }
}

/// GeoLite2-City record (fields we read).
#[derive(serde::Deserialize, Debug)]
struct GeoIpCity {
    city: Option<NamedRecord>,
    subdivisions: Option<Vec<NamedRecord>>,
    country: Option<NamedRecord>,
}

/// GeoLite2-ASN record.
#[derive(serde::Deserialize, Debug)]
struct GeoIpAsn {
    autonomous_system_organization: Option<String>,
}

fn open_reader(path: &str, kind: &str) -> Option<maxminddb::Reader<Vec<u8>>> {
    if !Path::new(path).exists() {
        warn!(path, kind, "GeoIP database file not found");
        return None;
    }
    match maxminddb::Reader::open_readfile(path) {
        Ok(reader) => {
            info!(path, kind, "GeoIP database loaded successfully");
            Some(reader)
        }
        Err(e) => {
            warn!(path, kind, error = %e, "Failed to load GeoIP database");
            None
        }
    }
}

impl MaxMindLookup {
    pub fn new(city_db: &str, asn_db: &str) -> Self {
        Self {
            city_reader: open_reader(city_db, "city"),
            asn_reader: open_reader(asn_db, "asn"),
        }
    }

    pub fn lookup(&self, ip: IpAddr) -> GeoRecord {
        let mut record = GeoRecord::placeholder();

        if let Some(reader) = &self.city_reader {
            match reader.lookup::<GeoIpCity>(ip) {
                Ok(city) => {
                    record.city = city.city.and_then(NamedRecord::english);
                    record.region = city
                        .subdivisions
                        .and_then(|subs| subs.into_iter().next())
                        .and_then(NamedRecord::english);
                    record.country = city.country.and_then(NamedRecord::english);
                }
                Err(e) => {
                    if !matches!(e, maxminddb::MaxMindDBError::AddressNotFoundError(_)) {
                        warn!(ip = %ip, error = %e, "GeoIP city lookup error");
                    }
                }
            }
        }

        if let Some(reader) = &self.asn_reader {
            match reader.lookup::<GeoIpAsn>(ip) {
                Ok(asn) => record.isp = asn.autonomous_system_organization,
                Err(e) => {
                    if !matches!(e, maxminddb::MaxMindDBError::AddressNotFoundError(_)) {
                        warn!(ip = %ip, error = %e, "GeoIP ASN lookup error");
                    }
                }
            }
        }

        record
    }

    pub fn has_city_db(&self) -> bool {
        self.city_reader.is_some()
    }

    pub fn has_asn_db(&self) -> bool {
        self.asn_reader.is_some()
    }
}
