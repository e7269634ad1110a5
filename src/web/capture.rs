use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName};
use tracing::{info, warn};

use crate::geo::GeoResolver;
use crate::models::visit::{NewVisit, Visit};
use crate::storage::VisitStore;

/// Address recorded for a capture.
///
/// Precedence: left-most `X-Forwarded-For` entry, then the transport peer,
/// then the literal `"unknown"`. Forwarded values are taken verbatim; peer
/// addresses are canonicalised so IPv4 clients on a dual-stack socket are
/// recorded as plain IPv4.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(first) = forwarded {
        return first.to_string();
    }

    match peer {
        Some(addr) => addr.ip().to_canonical().to_string(),
        None => "unknown".to_string(),
    }
}

/// Header value as text, or `default` when absent, empty or not UTF-8.
fn header_or(headers: &HeaderMap, name: HeaderName, default: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Build the capture for one tracking request, resolve its location and
/// persist it.
///
/// Returns the stored record, or `None` when the write failed. A failed write
/// is logged; the caller still answers with the image.
pub async fn capture(
    store: &dyn VisitStore,
    geo: &GeoResolver,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Option<Visit> {
    let ip = client_ip(headers, peer);
    let user_agent = header_or(headers, header::USER_AGENT, "unknown");
    let referrer = header_or(headers, header::REFERER, "direct");

    let location = geo.resolve(&ip).await;
    let visit = NewVisit::now(ip, location, user_agent, referrer);

    match store.append(visit) {
        Ok(stored) => {
            info!(
                id = stored.id,
                ip = %stored.ip,
                referrer = %stored.referrer,
                "Visit captured"
            );
            Some(stored)
        }
        Err(e) => {
            warn!(error = %e, "Failed to persist visit");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::models::visit::GeoRecord;
    use crate::storage::json_file::JsonFileStore;
    use crate::storage::testing::FailingStore;

    fn peer() -> Option<SocketAddr> {
        Some("198.51.100.7:40000".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 5.6.6.7"));
        assert_eq!(client_ip(&headers, peer()), "1.2.3.4");
    }

    #[test]
    fn test_forwarded_for_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  9.9.9.9  ,10.0.0.1"));
        assert_eq!(client_ip(&headers, peer()), "9.9.9.9");
    }

    #[test]
    fn test_peer_used_without_forwarded_for() {
        assert_eq!(client_ip(&HeaderMap::new(), peer()), "198.51.100.7");
    }

    #[test]
    fn test_empty_forwarded_entry_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 5.6.6.7"));
        assert_eq!(client_ip(&headers, peer()), "198.51.100.7");
    }

    #[test]
    fn test_ipv4_mapped_peer_is_canonical() {
        let mapped: SocketAddr = "[::ffff:192.0.2.5]:8080".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(mapped)), "192.0.2.5");
    }

    #[test]
    fn test_no_source_is_unknown() {
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_header_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(""));
        assert_eq!(header_or(&headers, header::USER_AGENT, "unknown"), "unknown");
        assert_eq!(header_or(&headers, header::REFERER, "direct"), "direct");

        headers.insert(header::REFERER, HeaderValue::from_static("https://t.co/x"));
        assert_eq!(header_or(&headers, header::REFERER, "direct"), "https://t.co/x");
    }

    #[tokio::test]
    async fn test_capture_persists_even_when_geo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("leaks.json"));

        let stored = capture(&store, &GeoResolver::Disabled, &HeaderMap::new(), peer())
            .await
            .unwrap();
        assert_eq!(stored.ip, "198.51.100.7");
        assert_eq!(stored.user_agent, "unknown");
        assert_eq!(stored.referrer, "direct");
        assert_eq!(stored.geo, GeoRecord::placeholder());
        assert_eq!(store.recent(10).unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn test_capture_reports_write_failure() {
        let store = FailingStore::default();
        assert!(capture(&store, &GeoResolver::Disabled, &HeaderMap::new(), peer())
            .await
            .is_none());
    }
}
