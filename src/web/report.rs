use std::fmt::Write as _;

use woothee::parser::Parser;

use crate::models::visit::Visit;

/// Number of captures shown on the report page.
pub const REPORT_LIMIT: usize = 10;

pub const NO_DATA_HTML: &str = "<h1>No data yet. Open / or /track.png first.</h1>";

/// Device, OS and browser derived from a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub device: String,
    pub os: String,
    pub browser: String,
}

const UNKNOWN: &str = "UNKNOWN";

fn known(value: &str) -> Option<&str> {
    if value.is_empty() || value == UNKNOWN {
        None
    } else {
        Some(value)
    }
}

/// Classify a raw user agent. Anything not recognised as a handheld or
/// appliance counts as `Desktop`.
pub fn classify(parser: &Parser, user_agent: &str) -> ClientInfo {
    let Some(result) = parser.parse(user_agent) else {
        return ClientInfo {
            device: "Desktop".to_string(),
            os: "Unknown".to_string(),
            browser: "Unknown".to_string(),
        };
    };

    let os_name = known(result.os);
    let device = match result.category {
        "smartphone" if os_name == Some("iPad") => "tablet",
        "smartphone" | "mobilephone" => "mobile",
        "appliance" if result.os.contains("TV") => "smarttv",
        "appliance" => "console",
        _ => "Desktop",
    };

    let os_version = result.os_version.to_string();
    let os = match (os_name, known(&os_version)) {
        (Some(name), Some(_)) if os_name_has_release(name) => name.to_string(),
        (Some(name), Some(version)) => format!("{} {}", name, version),
        (Some(name), None) => name.to_string(),
        (None, _) => "Unknown".to_string(),
    };

    ClientInfo {
        device: device.to_string(),
        os,
        browser: known(result.name).unwrap_or("Unknown").to_string(),
    }
}

/// Windows names (`Windows 10`, `Windows Vista`) and any name carrying a
/// number already identify the release; woothee's version for them is the
/// kernel string (`NT 10.0`).
fn os_name_has_release(name: &str) -> bool {
    name.starts_with("Windows") || name.chars().any(|c| c.is_ascii_digit())
}

/// Minimal HTML text escaping for values that originate from request headers.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Present values render escaped; absent or empty ones as `N/A`.
fn or_na(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => escape_html(v),
        _ => "N/A".to_string(),
    }
}

/// Render the report page for `visits`, which must already be
/// most-recent-first.
pub fn render_report(visits: &[Visit]) -> String {
    if visits.is_empty() {
        return NO_DATA_HTML.to_string();
    }

    let parser = Parser::new();
    let total = visits.len();
    let mut blocks = String::new();

    for (i, visit) in visits.iter().enumerate() {
        let client = classify(&parser, &visit.user_agent);
        let geo = &visit.geo;

        let _ = write!(
            blocks,
            r#"
      <div style="background:#fff;padding:15px;margin:10px 0;border-radius:8px;box-shadow:0 2px 6px rgba(0,0,0,0.1);">
        <h2>User #{number}</h2>
        <ul>
          <li><strong>IP:</strong> {ip}</li>
          <li><strong>Location:</strong> {city}, {region}, {country}</li>
          <li><strong>ISP:</strong> {isp}</li>
          <li><strong>Device:</strong> {device}</li>
          <li><strong>OS:</strong> {os}</li>
          <li><strong>Browser:</strong> {browser}</li>
          <li><strong>Referrer:</strong> {referrer}</li>
          <li><strong>Time:</strong> {time}</li>
        </ul>
      </div>
"#,
            number = total - i,
            ip = escape_html(&visit.ip),
            city = or_na(&geo.city),
            region = or_na(&geo.region),
            country = or_na(&geo.country),
            isp = or_na(&geo.isp),
            device = escape_html(&client.device),
            os = escape_html(&client.os),
            browser = escape_html(&client.browser),
            referrer = escape_html(&visit.referrer),
            time = escape_html(&visit.timestamp),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Last 10 Visitors</title>
  <style>
    body {{ font-family: Arial, sans-serif; max-width: 900px; margin: 40px auto; background:#f0f0f0; }}
    h1 {{ text-align:center; }}
  </style>
</head>
<body>
  <h1>Last 10 People Tracked by This Link</h1>
{blocks}
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::GeoRecord;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    fn visit(id: i64, geo: GeoRecord) -> Visit {
        Visit {
            id,
            ip: format!("203.0.113.{}", id),
            geo,
            user_agent: CHROME_WINDOWS.to_string(),
            referrer: "direct".to_string(),
            timestamp: "2024-05-01T12:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_classify_desktop_chrome() {
        let info = classify(&Parser::new(), CHROME_WINDOWS);
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows 10");
    }

    #[test]
    fn test_os_release_detection() {
        assert!(classify(&Parser::new(), SAFARI_IPHONE).os.starts_with("iPhone"));
        assert!(os_name_has_release("Windows 7"));
        assert!(os_name_has_release("Windows Vista"));
        assert!(!os_name_has_release("Mac OSX"));
        assert!(!os_name_has_release("iPhone"));
    }

    #[test]
    fn test_classify_iphone_is_mobile() {
        let info = classify(&Parser::new(), SAFARI_IPHONE);
        assert_eq!(info.device, "mobile");
        assert_eq!(info.browser, "Safari");
    }

    #[test]
    fn test_classify_garbage_defaults() {
        let info = classify(&Parser::new(), "unknown");
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
    }

    #[test]
    fn test_empty_report() {
        assert!(render_report(&[]).contains("No data yet"));
    }

    #[test]
    fn test_numbering_counts_down() {
        let visits = vec![
            visit(3, GeoRecord::default()),
            visit(2, GeoRecord::default()),
            visit(1, GeoRecord::default()),
        ];
        let html = render_report(&visits);
        let first = html.find("<h2>User #3</h2>").unwrap();
        let last = html.find("<h2>User #1</h2>").unwrap();
        assert!(first < last);
        assert_eq!(html.matches("<h2>User #").count(), 3);
    }

    #[test]
    fn test_placeholder_geo_renders_literally() {
        let html = render_report(&[visit(1, GeoRecord::placeholder())]);
        assert!(html.contains("<strong>Location:</strong> Unknown, Unknown, Unknown</li>"));
        assert!(html.contains("<strong>ISP:</strong> Unknown ISP</li>"));
    }

    #[test]
    fn test_absent_geo_fields_render_na() {
        let geo = GeoRecord {
            city: Some("Oslo".to_string()),
            region: Some(String::new()),
            country: None,
            isp: None,
        };
        let html = render_report(&[visit(1, geo)]);
        assert!(html.contains("<strong>Location:</strong> Oslo, N/A, N/A</li>"));
        assert!(html.contains("<strong>ISP:</strong> N/A</li>"));
    }

    #[test]
    fn test_header_values_are_escaped() {
        let mut v = visit(1, GeoRecord::default());
        v.referrer = "<script>alert(1)</script>".to_string();
        let html = render_report(&[v]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
