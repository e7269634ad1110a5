use crate::config::settings::LandingConfig;

use super::report::escape_html;

/// Landing page whose preview image and only visible content is the
/// tracking endpoint.
pub fn render_landing(config: &LandingConfig) -> String {
    let title = escape_html(&config.title);
    let description = escape_html(&config.description);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
  <meta property="og:title" content="{title}" />
  <meta property="og:description" content="{description}" />
  <meta property="og:image" content="/track.png" />
  <meta property="og:type" content="website" />
</head>
<body style="margin:0; background:#000; display:flex; justify-content:center; align-items:center; height:100vh;">
  <img src="/track.png" alt="{title}" style="max-width:100%; max-height:100%;">
</body>
</html>
"#
    )
}
