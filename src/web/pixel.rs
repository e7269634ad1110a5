use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::{debug, warn};

/// 1×1 transparent GIF served when no tracking image is configured.
const PLACEHOLDER_GIF_B64: &str = "R0lGODlhAQABAIAAANvf7wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

static PLACEHOLDER_GIF: LazyLock<Bytes> = LazyLock::new(|| {
    Bytes::from(
        STANDARD
            .decode(PLACEHOLDER_GIF_B64)
            .expect("embedded placeholder GIF is valid base64"),
    )
});

/// Image bytes plus the content type to send them with.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub content_type: &'static str,
    pub body: Bytes,
}

impl ImagePayload {
    pub fn placeholder() -> Self {
        Self {
            content_type: "image/gif",
            body: PLACEHOLDER_GIF.clone(),
        }
    }

    /// Read the tracking image from disk, falling back to the placeholder
    /// when the file is missing, empty, unreadable or not a known image type.
    pub async fn load(path: &Path) -> Self {
        let Some(content_type) = image_content_type(path) else {
            debug!(path = %path.display(), "Tracking image has no image extension");
            return Self::placeholder();
        };

        match tokio::fs::read(path).await {
            Ok(bytes) if !bytes.is_empty() => Self {
                content_type,
                body: Bytes::from(bytes),
            },
            Ok(_) => {
                warn!(path = %path.display(), "Tracking image is empty");
                Self::placeholder()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::placeholder(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read tracking image");
                Self::placeholder()
            }
        }
    }
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_gif() {
        let payload = ImagePayload::placeholder();
        assert_eq!(payload.content_type, "image/gif");
        assert!(payload.body.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(image_content_type(Path::new("a/meme.JPG")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("x.png")), Some("image/png"));
        assert_eq!(image_content_type(Path::new("x.txt")), None);
        assert_eq!(image_content_type(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meme.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();

        let payload = ImagePayload::load(&path).await;
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(&payload.body[..], b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ImagePayload::load(&dir.path().join("meme.jpg")).await;
        assert_eq!(missing.content_type, "image/gif");

        let empty_path = dir.path().join("empty.jpg");
        std::fs::write(&empty_path, b"").unwrap();
        let empty = ImagePayload::load(&empty_path).await;
        assert_eq!(empty.content_type, "image/gif");
        assert!(!empty.body.is_empty());
    }
}
