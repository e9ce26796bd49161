//! Image input resolution
//!
//! An image arrives either as a local path or as an http(s) URL. Any other
//! URL scheme is rejected before a request is made.

use image::DynamicImage;
use reqwest::Url;
use std::path::PathBuf;

use crate::error::AnalysisError;

/// Where to read an image from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(Url),
}

impl ImageSource {
    /// Pick a source from the optional request fields
    ///
    /// Path wins when both are supplied. Empty strings count as absent.
    pub fn from_parts(path: Option<&str>, url: Option<&str>) -> Result<Self, AnalysisError> {
        let path = path.map(str::trim).filter(|p| !p.is_empty());
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        if let Some(path) = path {
            return Ok(ImageSource::Path(PathBuf::from(path)));
        }

        match url {
            Some(raw) => {
                let parsed =
                    Url::parse(raw).map_err(|e| AnalysisError::InvalidUrl(format!("{raw}: {e}")))?;
                match parsed.scheme() {
                    "http" | "https" => Ok(ImageSource::Url(parsed)),
                    other => Err(AnalysisError::UnsupportedScheme(other.to_string())),
                }
            }
            None => Err(AnalysisError::MissingSource),
        }
    }

    /// Human-readable location for logs
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Url(url) => url.to_string(),
        }
    }
}

/// Read and decode an image
///
/// Inputs larger than `max_bytes` are refused before decoding. Decoding runs
/// on the blocking pool; large JPEGs take long enough to stall the runtime
/// otherwise.
pub async fn load_image(
    source: &ImageSource,
    http_client: &reqwest::Client,
    max_bytes: u64,
) -> Result<DynamicImage, AnalysisError> {
    let bytes = match source {
        ImageSource::Path(path) => {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(AnalysisError::ImageNotFound(path.display().to_string()));
            }
            if tokio::fs::metadata(path).await?.len() > max_bytes {
                return Err(AnalysisError::TooLarge(max_bytes));
            }
            tokio::fs::read(path).await?
        }
        ImageSource::Url(url) => fetch_capped(http_client, url, max_bytes).await?,
    };

    tracing::debug!(source = %source.describe(), bytes = bytes.len(), "Decoding image");

    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| AnalysisError::Decode(format!("decode task failed: {e}")))?
        .map_err(|e| AnalysisError::Decode(e.to_string()))
}

/// Download a body, stopping as soon as it exceeds `max_bytes`
///
/// `Content-Length` is checked up front but not trusted; chunked or
/// mislabelled bodies are bounded while streaming.
async fn fetch_capped(
    http_client: &reqwest::Client,
    url: &Url,
    max_bytes: u64,
) -> Result<Vec<u8>, AnalysisError> {
    let mut response = http_client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| AnalysisError::Fetch(e.to_string()))?
        .error_for_status()
        .map_err(|e| AnalysisError::Fetch(e.to_string()))?;

    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(AnalysisError::TooLarge(max_bytes));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AnalysisError::Fetch(e.to_string()))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(AnalysisError::TooLarge(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 1024 * 1024;

    /// Serve `body` at `/img` on an ephemeral local port
    async fn serve_bytes(body: Vec<u8>) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().route(
            "/img",
            axum::routing::get(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Url::parse(&format!("http://{addr}/img")).unwrap()
    }

    #[test]
    fn test_path_wins_over_url() {
        let source = ImageSource::from_parts(Some("/tmp/a.png"), Some("https://x/b.png")).unwrap();
        assert_eq!(source, ImageSource::Path(PathBuf::from("/tmp/a.png")));
    }

    #[test]
    fn test_https_url_accepted() {
        let source = ImageSource::from_parts(None, Some("https://cdn.example.org/b.jpg")).unwrap();
        assert!(matches!(source, ImageSource::Url(_)));
    }

    #[test]
    fn test_other_schemes_rejected() {
        for raw in ["ftp://example.org/a.png", "file:///etc/passwd", "data:image/png;base64,AAAA"] {
            let result = ImageSource::from_parts(None, Some(raw));
            assert!(
                matches!(result, Err(AnalysisError::UnsupportedScheme(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_fields_are_missing() {
        let result = ImageSource::from_parts(Some("  "), Some(""));
        assert!(matches!(result, Err(AnalysisError::MissingSource)));
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let client = reqwest::Client::new();
        let source = ImageSource::Path(PathBuf::from("/definitely/not/here.png"));
        let result = load_image(&source, &client, LIMIT).await;
        assert!(matches!(result, Err(AnalysisError::ImageNotFound(_))));
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"this is not an image").unwrap();

        let client = reqwest::Client::new();
        let result = load_image(&ImageSource::Path(path), &client, LIMIT).await;
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[tokio::test]
    async fn test_oversized_download_is_refused() {
        let url = serve_bytes(vec![0u8; 4096]).await;
        let client = reqwest::Client::new();

        let result = load_image(&ImageSource::Url(url), &client, 1024).await;
        assert!(matches!(result, Err(AnalysisError::TooLarge(1024))));
    }

    #[tokio::test]
    async fn test_download_within_limit_reaches_decoder() {
        let url = serve_bytes(b"not an image either".to_vec()).await;
        let client = reqwest::Client::new();

        let result = load_image(&ImageSource::Url(url), &client, 1024).await;
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[tokio::test]
    async fn test_oversized_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        let client = reqwest::Client::new();
        let result = load_image(&ImageSource::Path(path), &client, 1024).await;
        assert!(matches!(result, Err(AnalysisError::TooLarge(1024))));
    }
}
