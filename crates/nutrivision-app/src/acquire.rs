//! Image acquisition: files, URLs, samples and data URIs into payloads

use nutrivision_types::{Error, ImagePayload, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Built-in sample photos (name, URL)
pub const SAMPLE_IMAGES: [(&str, &str); 3] = [
    (
        "salad",
        "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?w=800&q=80",
    ),
    (
        "pizza",
        "https://images.unsplash.com/photo-1565299624946-b28f40a0ae38?w=800&q=80",
    ),
    (
        "cake",
        "https://images.unsplash.com/photo-1565958011703-44f9829ba187?w=800&q=80",
    ),
];

/// Where an image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
    /// 1-based index into [`SAMPLE_IMAGES`]
    Sample(usize),
    DataUri(String),
}

impl ImageSource {
    /// Classify a command-line argument.
    ///
    /// `sample:<n>` or `sample:<name>` picks a built-in sample, `http(s)://`
    /// is a URL, `data:` is an inline data URI, anything else is a path.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(sample) = trimmed.strip_prefix("sample:") {
            return sample_index(sample).map(ImageSource::Sample);
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(ImageSource::Url(trimmed.to_string()));
        }
        if trimmed.starts_with("data:") {
            return Ok(ImageSource::DataUri(trimmed.to_string()));
        }
        Ok(ImageSource::File(PathBuf::from(trimmed)))
    }

    /// Short human-readable label
    pub fn describe(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Url(url) => url.clone(),
            ImageSource::Sample(n) => match sample(*n) {
                Some((name, _)) => format!("sample:{} ({})", n, name),
                None => format!("sample:{}", n),
            },
            ImageSource::DataUri(_) => "inline data URI".to_string(),
        }
    }
}

/// Look up a built-in sample by 1-based index
pub fn sample(n: usize) -> Option<(&'static str, &'static str)> {
    n.checked_sub(1).and_then(|i| SAMPLE_IMAGES.get(i)).copied()
}

fn sample_index(key: &str) -> Result<usize> {
    let index = match key.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => SAMPLE_IMAGES
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|i| i + 1),
    };

    match index {
        Some(n) if (1..=SAMPLE_IMAGES.len()).contains(&n) => Ok(n),
        _ => Err(Error::Acquisition(format!(
            "unknown sample '{}' (use 1-{} or one of: {})",
            key,
            SAMPLE_IMAGES.len(),
            SAMPLE_IMAGES
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image file exists and is readable
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    Ok(())
}

/// MIME type detected from the image bytes themselves
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Load and encode a local image file
pub fn from_file(path: &Path) -> Result<ImagePayload> {
    validate_image(path)?;

    let bytes = std::fs::read(path)?;
    let mime_type = sniff_mime(&bytes).ok_or_else(|| {
        Error::InvalidImageFormat(format!("{} is not a recognized image", path.display()))
    })?;
    // Full decode rejects truncated files
    image::load_from_memory(&bytes)?;

    debug!(path = %path.display(), mime_type, bytes = bytes.len(), "loaded image file");
    ImagePayload::from_bytes(mime_type, &bytes)
}

/// Download and encode a remote image
pub async fn from_url(client: &reqwest::Client, url: &str) -> Result<ImagePayload> {
    info!(%url, "downloading image");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Acquisition(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Acquisition(format!("{} returned {}", url, status)));
    }

    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Acquisition(format!("{}: {}", url, e)))?;

    let mime_type = sniff_mime(&bytes)
        .map(str::to_string)
        .or(declared)
        .ok_or_else(|| Error::InvalidImageFormat(format!("{} did not return an image", url)))?;

    debug!(%url, %mime_type, bytes = bytes.len(), "downloaded image");
    ImagePayload::from_bytes(&mime_type, &bytes)
}

/// Resolve any [`ImageSource`] into a payload
pub async fn acquire(source: &ImageSource, timeout: Duration) -> Result<ImagePayload> {
    match source {
        ImageSource::File(path) => from_file(path),
        ImageSource::DataUri(uri) => ImagePayload::from_data_uri(uri),
        ImageSource::Url(url) => from_url(&http_client(timeout)?, url).await,
        ImageSource::Sample(n) => {
            let (_, url) = sample(*n)
                .ok_or_else(|| Error::Acquisition(format!("unknown sample {}", n)))?;
            from_url(&http_client(timeout)?, url).await
        }
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Acquisition(format!("failed to build HTTP client: {}", e)))
}
