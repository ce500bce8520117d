use super::ClipboardError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;
use tracing::{debug, warn};

/// Whole-request limit for remote images, connect included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Larger downloads are abandoned and the URL is copied instead.
pub const MAX_IMAGE_BYTES: usize = 25 * 1024 * 1024;

/// HTTP client for image fetches. `None` if the TLS backend failed to start.
pub fn http_client(timeout: Duration) -> Option<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .inspect_err(|e| warn!(error = %e, "HTTP client unavailable, remote images will be copied as URLs"))
        .ok()
}

/// RGBA8 pixels ready for the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Fetch remote references, decode embedded ones, then decode the pixels.
pub async fn resolve_image(
    client: Option<&reqwest::Client>,
    src: &str,
) -> Result<DecodedImage, ClipboardError> {
    let bytes = if src.starts_with("data:") {
        decode_data_url(src)?
    } else if src.starts_with("http://") || src.starts_with("https://") {
        let client =
            client.ok_or_else(|| ClipboardError::Fetch("no HTTP client available".to_string()))?;
        fetch_image_bytes(client, src).await?
    } else {
        return Err(ClipboardError::Fetch(format!(
            "unsupported image source scheme: {}",
            src.split(':').next().unwrap_or(src)
        )));
    };

    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| ClipboardError::Task(e.to_string()))?
}

pub async fn fetch_image_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ClipboardError> {
    debug!(url, "Fetching image");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ClipboardError::Fetch(e.to_string()))?
        .error_for_status()
        .map_err(|e| ClipboardError::Fetch(e.to_string()))?;

    if let Some(length) = response.content_length()
        && length > MAX_IMAGE_BYTES as u64
    {
        return Err(too_large());
    }

    let mut response = response;
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ClipboardError::Fetch(e.to_string()))?
    {
        if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn too_large() -> ClipboardError {
    ClipboardError::Fetch(format!("image larger than {MAX_IMAGE_BYTES} bytes"))
}

/// Payload of a `data:` URL. Base64 payloads are decoded, others taken verbatim.
pub fn decode_data_url(src: &str) -> Result<Vec<u8>, ClipboardError> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| ClipboardError::Decode("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ClipboardError::Decode("data URL has no payload".to_string()))?;

    if header.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| ClipboardError::Decode(e.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, ClipboardError> {
    let img = ::image::load_from_memory(bytes).map_err(|e| ClipboardError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width: width as usize,
        height: height as usize,
        rgba: rgba.into_raw(),
    })
}
