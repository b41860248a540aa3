//! Image normalization for API requests
//!
//! Image backends take inline base64 payloads. Wardrobe photos may be raw
//! bytes, data URIs, bare base64, or remote URLs (the demo wardrobe), so
//! every reference is resolved to an [`InlineImage`] before a request is
//! built. Remote URLs are fetched here.

use crate::item::ImageRef;
use crate::provider::GenerationError;
use base64::{engine::general_purpose, Engine as _};
use std::io::Read;
use std::time::Duration;

const DEFAULT_MIME: &str = "image/png";
const MAX_FETCH_RETRIES: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// A base64 image payload with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Encode raw image bytes, sniffing the format
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: sniff_mime(bytes).to_string(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Split a data URI (or accept a bare base64 payload as PNG).
    ///
    /// The payload must decode as base64; anything else is `InvalidImage`.
    pub fn from_data_uri(text: &str) -> Result<Self, GenerationError> {
        let inline = match text.trim().strip_prefix("data:") {
            None => Self {
                mime_type: DEFAULT_MIME.to_string(),
                data: text.trim().to_string(),
            },
            Some(rest) => {
                let (header, data) = rest.split_once(',').ok_or_else(|| {
                    GenerationError::InvalidImage("data URI has no payload".to_string())
                })?;
                let Some(mime) = header.strip_suffix(";base64") else {
                    return Err(GenerationError::InvalidImage(format!(
                        "data URI is not base64 encoded ({})",
                        header
                    )));
                };
                let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };
                Self {
                    mime_type: mime.to_string(),
                    data: data.to_string(),
                }
            }
        };

        if inline.data.is_empty() {
            return Err(GenerationError::InvalidImage("image payload is empty".to_string()));
        }
        inline.decode()?;
        Ok(inline)
    }

    /// Decode the payload back into bytes
    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| GenerationError::InvalidImage(format!("bad base64 payload: {}", e)))
    }
}

/// Resolve any image reference to an inline payload, fetching URLs
pub fn resolve_inline(
    image: &ImageRef,
    timeout: Duration,
) -> Result<InlineImage, GenerationError> {
    match image {
        ImageRef::Bytes(bytes) => Ok(InlineImage::from_bytes(bytes)),
        ImageRef::DataUri(text) => InlineImage::from_data_uri(text),
        ImageRef::Url(url) => {
            let bytes = fetch_with_retry(url, timeout)?;
            Ok(InlineImage::from_bytes(&bytes))
        }
    }
}

/// Resolve any image reference to raw bytes
pub fn resolve_bytes(image: &ImageRef, timeout: Duration) -> Result<Vec<u8>, GenerationError> {
    match image {
        ImageRef::Bytes(bytes) => Ok(bytes.clone()),
        ImageRef::DataUri(text) => InlineImage::from_data_uri(text)?.decode(),
        ImageRef::Url(url) => fetch_with_retry(url, timeout),
    }
}

/// MIME type of encoded image bytes, PNG when unknown
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(DEFAULT_MIME)
}

/// File extension for encoded image bytes, `png` when unknown
pub fn sniff_extension(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("png")
}

fn fetch_with_retry(url: &str, timeout: Duration) -> Result<Vec<u8>, GenerationError> {
    let mut last_error = String::new();

    for attempt in 0..MAX_FETCH_RETRIES {
        let agent = build_agent(timeout);
        match agent.get(url).call() {
            Ok(response) => {
                let mut reader = response.into_body().into_reader();
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| GenerationError::RemoteFetch {
                        url: url.to_string(),
                        reason: format!("failed to read body: {}", e),
                    })?;
                return Ok(bytes);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt + 1 < MAX_FETCH_RETRIES && is_retryable_error(&e) {
                    tracing::debug!(url, attempt, error = %e, "retrying image fetch");
                    sleep_backoff(attempt);
                    continue;
                }
                break;
            }
        }
    }

    Err(GenerationError::RemoteFetch {
        url: url.to_string(),
        reason: last_error,
    })
}

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}
