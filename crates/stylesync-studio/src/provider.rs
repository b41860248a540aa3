//! Image generation provider trait and request/error types

use crate::item::{ImageRef, WardrobeItem};
use crate::params::GenerationParams;
use stylesync_core::StyleSyncError;
use thiserror::Error;

/// Why a generation request failed.
///
/// Every variant is retryable by the user; the queue records the failure
/// on the outfit and moves on without retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("could not fetch reference image {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    #[error("no image generated in response")]
    NoImage,

    #[error("rate limited by image backend")]
    RateLimited,

    #[error("image backend rejected the API key")]
    Unauthorized,

    #[error("image backend returned HTTP {status}")]
    Backend { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("no API key configured")]
    MissingCredential,
}

impl From<GenerationError> for StyleSyncError {
    fn from(err: GenerationError) -> Self {
        StyleSyncError::GenerationError(err.to_string())
    }
}

/// Status returned by a provider health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable(String),
    NoApiKey,
}

/// Everything a provider needs to render one outfit
#[derive(Debug, Clone, Copy)]
pub struct OutfitRequest<'a> {
    pub person: &'a WardrobeItem,
    pub upper: &'a WardrobeItem,
    pub lower: &'a WardrobeItem,
    pub params: &'a GenerationParams,
}

impl<'a> OutfitRequest<'a> {
    /// Reference images in the order the backend expects: identity source first
    pub fn reference_images(&self) -> [&'a ImageRef; 3] {
        [&self.person.image, &self.upper.image, &self.lower.image]
    }
}

/// Trait implemented by each image generation backend (Gemini, Mock)
pub trait ImageGenerator: Send {
    /// Provider name (e.g. "gemini", "mock")
    fn name(&self) -> &str;

    /// Check whether the provider can accept requests (API key set)
    fn health_check(&self) -> ProviderStatus;

    /// Composite the person wearing both garments (blocks until complete)
    fn generate(&self, request: &OutfitRequest<'_>) -> Result<ImageRef, GenerationError>;

    /// Edit a single wardrobe photo following a free-text instruction
    fn edit(&self, image: &ImageRef, instruction: &str) -> Result<ImageRef, GenerationError>;
}

impl<G: ImageGenerator + ?Sized> ImageGenerator for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn health_check(&self) -> ProviderStatus {
        (**self).health_check()
    }

    fn generate(&self, request: &OutfitRequest<'_>) -> Result<ImageRef, GenerationError> {
        (**self).generate(request)
    }

    fn edit(&self, image: &ImageRef, instruction: &str) -> Result<ImageRef, GenerationError> {
        (**self).edit(image, instruction)
    }
}
