//! Mock provider for testing
//!
//! Renders solid-color PNGs without any network calls. The color is
//! derived from the request, so the same outfit always gets the same image.

use crate::item::ImageRef;
use crate::provider::*;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use stylesync_core::ContentHash;

const MOCK_WIDTH: u32 = 48;
const MOCK_HEIGHT: u32 = 64;

/// A mock provider that renders placeholder outfits locally
#[derive(Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ImageGenerator for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn health_check(&self) -> ProviderStatus {
        ProviderStatus::Available
    }

    fn generate(&self, request: &OutfitRequest<'_>) -> Result<ImageRef, GenerationError> {
        let hash = ContentHash::from_parts([
            request.person.id.as_str().as_bytes(),
            request.upper.id.as_str().as_bytes(),
            request.lower.id.as_str().as_bytes(),
            request.params.model_id().as_bytes(),
        ]);
        solid_png(&hash).map(ImageRef::Bytes)
    }

    fn edit(&self, image: &ImageRef, instruction: &str) -> Result<ImageRef, GenerationError> {
        let source = image.describe();
        let hash = ContentHash::from_parts([source.as_bytes(), instruction.as_bytes()]);
        solid_png(&hash).map(ImageRef::Bytes)
    }
}

/// Encode a small solid-color PNG whose color comes from the hash
fn solid_png(hash: &ContentHash) -> Result<Vec<u8>, GenerationError> {
    let [r, g, b, ..] = *hash.as_bytes();
    let img = RgbaImage::from_pixel(MOCK_WIDTH, MOCK_HEIGHT, Rgba([r, g, b, 255]));

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| GenerationError::InvalidImage(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemKind, WardrobeItem};
    use crate::params::GenerationParams;
    use stylesync_core::ItemId;

    fn item(kind: ItemKind, id: &str) -> WardrobeItem {
        WardrobeItem::new(kind, id, ImageRef::Url(format!("https://example.com/{}.jpg", id)))
            .with_id(ItemId::from(id))
    }

    #[test]
    fn test_mock_provider_health() {
        let provider = MockProvider::new();
        assert_eq!(provider.health_check(), ProviderStatus::Available);
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_mock_generate_is_deterministic_png() {
        let provider = MockProvider::new();
        let person = item(ItemKind::Person, "p");
        let upper = item(ItemKind::UpperGarment, "u");
        let lower = item(ItemKind::LowerGarment, "l");
        let params = GenerationParams::Flash;
        let request = OutfitRequest {
            person: &person,
            upper: &upper,
            lower: &lower,
            params: &params,
        };

        let first = provider.generate(&request).unwrap();
        let second = provider.generate(&request).unwrap();
        assert_eq!(first, second);

        let ImageRef::Bytes(bytes) = first else {
            panic!("mock should return bytes");
        };
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), MOCK_WIDTH);
        assert_eq!(img.height(), MOCK_HEIGHT);
    }

    #[test]
    fn test_mock_edit_depends_on_instruction() {
        let provider = MockProvider::new();
        let image = ImageRef::Bytes(vec![1, 2, 3]);
        let a = provider.edit(&image, "make it red").unwrap();
        let b = provider.edit(&image, "make it blue").unwrap();
        assert_ne!(a, b);
    }
}
