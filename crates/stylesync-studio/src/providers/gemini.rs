//! Gemini image provider (Google Generative Language API)
//!
//! Sends the person photo and both garment photos inline with a virtual
//! try-on prompt and reads the composited image back from the first
//! inline-data part of the response. One request per call; failures are
//! mapped to [`GenerationError`] and never retried here.

use crate::config::StyleSyncConfig;
use crate::encode::{build_agent, resolve_inline, InlineImage};
use crate::item::{ImageRef, WardrobeItem};
use crate::params::{GenerationParams, FLASH_MODEL_ID};
use crate::provider::*;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const ASPECT_RATIO: &str = "3:4";

const SYSTEM_INSTRUCTION: &str = "You are an advanced Virtual Try-On (VTO) AI engine. \
Your sole purpose is to realistically visualize specific garments on a specific person. \
You act as a strict digital compositor, not a creative artist. \
Your output MUST be the exact person from the reference image wearing the garment images. \
NEVER generate a new person. \
NEVER use the face or body of the models found in the garment images.";

/// Gemini provider for outfit compositing
pub struct GeminiProvider {
    api_key: Option<String>,
    api_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a provider from config. A missing key is not an error here;
    /// `health_check` reports it so non-generation commands keep working.
    pub fn from_config(config: &StyleSyncConfig) -> Self {
        Self {
            api_key: config.api_key("gemini").map(str::to_string),
            api_url: config
                .api_url("gemini")
                .unwrap_or(DEFAULT_GEMINI_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: config.request_timeout(),
        }
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_url, model_id)
    }

    fn post(&self, model_id: &str, payload: &Value) -> Result<Value, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let agent = build_agent(self.timeout);
        let response = agent
            .post(&self.endpoint(model_id))
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .send_json(payload)
            .map_err(map_http_error)?;

        let reader = response.into_body().into_reader();
        serde_json::from_reader(reader)
            .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON: {}", e)))
    }
}

impl ImageGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn health_check(&self) -> ProviderStatus {
        match &self.api_key {
            Some(key) if !key.is_empty() => ProviderStatus::Available,
            _ => ProviderStatus::NoApiKey,
        }
    }

    fn generate(&self, request: &OutfitRequest<'_>) -> Result<ImageRef, GenerationError> {
        if self.api_key.is_none() {
            return Err(GenerationError::MissingCredential);
        }

        let [person, upper, lower] = request.reference_images();
        let person = resolve_inline(person, self.timeout)?;
        let upper = resolve_inline(upper, self.timeout)?;
        let lower = resolve_inline(lower, self.timeout)?;

        let payload = build_outfit_payload(request, [&person, &upper, &lower]);
        tracing::debug!(model = request.params.model_id(), "sending outfit request");

        let response = self.post(request.params.model_id(), &payload)?;
        parse_image_response(&response)
    }

    fn edit(&self, image: &ImageRef, instruction: &str) -> Result<ImageRef, GenerationError> {
        if self.api_key.is_none() {
            return Err(GenerationError::MissingCredential);
        }

        let source = resolve_inline(image, self.timeout)?;
        let payload = build_edit_payload(&source, instruction);
        let response = self.post(FLASH_MODEL_ID, &payload)?;
        parse_image_response(&response)
    }
}

fn inline_part(image: &InlineImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.data,
        }
    })
}

fn garment_label(item: &WardrobeItem) -> String {
    match &item.color {
        Some(color) => format!("{} {}", item.name.trim(), color),
        None => item.name.trim().to_string(),
    }
}

/// Build the try-on prompt naming both garments
pub fn build_outfit_prompt(request: &OutfitRequest<'_>) -> String {
    let fidelity = match request.params.resolution() {
        Some(r) => format!("High fidelity, {}.", r),
        None => "High fidelity.".to_string(),
    };

    format!(
        "PERFORM VIRTUAL TRY-ON TASK.\n\
         \n\
         INPUT IMAGES:\n\
         [IMAGE 1] = TARGET MODEL (User Profile).\n\
         [IMAGE 2] = UPPER GARMENT ({upper}).\n\
         [IMAGE 3] = LOWER GARMENT ({lower}).\n\
         \n\
         STRICT GENERATION RULES:\n\
         1. IDENTITY LOCK: Preserve the face, hair, body shape, skin tone, and pose of the person in [IMAGE 1] exactly.\n\
         2. GARMENT EXTRACTION: Extract ONLY the clothing texture, pattern, and material from [IMAGE 2] and [IMAGE 3].\n\
         3. IGNORE GARMENT MODELS: If [IMAGE 2] or [IMAGE 3] shows a human model, ignore that human completely. Only take the cloth.\n\
         4. COMPOSITION: Fit the garments naturally onto the body of [IMAGE 1], respecting its lighting and shadows.\n\
         5. OUTFIT: The person from [IMAGE 1] wears the top from [IMAGE 2] and the bottom from [IMAGE 3].\n\
         \n\
         OUTPUT:\n\
         A single photorealistic image of the TARGET MODEL wearing the new outfit. {fidelity}",
        upper = garment_label(request.upper),
        lower = garment_label(request.lower),
        fidelity = fidelity,
    )
}

/// Build the generateContent body: person first, then garments, then the prompt
pub fn build_outfit_payload(request: &OutfitRequest<'_>, images: [&InlineImage; 3]) -> Value {
    let mut parts: Vec<Value> = images.iter().map(|img| inline_part(img)).collect();
    parts.push(json!({ "text": build_outfit_prompt(request) }));

    let mut image_config = json!({ "aspectRatio": ASPECT_RATIO });
    if let GenerationParams::Pro { resolution } = request.params {
        image_config["imageSize"] = json!(resolution.as_str());
    }

    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": image_config,
        }
    })
}

fn build_edit_payload(image: &InlineImage, instruction: &str) -> Value {
    let prompt = format!(
        "Edit this specific image.\n\
         Task: {}\n\
         Maintain the original item's core structure unless asked to change it.\n\
         Output the modified image only.",
        instruction.trim()
    );

    json!({
        "contents": [{
            "role": "user",
            "parts": [inline_part(image), { "text": prompt }]
        }],
        "generationConfig": { "responseModalities": ["IMAGE"] }
    })
}

/// Extract the first inline image from a generateContent response
pub fn parse_image_response(response: &Value) -> Result<ImageRef, GenerationError> {
    if let Some(message) = response
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(GenerationError::MalformedResponse(message.to_string()));
    }

    let parts = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or(GenerationError::NoImage)?;

    let data = parts
        .iter()
        .filter_map(|part| part.get("inlineData"))
        .filter_map(|inline| inline.get("data").and_then(|d| d.as_str()))
        .find(|data| !data.is_empty())
        .ok_or(GenerationError::NoImage)?;

    let inline = InlineImage {
        mime_type: "image/png".to_string(),
        data: data.to_string(),
    };
    inline.decode().map(ImageRef::Bytes)
}

fn map_http_error(e: ureq::Error) -> GenerationError {
    match e {
        ureq::Error::StatusCode(401) | ureq::Error::StatusCode(403) => {
            GenerationError::Unauthorized
        }
        ureq::Error::StatusCode(429) => GenerationError::RateLimited,
        ureq::Error::StatusCode(status) => GenerationError::Backend { status },
        other => GenerationError::Network(other.to_string()),
    }
}
