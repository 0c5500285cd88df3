//! Image generation from a text prompt.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

use super::client::{GEMINI_API_BASE, HTTP_AGENT};
use super::text::map_http_error;

/// Aspect ratios offered by the imagine panel.
pub const ASPECT_RATIOS: [&str; 3] = ["1:1", "16:9", "3:4"];

#[derive(Clone, Debug)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Generate images for a prompt. Returns every inline-data part of the
/// first candidate; an empty result means the model declined the prompt.
pub fn generate_image(api_key: &str, prompt: &str, aspect_ratio: &str) -> Result<Vec<GeneratedImage>> {
    if api_key.trim().is_empty() {
        return Err(anyhow!("missing Gemini API key"));
    }

    let url = format!(
        "{}/models/{}:generateContent",
        GEMINI_API_BASE,
        super::IMAGE_MODEL
    );
    let payload = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "imageConfig": {
                "aspectRatio": aspect_ratio
            }
        }
    });

    let resp = HTTP_AGENT
        .post(&url)
        .header("x-goog-api-key", api_key)
        .send_json(payload)
        .map_err(map_http_error)?;

    let body: Value = resp
        .into_body()
        .read_json()
        .map_err(|e| anyhow!("failed to parse response: {}", e))?;

    Ok(collect_images(&body))
}

fn collect_images(body: &Value) -> Vec<GeneratedImage> {
    let mut images = Vec::new();
    let parts = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    if let Some(parts) = parts {
        for part in parts {
            let Some(inline) = part.get("inlineData") else {
                continue;
            };
            let Some(data_b64) = inline.get("data").and_then(|d| d.as_str()) else {
                continue;
            };
            if let Ok(bytes) = general_purpose::STANDARD.decode(data_b64) {
                let mime_type = inline
                    .get("mimeType")
                    .and_then(|m| m.as_str())
                    .unwrap_or("image/png")
                    .to_string();
                images.push(GeneratedImage { bytes, mime_type });
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_inline_data_parts() {
        let b64 = general_purpose::STANDARD.encode([1u8, 2, 3]);
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": b64 } }
                ] }
            }]
        });
        let images = collect_images(&body);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].bytes, vec![1, 2, 3]);
        assert_eq!(images[0].mime_type, "image/png");
    }

    #[test]
    fn missing_mime_type_defaults_to_png() {
        let b64 = general_purpose::STANDARD.encode([9u8]);
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "inlineData": { "data": b64 } } ] }
            }]
        });
        assert_eq!(collect_images(&body)[0].mime_type, "image/png");
    }

    #[test]
    fn no_candidates_yields_empty() {
        assert!(collect_images(&serde_json::json!({})).is_empty());
    }
}
