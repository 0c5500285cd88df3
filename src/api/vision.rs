//! Image analysis: one image plus a text prompt.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

use super::client::{GEMINI_API_BASE, HTTP_AGENT};
use super::text::{map_http_error, response_text};

/// Ask the model about an image. `image_bytes` is the raw encoded file as
/// dropped/pasted by the user; the mime type is sniffed from its magic bytes.
pub fn analyze_image(api_key: &str, model: &str, prompt: &str, image_bytes: &[u8]) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(anyhow!("missing Gemini API key"));
    }

    let mime_type = sniff_mime_type(image_bytes)
        .ok_or_else(|| anyhow!("unsupported image format (use PNG, JPEG, WEBP, GIF, or BMP)"))?;
    let b64_image = general_purpose::STANDARD.encode(image_bytes);

    let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, model);
    let payload = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": b64_image
                    }
                },
                { "text": prompt }
            ]
        }]
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

    let text = response_text(&body);
    if text.is_empty() {
        return Err(anyhow!("model returned no text"));
    }
    Ok(text)
}

/// Identify an image format from its magic bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4e, 0x47]) {
        Some("image/png")
    } else if bytes.len() >= 12
        && bytes.starts_with(&[0x52, 0x49, 0x46, 0x46])
        && &bytes[8..12] == b"WEBP"
    {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_mime_type(&[0xff, 0xd8, 0xff, 0xe0]), Some("image/jpeg"));
        assert_eq!(
            sniff_mime_type(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a]),
            Some("image/png")
        );
        assert_eq!(sniff_mime_type(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_mime_type(b"BM1234"), Some("image/bmp"));

        let mut webp = Vec::from(&b"RIFF"[..]);
        webp.extend_from_slice(&[0, 0, 0, 0]);
        webp.extend_from_slice(b"WEBP");
        assert_eq!(sniff_mime_type(&webp), Some("image/webp"));
    }

    #[test]
    fn rejects_unknown_bytes() {
        assert_eq!(sniff_mime_type(b"not an image"), None);
        assert_eq!(sniff_mime_type(&[]), None);
    }
}
