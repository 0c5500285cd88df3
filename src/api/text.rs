//! Plain text generation over the Gemini REST API.

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::client::{GEMINI_API_BASE, HTTP_AGENT};

/// Generate a single non-streamed completion.
pub fn generate_text(api_key: &str, model: &str, prompt: &str) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(anyhow!("missing Gemini API key"));
    }

    let url = format!("{}/models/{}:generateContent", GEMINI_API_BASE, model);
    let payload = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
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

/// Polish a raw airdrop submission into a publishable description.
pub fn enhance_airdrop_description(
    api_key: &str,
    project_name: &str,
    raw_notes: &str,
) -> Result<String> {
    let prompt = format!(
        "You are a professional crypto marketing copywriter. Write a concise, exciting, and \
         professional description for a cryptocurrency airdrop for the project \"{project_name}\".\n\n\
         Here are the raw notes/details from the user: \"{raw_notes}\".\n\n\
         Format it as a single compelling paragraph followed by a very short bulleted list of 3 \
         key highlights. Do not include markdown formatting like bolding or headers, just plain \
         text with newlines."
    );
    generate_text(api_key, super::FLASH_MODEL, &prompt)
}

/// Collect the text parts of the first candidate, skipping `thought` parts.
pub(crate) fn response_text(body: &Value) -> String {
    body.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(|t| t.as_bool()).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Map a transport/status error to something the panels can show.
pub(crate) fn map_http_error(e: ureq::Error) -> anyhow::Error {
    let err = e.to_string();
    if err.contains("401") || err.contains("403") {
        anyhow!("invalid Gemini API key")
    } else {
        anyhow!("request failed: {}", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "text": "Hello " }, { "text": "world" } ] }
            }]
        });
        assert_eq!(response_text(&body), "Hello world");
    }

    #[test]
    fn response_text_skips_thought_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "pondering...", "thought": true },
                    { "text": "answer" }
                ] }
            }]
        });
        assert_eq!(response_text(&body), "answer");
    }

    #[test]
    fn response_text_handles_missing_candidates() {
        assert_eq!(response_text(&serde_json::json!({})), "");
    }
}
