//! Multi-turn chat with SSE streaming.
//!
//! A [`ChatSession`] keeps the conversation history client-side and replays
//! it on every request; the REST API is stateless.

use std::io::{BufRead, BufReader};

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::client::{GEMINI_API_BASE, HTTP_AGENT};
use super::text::{map_http_error, response_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    fn wire_name(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

pub struct ChatSession {
    model: String,
    system_instruction: String,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(model: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
            history: Vec::new(),
        }
    }

    /// Send one user message, streaming text deltas to `on_chunk` as they
    /// arrive. On success the user message and the full reply are appended
    /// to the history; a failed request leaves the history untouched.
    pub fn send_stream<F>(&mut self, api_key: &str, text: &str, mut on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        if api_key.trim().is_empty() {
            return Err(anyhow!("missing Gemini API key"));
        }

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            GEMINI_API_BASE, self.model
        );

        let resp = HTTP_AGENT
            .post(&url)
            .header("x-goog-api-key", api_key)
            .send_json(self.payload(text))
            .map_err(map_http_error)?;

        let reader = BufReader::new(resp.into_body().into_reader());
        let mut full_content = String::new();

        for line in reader.lines() {
            let line = line.map_err(|e| anyhow!("failed to read stream: {}", e))?;
            let Some(json_str) = line.strip_prefix("data: ") else {
                continue;
            };
            if json_str.trim() == "[DONE]" {
                break;
            }
            if let Ok(chunk) = serde_json::from_str::<Value>(json_str) {
                let delta = response_text(&chunk);
                if !delta.is_empty() {
                    full_content.push_str(&delta);
                    on_chunk(&delta);
                }
            }
        }

        self.history.push(ChatTurn {
            role: ChatRole::User,
            text: text.to_string(),
        });
        self.history.push(ChatTurn {
            role: ChatRole::Model,
            text: full_content.clone(),
        });

        Ok(full_content)
    }

    fn payload(&self, pending: &str) -> Value {
        let mut contents: Vec<Value> = self
            .history
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.wire_name(),
                    "parts": [{ "text": turn.text }]
                })
            })
            .collect();
        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": pending }]
        }));

        serde_json::json!({
            "contents": contents,
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction }]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_system_instruction_and_history() {
        let mut session = ChatSession::new("test-model", "be helpful");
        session.history.push(ChatTurn {
            role: ChatRole::User,
            text: "hi".into(),
        });
        session.history.push(ChatTurn {
            role: ChatRole::Model,
            text: "hello".into(),
        });

        let payload = session.payload("what's new?");
        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "what's new?");
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "be helpful"
        );
    }

    #[test]
    fn fresh_session_has_single_turn_payload() {
        let session = ChatSession::new("test-model", "sys");
        let payload = session.payload("first");
        assert_eq!(payload["contents"].as_array().unwrap().len(), 1);
    }
}
