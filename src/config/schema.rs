use serde::{Deserialize, Serialize};

use crate::api;

/// User settings persisted between runs. Every field carries a serde default
/// so config files written by older builds keep loading.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key. Required by every panel except the feed.
    pub gemini_api_key: String,
    /// Chat model id, one of [`api::FLASH_MODEL`] or [`api::PRO_MODEL`].
    pub chat_model: String,
    /// Prebuilt voice used for the live conversation.
    pub live_voice: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            chat_model: api::FLASH_MODEL.to_string(),
            live_voice: api::live::LIVE_VOICE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.chat_model, api::FLASH_MODEL);
        assert_eq!(config.live_voice, api::live::LIVE_VOICE);
        assert!(config.gemini_api_key.is_empty());
    }

    #[test]
    fn partial_json_keeps_unknown_fields_defaulted() {
        let config: Config =
            serde_json::from_str(r#"{"gemini_api_key":"abc123"}"#).unwrap();
        assert_eq!(config.gemini_api_key, "abc123");
        assert_eq!(config.chat_model, api::FLASH_MODEL);
    }
}
