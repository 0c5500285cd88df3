//! Types and fixed parameters for the live voice session.

use thiserror::Error;

/// Native-audio model driving the conversation.
pub const LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

/// Default prebuilt voice.
pub const LIVE_VOICE: &str = "Zephyr";

/// Instruction the assistant speaks under.
pub const LIVE_SYSTEM_PROMPT: &str =
    "You are a helpful, witty, and concise AI assistant. Keep responses short and conversational.";

/// Microphone audio is transmitted at this rate (mono 16-bit PCM).
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Synthesized speech arrives at this rate (mono 16-bit PCM).
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Connection status surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl LiveStatus {
    pub(super) fn as_u8(self) -> u8 {
        match self {
            LiveStatus::Disconnected => 0,
            LiveStatus::Connecting => 1,
            LiveStatus::Connected => 2,
            LiveStatus::Error => 3,
        }
    }

    pub(super) fn from_u8(value: u8) -> Self {
        match value {
            1 => LiveStatus::Connecting,
            2 => LiveStatus::Connected,
            3 => LiveStatus::Error,
            _ => LiveStatus::Disconnected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LiveStatus::Disconnected => "disconnected",
            LiveStatus::Connecting => "connecting",
            LiveStatus::Connected => "connected",
            LiveStatus::Error => "error",
        }
    }
}

/// Fixed parameters supplied when the session is opened.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: LIVE_MODEL.to_string(),
            voice: LIVE_VOICE.to_string(),
            system_instruction: LIVE_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// One inbound server event, reduced to the pieces the session consumes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ServerMessage {
    /// Barge-in: the user spoke over the model's in-progress reply.
    pub interrupted: bool,
    /// Raw 16-bit little-endian PCM at [`OUTPUT_SAMPLE_RATE`].
    pub audio: Option<Vec<u8>>,
    pub turn_complete: bool,
}

/// Tagged events the session loop consumes, strictly in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    Opened,
    Message(ServerMessage),
    Closed,
    Failed(LiveError),
}

/// Why a session ended abnormally. Every variant is terminal for the
/// current session; the only recovery is a fresh user-initiated start.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),
    #[error("connect failed: {0}")]
    ConnectFailure(String),
    #[error("stream error: {0}")]
    StreamError(String),
}
