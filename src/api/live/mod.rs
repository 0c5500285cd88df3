//! Real-time voice conversation over the Gemini Live API.
//!
//! One [`LiveSession`] owns everything a conversation needs: the microphone
//! stream, the output stream, the WebSocket, and the playback schedule. A
//! single worker thread consumes socket frames in arrival order and relays
//! microphone buffers best-effort; the audio device callbacks only touch
//! lock-free shared state or a mutex held for microseconds. Every exit path
//! (user stop, remote close, remote error, handle drop) funnels through the
//! same idempotent teardown.

mod capture;
mod playback;
mod session;
mod types;
mod websocket;

pub use session::LiveSession;
pub use types::{
    LiveConfig, LiveError, LiveStatus, INPUT_SAMPLE_RATE, LIVE_MODEL, LIVE_SYSTEM_PROMPT,
    LIVE_VOICE, OUTPUT_SAMPLE_RATE,
};
