//! Gemini API surface: REST text/vision/image plus the live voice session.

pub mod chat;
pub mod client;
pub mod image;
pub mod live;
pub mod text;
pub mod vision;

/// Default chat model.
pub const FLASH_MODEL: &str = "gemini-3-flash-preview";
/// Higher-quality chat model.
pub const PRO_MODEL: &str = "gemini-3-pro-preview";
/// Image generation model.
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// System instruction for the analyst chat panel.
pub const CHAT_SYSTEM_PROMPT: &str = "You are an expert Cryptocurrency Analyst and Airdrop \
    Hunter. Your goal is to help users identify legitimate airdrop opportunities, explain DeFi \
    concepts, analyze token economics, and warn them about potential scams. Be professional, \
    cautious, yet helpful.";

/// Greeting inserted whenever a chat session is (re)created.
pub const CHAT_WELCOME: &str = "Hello! I'm your Crypto Analyst. Ask me about specific tokens, \
    how to qualify for upcoming airdrops, or check if a project looks legitimate.";
