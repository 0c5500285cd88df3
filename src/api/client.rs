//! Shared HTTP agent and endpoint constants.

use lazy_static::lazy_static;
use std::time::Duration;

/// REST endpoint base for the generative language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

lazy_static! {
    /// Process-wide agent so every REST call shares one connection pool.
    pub static ref HTTP_AGENT: ureq::Agent = {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(90)))
            .build();
        config.into()
    };
}
