//! WebSocket plumbing for the bidirectional live API.

use std::net::TcpStream;
use std::time::Duration;

use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use native_tls::TlsStream;
use serde_json::Value;
use tungstenite::WebSocket;

use super::types::{LiveConfig, ServerMessage, INPUT_SAMPLE_RATE};

const LIVE_WS_HOST: &str = "generativelanguage.googleapis.com";
const LIVE_WS_PATH: &str =
    "/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// How long one blocking socket read may stall the session loop. Short
/// enough that pending microphone buffers keep flowing between reads.
const READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Create the TLS WebSocket connection for a live session.
pub fn connect_live_websocket(api_key: &str) -> Result<WebSocket<TlsStream<TcpStream>>> {
    let ws_url = format!("wss://{}{}?key={}", LIVE_WS_HOST, LIVE_WS_PATH, api_key);

    let url = url::Url::parse(&ws_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("no host in URL"))?;
    let port = 443;

    use std::net::ToSocketAddrs;
    let addr = format!("{}:{}", host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("failed to resolve hostname: {}", host))?;

    let tcp_stream = TcpStream::connect_timeout(&addr, Duration::from_secs(10))?;
    // Generous timeouts for the TLS and WebSocket handshakes; the realtime
    // read timeout is applied once the connection is up.
    tcp_stream.set_read_timeout(Some(Duration::from_secs(15)))?;
    tcp_stream.set_write_timeout(Some(Duration::from_secs(15)))?;
    tcp_stream.set_nodelay(true)?;

    let connector = native_tls::TlsConnector::new()?;
    let tls_stream = connector.connect(host, tcp_stream)?;

    let (mut socket, _response) = tungstenite::client::client(&ws_url, tls_stream)?;

    socket
        .get_mut()
        .get_mut()
        .set_read_timeout(Some(READ_TIMEOUT))?;

    Ok(socket)
}

fn setup_payload(config: &LiveConfig) -> Value {
    serde_json::json!({
        "setup": {
            "model": format!("models/{}", config.model),
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": config.voice }
                    }
                }
            },
            "systemInstruction": {
                "parts": [{ "text": config.system_instruction }]
            }
        }
    })
}

/// Send the session setup message; the server acknowledges with
/// `setupComplete` before any realtime traffic is valid.
pub fn send_live_setup(
    socket: &mut WebSocket<TlsStream<TcpStream>>,
    config: &LiveConfig,
) -> Result<()> {
    let msg = setup_payload(config).to_string();
    socket.write(tungstenite::Message::Text(msg.into()))?;
    socket.flush()?;
    Ok(())
}

fn realtime_audio_payload(pcm: &[i16]) -> String {
    let mut bytes = Vec::with_capacity(pcm.len() * 2);
    for sample in pcm {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    let b64 = general_purpose::STANDARD.encode(&bytes);
    serde_json::json!({
        "realtimeInput": {
            "mediaChunks": [{
                "mimeType": format!("audio/pcm;rate={}", INPUT_SAMPLE_RATE),
                "data": b64
            }]
        }
    })
    .to_string()
}

/// Transmit one captured buffer. Fire-and-forget: the server never
/// acknowledges realtime input.
pub fn send_realtime_audio(
    socket: &mut WebSocket<TlsStream<TcpStream>>,
    pcm: &[i16],
) -> Result<()> {
    socket.write(tungstenite::Message::Text(realtime_audio_payload(pcm).into()))?;
    socket.flush()?;
    Ok(())
}

/// Check if the message acknowledges session setup.
pub fn is_setup_complete(msg: &str) -> bool {
    msg.contains("setupComplete")
}

/// Extract an error payload, if the frame carries one.
pub fn parse_error(msg: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(msg) {
        if let Some(error) = json.get("error") {
            if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                return Some(message.to_string());
            }
            return Some(error.to_string());
        }
    }
    None
}

/// Reduce a server frame to the pieces the session consumes: the
/// interruption flag and any inline audio, concatenated in part order.
pub fn parse_server_message(msg: &str) -> ServerMessage {
    let mut out = ServerMessage::default();

    let Ok(json) = serde_json::from_str::<Value>(msg) else {
        return out;
    };
    let Some(server_content) = json.get("serverContent") else {
        return out;
    };

    out.interrupted = server_content
        .get("interrupted")
        .and_then(|i| i.as_bool())
        .unwrap_or(false);
    out.turn_complete = server_content
        .get("turnComplete")
        .and_then(|t| t.as_bool())
        .unwrap_or(false);

    if let Some(parts) = server_content
        .get("modelTurn")
        .and_then(|m| m.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            let Some(inline) = part.get("inlineData") else {
                continue;
            };
            let Some(data_b64) = inline.get("data").and_then(|d| d.as_str()) else {
                continue;
            };
            if let Ok(bytes) = general_purpose::STANDARD.decode(data_b64) {
                out.audio.get_or_insert_with(Vec::new).extend_from_slice(&bytes);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_payload_carries_model_voice_and_instruction() {
        let config = LiveConfig {
            model: "test-model".into(),
            voice: "Puck".into(),
            system_instruction: "be brief".into(),
        };
        let payload = setup_payload(&config);
        assert_eq!(payload["setup"]["model"], "models/test-model");
        assert_eq!(
            payload["setup"]["generationConfig"]["responseModalities"][0],
            "AUDIO"
        );
        assert_eq!(
            payload["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]
                ["prebuiltVoiceConfig"]["voiceName"],
            "Puck"
        );
        assert_eq!(
            payload["setup"]["systemInstruction"]["parts"][0]["text"],
            "be brief"
        );
    }

    #[test]
    fn realtime_payload_round_trips_pcm() {
        let pcm = [1i16, -1, 1000, -1000];
        let payload: Value = serde_json::from_str(&realtime_audio_payload(&pcm)).unwrap();
        let chunk = &payload["realtimeInput"]["mediaChunks"][0];
        assert_eq!(chunk["mimeType"], "audio/pcm;rate=16000");

        let bytes = general_purpose::STANDARD
            .decode(chunk["data"].as_str().unwrap())
            .unwrap();
        let decoded: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(decoded, pcm);
    }

    #[test]
    fn parses_interruption_flag() {
        let msg = r#"{"serverContent":{"interrupted":true}}"#;
        let parsed = parse_server_message(msg);
        assert!(parsed.interrupted);
        assert!(parsed.audio.is_none());
    }

    #[test]
    fn parses_inline_audio() {
        let b64 = general_purpose::STANDARD.encode([0x01u8, 0x00, 0xff, 0xff]);
        let msg = format!(
            r#"{{"serverContent":{{"modelTurn":{{"parts":[{{"inlineData":{{"mimeType":"audio/pcm;rate=24000","data":"{}"}}}}]}}}}}}"#,
            b64
        );
        let parsed = parse_server_message(&msg);
        assert_eq!(parsed.audio, Some(vec![0x01, 0x00, 0xff, 0xff]));
        assert!(!parsed.interrupted);
    }

    #[test]
    fn parses_turn_complete_and_ignores_garbage() {
        let parsed = parse_server_message(r#"{"serverContent":{"turnComplete":true}}"#);
        assert!(parsed.turn_complete);
        assert_eq!(parse_server_message("not json"), ServerMessage::default());
        assert_eq!(parse_server_message("{}"), ServerMessage::default());
    }

    #[test]
    fn setup_complete_and_error_detection() {
        assert!(is_setup_complete(r#"{"setupComplete":{}}"#));
        assert!(!is_setup_complete(r#"{"serverContent":{}}"#));
        assert_eq!(
            parse_error(r#"{"error":{"message":"quota exceeded"}}"#),
            Some("quota exceeded".to_string())
        );
        assert_eq!(parse_error(r#"{"serverContent":{}}"#), None);
    }
}
