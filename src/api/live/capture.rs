//! Microphone capture pipeline: device buffers → RMS + 16 kHz mono PCM →
//! transmit channel.
//!
//! The device callback does no I/O. It publishes a volume sample for the
//! visualizer, converts to the wire encoding, and hands the buffer to the
//! session loop over an unbounded channel. Hand-off is fire-and-forget;
//! back-pressure is bounded by the device's fixed callback cadence.

use std::sync::{mpsc, Arc};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::error;

use super::session::SessionShared;
use super::types::{LiveError, LiveStatus, INPUT_SAMPLE_RATE};

/// Root-mean-square amplitude of a buffer, for the visualizer only.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Average interleaved frames down to a single channel.
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resample between arbitrary rates.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let new_len = ((samples.len() as f64) * ratio).round().max(1.0) as usize;
    let last = samples.len() - 1;
    (0..new_len)
        .map(|i| {
            let src_idx = i as f64 / ratio;
            let idx0 = (src_idx as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = (src_idx - idx0 as f64) as f32;
            samples[idx0] + (samples[idx1] - samples[idx0]) * frac
        })
        .collect()
}

/// Convert normalized floats to the 16-bit wire encoding.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

fn process_input(
    data: &[f32],
    channels: usize,
    device_rate: u32,
    shared: &SessionShared,
    tx: &mpsc::Sender<Vec<i16>>,
) {
    // Nothing is read or transmitted until the remote end confirms
    // readiness, and nothing after a stop lands.
    if shared.status() != LiveStatus::Connected || shared.stop_requested() {
        return;
    }

    let mono = downmix_to_mono(data, channels);
    shared.set_volume(rms(&mono));

    let resampled = resample_linear(&mono, device_rate, INPUT_SAMPLE_RATE);
    // Best-effort hand-off: if the session loop is gone the buffer is
    // simply dropped.
    let _ = tx.send(to_pcm16(&resampled));
}

/// Open the default microphone and start feeding the transmit channel.
/// The returned stream must be kept alive for the session.
pub fn start_capture(
    shared: Arc<SessionShared>,
    tx: mpsc::Sender<Vec<i16>>,
) -> Result<cpal::Stream, LiveError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| LiveError::PermissionDenied("no microphone available".into()))?;
    let config = device
        .default_input_config()
        .map_err(|e| LiveError::PermissionDenied(format!("microphone config: {}", e)))?;

    let device_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let err_fn = |err| error!("input stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let shared = shared.clone();
            let tx = tx.clone();
            device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| {
                    process_input(data, channels, device_rate, &shared, &tx);
                },
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _: &_| {
                let floats: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                process_input(&floats, channels, device_rate, &shared, &tx);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(LiveError::PermissionDenied(format!(
                "unsupported input sample format {other:?}"
            )))
        }
    }
    .map_err(|e| LiveError::PermissionDenied(format!("failed to open microphone: {}", e)))?;

    stream
        .play()
        .map_err(|e| LiveError::PermissionDenied(format!("failed to start microphone: {}", e)))?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&[0.0; 128]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_is_non_negative_and_scales_with_amplitude() {
        let quiet = rms(&[0.1, -0.1, 0.1, -0.1]);
        let loud = rms(&[0.8, -0.8, 0.8, -0.8]);
        assert!(quiet >= 0.0);
        assert!(loud > quiet);
        assert!((rms(&[0.5; 64]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_averages_channels() {
        let stereo = [1.0f32, -1.0, 0.5, 0.5];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.0, 0.5]);
        let mono = [0.1f32, 0.2];
        assert_eq!(downmix_to_mono(&mono, 1), vec![0.1, 0.2]);
    }

    #[test]
    fn resample_halves_and_doubles_length() {
        let input: Vec<f32> = (0..480).map(|i| i as f32 / 480.0).collect();
        let down = resample_linear(&input, 48_000, 16_000);
        assert_eq!(down.len(), 160);
        let up = resample_linear(&input, 8_000, 16_000);
        assert_eq!(up.len(), 960);
        // Same-rate input passes through untouched.
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn resample_preserves_endpoints_roughly() {
        let input = vec![0.0f32, 1.0];
        let out = resample_linear(&input, 16_000, 48_000);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out.last().unwrap() - 1.0).abs() < 0.4);
    }

    #[test]
    fn pcm16_clamps_out_of_range() {
        let out = to_pcm16(&[0.0, 1.0, -1.0, 2.0, -2.0]);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], i16::MAX);
        assert_eq!(out[3], i16::MAX);
        assert_eq!(out[4], -i16::MAX);
    }
}
