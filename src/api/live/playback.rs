//! Playback scheduling for synthesized speech.
//!
//! Chunks arrive asynchronously and in variable sizes; the scheduler places
//! each one on the output timeline at `max(next-start cursor, device clock)`
//! so they play back-to-back in arrival order with no overlap. An
//! interruption drops everything scheduled and resets the cursor to "now".

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::error;

use super::types::{LiveError, OUTPUT_SAMPLE_RATE};

struct Segment {
    start: u64,
    samples: Vec<i16>,
}

impl Segment {
    fn end(&self) -> u64 {
        self.start + self.samples.len() as u64
    }
}

/// Timeline of scheduled speech segments, in 24 kHz mono frames.
///
/// `clock` counts frames the output device has rendered; `next_start` is the
/// watermark where the next segment begins. Both are pure bookkeeping, so
/// every scheduling property holds without audio hardware.
pub struct PlaybackScheduler {
    queue: VecDeque<Segment>,
    next_start: u64,
    clock: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            next_start: 0,
            clock: 0,
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn next_start(&self) -> u64 {
        self.next_start
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Place a decoded chunk directly after previously scheduled audio (or
    /// at the current clock if the queue has drained). Returns the start
    /// frame chosen.
    pub fn schedule(&mut self, samples: Vec<i16>) -> u64 {
        let start = self.next_start.max(self.clock);
        let end = start + samples.len() as u64;
        self.queue.push_back(Segment { start, samples });
        self.next_start = end;
        start
    }

    /// Barge-in: stop everything scheduled and reset the cursor, so the
    /// next chunk schedules relative to the clock at its arrival.
    pub fn interrupt(&mut self) {
        self.queue.clear();
        self.next_start = 0;
    }

    /// Full reset for teardown; also rewinds the clock for the next session.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.next_start = 0;
        self.clock = 0;
    }

    /// Render one frame of the output timeline, advancing the clock.
    /// Segments are retired once the clock passes their end.
    pub fn next_sample(&mut self) -> i16 {
        let mut value = 0;
        while let Some(front) = self.queue.front() {
            if self.clock >= front.end() {
                self.queue.pop_front();
                continue;
            }
            if self.clock >= front.start {
                value = front.samples[(self.clock - front.start) as usize];
            }
            break;
        }
        self.clock += 1;
        value
    }

    /// Render a run of frames; silence where nothing is scheduled.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn fill(&mut self, out: &mut [i16]) {
        for slot in out.iter_mut() {
            *slot = self.next_sample();
        }
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a raw little-endian 16-bit PCM chunk.
pub fn decode_audio_chunk(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Open the default output device and drive it from the scheduler.
///
/// The device keeps its native rate and channel count; the 24 kHz mono
/// content is stepped through at the matching ratio and duplicated across
/// channels. The returned stream must be kept alive for the session.
pub fn start_playback(scheduler: Arc<Mutex<PlaybackScheduler>>) -> Result<cpal::Stream, LiveError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| LiveError::ConnectFailure("no audio output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| LiveError::ConnectFailure(format!("output config: {}", e)))?;

    let device_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let step = OUTPUT_SAMPLE_RATE as f64 / device_rate as f64;
    let err_fn = |err| error!("output stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            // Start the accumulator full so the first frame pulls a sample.
            let mut acc = 1.0f64;
            let mut current = 0i16;
            device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut sched) = scheduler.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    for frame in data.chunks_mut(channels) {
                        acc += step;
                        while acc >= 1.0 {
                            acc -= 1.0;
                            current = sched.next_sample();
                        }
                        let value = current as f32 / 32768.0;
                        for slot in frame.iter_mut() {
                            *slot = value;
                        }
                    }
                },
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let mut acc = 1.0f64;
            let mut current = 0i16;
            device.build_output_stream(
                &config.into(),
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut sched) = scheduler.lock() else {
                        data.fill(0);
                        return;
                    };
                    for frame in data.chunks_mut(channels) {
                        acc += step;
                        while acc >= 1.0 {
                            acc -= 1.0;
                            current = sched.next_sample();
                        }
                        for slot in frame.iter_mut() {
                            *slot = current;
                        }
                    }
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(LiveError::ConnectFailure(format!(
                "unsupported output sample format {other:?}"
            )))
        }
    }
    .map_err(|e| LiveError::ConnectFailure(format!("failed to open output stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| LiveError::ConnectFailure(format!("failed to start output stream: {}", e)))?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_SECOND: usize = OUTPUT_SAMPLE_RATE as usize;

    #[test]
    fn chunks_schedule_back_to_back() {
        let mut sched = PlaybackScheduler::new();
        let s1 = sched.schedule(vec![1; 100]);
        let s2 = sched.schedule(vec![2; 50]);
        let s3 = sched.schedule(vec![3; 25]);
        assert_eq!(s1, 0);
        assert_eq!(s2, 100);
        assert_eq!(s3, 150);
        assert_eq!(sched.next_start(), 175);
    }

    #[test]
    fn first_chunk_starts_at_clock_when_later() {
        let mut sched = PlaybackScheduler::new();
        let mut out = [0i16; 40];
        sched.fill(&mut out);
        assert_eq!(sched.schedule(vec![1; 10]), 40);
    }

    #[test]
    fn drained_queue_schedules_at_clock_not_cursor_gap() {
        let mut sched = PlaybackScheduler::new();
        sched.schedule(vec![1; 4]);
        let mut out = [0i16; 10];
        sched.fill(&mut out);
        // Cursor (4) fell behind the clock (10); the next chunk starts now.
        assert_eq!(sched.schedule(vec![2; 4]), 10);
    }

    #[test]
    fn two_one_second_chunks_span_two_seconds() {
        let mut sched = PlaybackScheduler::new();
        let s1 = sched.schedule(vec![7; ONE_SECOND]);
        let s2 = sched.schedule(vec![8; ONE_SECOND]);
        assert_eq!(s2, s1 + ONE_SECOND as u64);
        assert_eq!(sched.next_start(), 2 * ONE_SECOND as u64);
    }

    #[test]
    fn interrupt_empties_queue_and_resets_cursor() {
        let mut sched = PlaybackScheduler::new();
        sched.schedule(vec![1; 100]);
        sched.schedule(vec![2; 100]);
        let mut out = [0i16; 30];
        sched.fill(&mut out); // mid-playback
        sched.interrupt();
        assert_eq!(sched.queue_len(), 0);
        assert_eq!(sched.next_start(), 0);
        // The next chunk schedules relative to the clock, not the old cursor.
        assert_eq!(sched.schedule(vec![3; 10]), 30);
    }

    #[test]
    fn fill_renders_samples_then_silence() {
        let mut sched = PlaybackScheduler::new();
        sched.schedule(vec![5; 4]);
        let mut out = [99i16; 6];
        sched.fill(&mut out);
        assert_eq!(out, [5, 5, 5, 5, 0, 0]);
    }

    #[test]
    fn finished_segments_are_retired() {
        let mut sched = PlaybackScheduler::new();
        sched.schedule(vec![1; 8]);
        let mut out = [0i16; 9];
        sched.fill(&mut out);
        assert_eq!(sched.queue_len(), 0);
    }

    #[test]
    fn fill_is_silent_while_segment_is_pending() {
        let mut sched = PlaybackScheduler::new();
        let mut out = [0i16; 5];
        sched.fill(&mut out); // clock = 5
        sched.schedule(vec![3; 2]); // starts at the current clock
        let mut out2 = [0i16; 3];
        sched.fill(&mut out2);
        assert_eq!(out2, [3, 3, 0]);
    }

    #[test]
    fn reset_rewinds_everything() {
        let mut sched = PlaybackScheduler::new();
        sched.schedule(vec![1; 10]);
        let mut out = [0i16; 4];
        sched.fill(&mut out);
        sched.reset();
        assert_eq!(sched.queue_len(), 0);
        assert_eq!(sched.next_start(), 0);
        assert_eq!(sched.clock(), 0);
    }

    #[test]
    fn decodes_little_endian_pcm() {
        assert_eq!(decode_audio_chunk(&[0x01, 0x00, 0xff, 0xff]), vec![1, -1]);
        // A trailing odd byte is dropped, not misread.
        assert_eq!(decode_audio_chunk(&[0x02, 0x00, 0x09]), vec![2]);
        assert!(decode_audio_chunk(&[]).is_empty());
    }
}
