//! Live session lifecycle: state machine, event loop, teardown.
//!
//! The handle the UI holds ([`LiveSession`]) is nothing but shared atomics
//! plus a worker thread. The worker owns every resource with a lifetime
//! (both device streams and the socket), so cancellation never has to reach
//! across threads: the UI raises a flag, the worker notices within one read
//! timeout and unwinds.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{error, info};
use tungstenite::Message;

use super::capture::start_capture;
use super::playback::{decode_audio_chunk, start_playback, PlaybackScheduler};
use super::types::{LiveConfig, LiveError, LiveStatus, ServerMessage, SessionEvent};
use super::websocket::{
    connect_live_websocket, is_setup_complete, parse_error, parse_server_message, send_live_setup,
    send_realtime_audio,
};

/// State shared between the UI thread, the session worker, and the audio
/// callbacks. All fields are atomics; nothing here blocks.
pub struct SessionShared {
    status: AtomicU8,
    volume: AtomicU32, // f32 bits
    stop: AtomicBool,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(LiveStatus::Disconnected.as_u8()),
            volume: AtomicU32::new(0),
            stop: AtomicBool::new(false),
        }
    }

    pub fn status(&self) -> LiveStatus {
        LiveStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, status: LiveStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    /// Status upgrades are ignored once a stop has been requested, so a
    /// late `Opened` from the remote cannot resurrect a cancelled session.
    fn transition(&self, status: LiveStatus) {
        if !self.stop_requested() {
            self.set_status(status);
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, rms: f32) {
        self.volume.store(rms.to_bits(), Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// How a session ended. Resolves to the resting status during teardown.
#[derive(Debug)]
enum TeardownReason {
    UserStop,
    RemoteClose,
    Failure(LiveError),
}

/// Outcome of feeding one event to the engine.
enum Flow {
    Continue,
    Shutdown(TeardownReason),
}

/// Device-free core of the session: consumes the tagged event stream in
/// arrival order and drives status and playback state. Separated from the
/// socket/device wiring so the state machine is testable on its own.
struct SessionEngine {
    shared: Arc<SessionShared>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
}

impl SessionEngine {
    fn new(shared: Arc<SessionShared>, scheduler: Arc<Mutex<PlaybackScheduler>>) -> Self {
        Self { shared, scheduler }
    }

    fn on_event(&self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Opened => {
                self.shared.transition(LiveStatus::Connected);
                Flow::Continue
            }
            SessionEvent::Message(msg) => {
                self.on_message(msg);
                Flow::Continue
            }
            SessionEvent::Closed => Flow::Shutdown(TeardownReason::RemoteClose),
            SessionEvent::Failed(err) => Flow::Shutdown(TeardownReason::Failure(err)),
        }
    }

    fn on_message(&self, msg: ServerMessage) {
        if msg.interrupted || msg.audio.is_some() {
            if let Ok(mut scheduler) = self.scheduler.lock() {
                if msg.interrupted {
                    tracing::debug!(
                        clock = scheduler.clock(),
                        dropped = scheduler.queue_len(),
                        "barge-in: clearing playback queue"
                    );
                    scheduler.interrupt();
                }
                if let Some(bytes) = msg.audio {
                    let samples = decode_audio_chunk(&bytes);
                    if !samples.is_empty() {
                        let start = scheduler.schedule(samples);
                        tracing::trace!(
                            start,
                            until = scheduler.next_start(),
                            "scheduled audio chunk"
                        );
                    }
                }
            }
        }
        if msg.turn_complete {
            tracing::debug!("model turn complete");
        }
    }

    fn teardown(&self, reason: &TeardownReason) {
        teardown_state(&self.shared, &self.scheduler, reason);
    }
}

/// The single teardown routine: clears the playback queue and cursor,
/// zeroes the volume sample, and settles the status. Safe to invoke from
/// any state and any number of times.
fn teardown_state(
    shared: &SessionShared,
    scheduler: &Mutex<PlaybackScheduler>,
    reason: &TeardownReason,
) {
    if let Ok(mut scheduler) = scheduler.lock() {
        scheduler.reset();
    }
    shared.set_volume(0.0);
    let status = match reason {
        // A failure rests at `Error` so the UI can surface it, unless the
        // user already asked to stop; their intent wins.
        TeardownReason::Failure(_) if !shared.stop_requested() => LiveStatus::Error,
        _ => LiveStatus::Disconnected,
    };
    shared.set_status(status);
}

/// Handle to one live voice conversation.
pub struct LiveSession {
    shared: Arc<SessionShared>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    worker: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Open a new session. Returns immediately; device setup and the
    /// connection handshake happen on a worker thread and are reported
    /// through [`LiveSession::status`]. Callers must not start a second
    /// session while one is active; disable the affordance instead.
    pub fn start(api_key: String, config: LiveConfig) -> Self {
        let shared = Arc::new(SessionShared::new());
        let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new()));
        shared.set_status(LiveStatus::Connecting);

        let worker = {
            let shared = shared.clone();
            let scheduler = scheduler.clone();
            std::thread::spawn(move || run_session_worker(api_key, config, shared, scheduler))
        };

        Self {
            shared,
            scheduler,
            worker: Some(worker),
        }
    }

    pub fn status(&self) -> LiveStatus {
        self.shared.status()
    }

    /// Latest capture RMS, for the visualizer.
    pub fn volume(&self) -> f32 {
        self.shared.volume()
    }

    /// Cancel the session. Unconditional and immediate: shared state is
    /// cleared right here, and the worker releases the devices and socket
    /// as soon as it notices the flag. In-flight sends and decodes are not
    /// awaited; closing the owning contexts invalidates them.
    pub fn stop(&self) {
        self.shared.request_stop();
        teardown_state(&self.shared, &self.scheduler, &TeardownReason::UserStop);
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop();
        // Deliberately not joined: a worker parked in a connect timeout
        // must not hang the UI thread. It exits on its own once the stop
        // flag lands.
        self.worker.take();
    }
}

fn run_session_worker(
    api_key: String,
    config: LiveConfig,
    shared: Arc<SessionShared>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
) {
    let engine = SessionEngine::new(shared.clone(), scheduler.clone());
    info!(model = %config.model, "live session connecting");

    let reason = run_session(&engine, &api_key, &config, &shared, &scheduler);
    match &reason {
        TeardownReason::UserStop => info!("live session stopped"),
        TeardownReason::RemoteClose => info!("live session closed by remote"),
        TeardownReason::Failure(e) => error!("live session failed: {}", e),
    }
    engine.teardown(&reason);
}

/// Bring up devices and the socket, then hand off to the event loop. The
/// streams live in this frame; returning drops them, which stops the
/// microphone tracks and closes both device contexts.
fn run_session(
    engine: &SessionEngine,
    api_key: &str,
    config: &LiveConfig,
    shared: &Arc<SessionShared>,
    scheduler: &Arc<Mutex<PlaybackScheduler>>,
) -> TeardownReason {
    if api_key.trim().is_empty() {
        return TeardownReason::Failure(LiveError::ConnectFailure(
            "missing Gemini API key".into(),
        ));
    }

    // Output first, so inbound audio can be scheduled the moment the remote
    // starts speaking.
    let _output_stream = match start_playback(scheduler.clone()) {
        Ok(stream) => stream,
        Err(e) => return TeardownReason::Failure(e),
    };

    // Capture feeds the transmit loop through an unbounded one-way channel;
    // delivery is best-effort and never awaited.
    let (audio_tx, audio_rx) = mpsc::channel::<Vec<i16>>();
    let _input_stream = match start_capture(shared.clone(), audio_tx) {
        Ok(stream) => stream,
        Err(e) => return TeardownReason::Failure(e),
    };

    let mut socket = match connect_live_websocket(api_key) {
        Ok(socket) => socket,
        Err(e) => return TeardownReason::Failure(LiveError::ConnectFailure(e.to_string())),
    };

    if let Err(e) = send_live_setup(&mut socket, config) {
        let _ = socket.close(None);
        return TeardownReason::Failure(LiveError::ConnectFailure(e.to_string()));
    }

    let reason = drive_session(engine, &mut socket, &audio_rx, shared);
    let _ = socket.close(None);
    reason
}

/// The session's only loop: drain pending microphone buffers, then block on
/// the socket for at most one read timeout. Server frames are handled
/// strictly in arrival order.
fn drive_session(
    engine: &SessionEngine,
    socket: &mut tungstenite::WebSocket<native_tls::TlsStream<std::net::TcpStream>>,
    audio_rx: &mpsc::Receiver<Vec<i16>>,
    shared: &Arc<SessionShared>,
) -> TeardownReason {
    // No deadline on the handshake: a silent remote leaves the session in
    // `Connecting` until the user cancels.
    let mut setup_complete = false;

    loop {
        if shared.stop_requested() {
            return TeardownReason::UserStop;
        }

        // Capture only produces once the session is connected, so nothing
        // can be transmitted before the remote confirms readiness.
        while let Ok(chunk) = audio_rx.try_recv() {
            if let Err(e) = send_realtime_audio(socket, &chunk) {
                return TeardownReason::Failure(LiveError::StreamError(e.to_string()));
            }
        }

        match socket.read() {
            Ok(Message::Text(msg)) => {
                if let Some(reason) = process_frame(engine, msg.as_str(), &mut setup_complete) {
                    return reason;
                }
            }
            Ok(Message::Binary(data)) => {
                if let Ok(text) = String::from_utf8(data.to_vec()) {
                    if let Some(reason) = process_frame(engine, &text, &mut setup_complete) {
                        return reason;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                if let Flow::Shutdown(reason) = engine.on_event(SessionEvent::Closed) {
                    return reason;
                }
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => {
                if let Flow::Shutdown(reason) =
                    engine.on_event(SessionEvent::Failed(LiveError::StreamError(e.to_string())))
                {
                    return reason;
                }
            }
        }
    }
}

fn process_frame(
    engine: &SessionEngine,
    text: &str,
    setup_complete: &mut bool,
) -> Option<TeardownReason> {
    if let Some(err) = parse_error(text) {
        return match engine.on_event(SessionEvent::Failed(LiveError::StreamError(err))) {
            Flow::Shutdown(reason) => Some(reason),
            Flow::Continue => None,
        };
    }

    if !*setup_complete {
        if is_setup_complete(text) {
            *setup_complete = true;
            if let Flow::Shutdown(reason) = engine.on_event(SessionEvent::Opened) {
                return Some(reason);
            }
        }
        return None;
    }

    match engine.on_event(SessionEvent::Message(parse_server_message(text))) {
        Flow::Shutdown(reason) => Some(reason),
        Flow::Continue => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::live::types::OUTPUT_SAMPLE_RATE;

    const ONE_SECOND_BYTES: usize = OUTPUT_SAMPLE_RATE as usize * 2;

    fn connecting_engine() -> (Arc<SessionShared>, Arc<Mutex<PlaybackScheduler>>, SessionEngine)
    {
        let shared = Arc::new(SessionShared::new());
        shared.set_status(LiveStatus::Connecting);
        let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new()));
        let engine = SessionEngine::new(shared.clone(), scheduler.clone());
        (shared, scheduler, engine)
    }

    fn audio_message(bytes: usize) -> ServerMessage {
        ServerMessage {
            audio: Some(vec![0u8; bytes]),
            ..Default::default()
        }
    }

    #[test]
    fn opened_moves_connecting_to_connected() {
        let (shared, _, engine) = connecting_engine();
        assert!(matches!(
            engine.on_event(SessionEvent::Opened),
            Flow::Continue
        ));
        assert_eq!(shared.status(), LiveStatus::Connected);
    }

    #[test]
    fn audio_chunks_schedule_back_to_back() {
        let (_, scheduler, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);

        engine.on_event(SessionEvent::Message(audio_message(ONE_SECOND_BYTES)));
        engine.on_event(SessionEvent::Message(audio_message(ONE_SECOND_BYTES)));

        let sched = scheduler.lock().unwrap();
        assert_eq!(sched.queue_len(), 2);
        // Two one-second chunks span exactly two seconds of timeline.
        assert_eq!(sched.next_start(), 2 * OUTPUT_SAMPLE_RATE as u64);
    }

    #[test]
    fn interruption_empties_queue_and_resets_cursor() {
        let (_, scheduler, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);
        engine.on_event(SessionEvent::Message(audio_message(4800)));

        engine.on_event(SessionEvent::Message(ServerMessage {
            interrupted: true,
            ..Default::default()
        }));

        let sched = scheduler.lock().unwrap();
        assert_eq!(sched.queue_len(), 0);
        assert_eq!(sched.next_start(), 0);
    }

    #[test]
    fn interruption_and_audio_in_one_event_apply_in_order() {
        let (_, scheduler, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);
        engine.on_event(SessionEvent::Message(audio_message(9600)));

        // Barge-in frame that also carries the first chunk of the new reply.
        engine.on_event(SessionEvent::Message(ServerMessage {
            interrupted: true,
            audio: Some(vec![0u8; 200]),
            turn_complete: false,
        }));

        let sched = scheduler.lock().unwrap();
        assert_eq!(sched.queue_len(), 1);
        assert_eq!(sched.next_start(), 100);
    }

    #[test]
    fn remote_close_rests_at_disconnected() {
        let (shared, _, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);

        let Flow::Shutdown(reason) = engine.on_event(SessionEvent::Closed) else {
            panic!("close must shut the session down");
        };
        engine.teardown(&reason);
        assert_eq!(shared.status(), LiveStatus::Disconnected);
    }

    #[test]
    fn failure_before_connect_rests_at_error() {
        // Microphone denied: disconnected → connecting → error, never
        // connected.
        let (shared, _, engine) = connecting_engine();
        let Flow::Shutdown(reason) = engine.on_event(SessionEvent::Failed(
            LiveError::PermissionDenied("denied".into()),
        )) else {
            panic!("failure must shut the session down");
        };
        engine.teardown(&reason);
        assert_eq!(shared.status(), LiveStatus::Error);
    }

    #[test]
    fn teardown_clears_volume_and_playback() {
        let (shared, scheduler, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);
        engine.on_event(SessionEvent::Message(audio_message(4000)));
        shared.set_volume(0.42);

        engine.teardown(&TeardownReason::RemoteClose);

        assert_eq!(shared.volume(), 0.0);
        let sched = scheduler.lock().unwrap();
        assert_eq!(sched.queue_len(), 0);
        assert_eq!(sched.next_start(), 0);
    }

    #[test]
    fn teardown_is_idempotent() {
        let (shared, scheduler, engine) = connecting_engine();
        engine.on_event(SessionEvent::Opened);
        engine.teardown(&TeardownReason::RemoteClose);

        let status_after_first = shared.status();
        let queue_after_first = scheduler.lock().unwrap().queue_len();

        engine.teardown(&TeardownReason::RemoteClose);

        assert_eq!(shared.status(), status_after_first);
        assert_eq!(scheduler.lock().unwrap().queue_len(), queue_after_first);
    }

    #[test]
    fn user_stop_wins_over_late_failure() {
        let (shared, scheduler, _) = connecting_engine();
        shared.request_stop();
        teardown_state(
            &shared,
            &scheduler,
            &TeardownReason::Failure(LiveError::StreamError("socket gone".into())),
        );
        assert_eq!(shared.status(), LiveStatus::Disconnected);
    }

    #[test]
    fn stop_blocks_status_upgrades() {
        // start() then stop() before the remote opens: the late `Opened`
        // must not resurrect the session.
        let (shared, scheduler, engine) = connecting_engine();
        shared.request_stop();
        teardown_state(&shared, &scheduler, &TeardownReason::UserStop);

        engine.on_event(SessionEvent::Opened);
        assert_eq!(shared.status(), LiveStatus::Disconnected);
    }

    #[test]
    fn stop_from_any_status_rests_at_disconnected() {
        for initial in [
            LiveStatus::Connecting,
            LiveStatus::Connected,
            LiveStatus::Error,
        ] {
            let shared = Arc::new(SessionShared::new());
            shared.set_status(initial);
            let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new()));
            scheduler.lock().unwrap().schedule(vec![1; 10]);
            shared.set_volume(0.9);

            shared.request_stop();
            teardown_state(&shared, &scheduler, &TeardownReason::UserStop);

            assert_eq!(shared.status(), LiveStatus::Disconnected);
            assert_eq!(shared.volume(), 0.0);
            assert_eq!(scheduler.lock().unwrap().queue_len(), 0);
        }
    }
}
