//! Per-message speech playback control
//!
//! One `SpeechController` per displayed message unifies the two playback
//! backends behind a single toggle. Recorded audio pauses and resumes;
//! synthesized speech cancels and restarts — the shared engine only has a
//! global cancel. The controller never surfaces backend failures to the
//! caller; the toggle icon simply settles back to idle.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::messages::{Message, MessageKind};
use crate::speech::backend::{
    event_channel, AudioBackend, AudioHandle, EventReceiver, EventSender, PlaybackEvent,
    SynthesisEngine, Utterance,
};

/// Which backend voices this message, decided from the message data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Pre-recorded audio at an opaque URL.
    Recorded(String),
    /// Text handed to the shared synthesis engine.
    Synthesized(String),
}

impl PlaybackSource {
    /// Recorded audio wins when present; bot messages without audio fall
    /// back to synthesis; user messages without audio get no speech.
    pub fn for_message(message: &Message) -> Option<Self> {
        if let Some(url) = &message.recorded_audio_ref {
            return Some(PlaybackSource::Recorded(url.clone()));
        }
        if message.kind == MessageKind::Bot {
            return Some(PlaybackSource::Synthesized(message.content.clone()));
        }
        None
    }
}

/// Playback state for exactly one message.
///
/// At any instant at most one backend resource is live: either a recorded
/// audio handle or an in-flight synthesis utterance, never both. The
/// `is_playing` flag is driven by backend events drained in
/// [`poll_events`](Self::poll_events), so displayed state tracks what the
/// backend actually did, not what was requested.
pub struct SpeechController {
    source: PlaybackSource,
    audio_backend: Arc<dyn AudioBackend>,
    synthesis: Arc<dyn SynthesisEngine>,
    events_tx: EventSender,
    events_rx: EventReceiver,
    /// Lazily opened on first toggle; kept across pauses for resume.
    audio_handle: Option<Box<dyn AudioHandle>>,
    /// The utterance currently submitted to the shared engine, if any.
    utterance: Option<Uuid>,
    is_playing: bool,
    released: bool,
}

impl SpeechController {
    /// Controller for a message, or `None` when the message has no speech
    /// affordance (user message without recorded audio).
    pub fn for_message(
        message: &Message,
        audio_backend: Arc<dyn AudioBackend>,
        synthesis: Arc<dyn SynthesisEngine>,
    ) -> Option<Self> {
        PlaybackSource::for_message(message).map(|source| Self::new(source, audio_backend, synthesis))
    }

    pub fn new(
        source: PlaybackSource,
        audio_backend: Arc<dyn AudioBackend>,
        synthesis: Arc<dyn SynthesisEngine>,
    ) -> Self {
        let (events_tx, events_rx) = event_channel();
        Self {
            source,
            audio_backend,
            synthesis,
            events_tx,
            events_rx,
            audio_handle: None,
            utterance: None,
            is_playing: false,
            released: false,
        }
    }

    pub fn source(&self) -> &PlaybackSource {
        &self.source
    }

    /// Observable playing flag, as of the last event drain.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether a recorded-audio handle is currently held.
    pub fn has_audio_handle(&self) -> bool {
        self.audio_handle.is_some()
    }

    /// Whether a synthesis utterance has been submitted and not yet
    /// finished or cancelled.
    pub fn has_live_utterance(&self) -> bool {
        self.utterance.is_some()
    }

    /// Drain pending backend events into the `is_playing` flag. Called
    /// once per frame by the rendering surface, and by `toggle()` itself
    /// so rapid repeated toggles observe settled state.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                PlaybackEvent::Started => {
                    self.is_playing = true;
                }
                PlaybackEvent::Paused => {
                    self.is_playing = false;
                }
                PlaybackEvent::Ended => {
                    self.is_playing = false;
                    self.utterance = None;
                }
                PlaybackEvent::Failed(error) => {
                    debug!("Playback failed: {}", error);
                    self.is_playing = false;
                    self.utterance = None;
                }
            }
        }
    }

    /// The single toggle affordance. Starts playback when idle, stops it
    /// when playing. Never returns an error: backend refusals are absorbed
    /// and surface only through `is_playing` staying false.
    pub fn toggle(&mut self) {
        if self.released {
            return;
        }
        self.poll_events();

        let source = self.source.clone();
        match source {
            PlaybackSource::Recorded(url) => self.toggle_recorded(&url),
            PlaybackSource::Synthesized(text) => self.toggle_synthesized(&text),
        }
    }

    fn toggle_recorded(&mut self, url: &str) {
        // First toggle: open the handle now, not at construction, so
        // messages never interacted with acquire nothing.
        if self.audio_handle.is_none() {
            match self.audio_backend.open(url, self.events_tx.clone()) {
                Ok(mut handle) => {
                    if let Err(e) = handle.play() {
                        // Playback may be refused until the backend is
                        // ready; events will say what actually happened.
                        debug!("Recorded playback refused: {}", e);
                    }
                    self.audio_handle = Some(handle);
                }
                Err(e) => {
                    warn!("Could not open recorded audio {}: {}", url, e);
                }
            }
            return;
        }

        let playing = self.is_playing;
        if let Some(handle) = self.audio_handle.as_mut() {
            if playing {
                handle.pause();
            } else if let Err(e) = handle.play() {
                debug!("Recorded playback refused: {}", e);
            }
        }
    }

    fn toggle_synthesized(&mut self, text: &str) {
        // Stop branch also catches the engine speaking on behalf of any
        // other message: the engine is single-voice, last toggle wins.
        if self.synthesis.is_speaking() || self.is_playing {
            self.synthesis.cancel_all();
            self.is_playing = false;
            self.utterance = None;
            return;
        }

        let utterance = Utterance::new(text);
        self.utterance = Some(utterance.id);
        if let Err(e) = self.synthesis.speak(utterance, self.events_tx.clone()) {
            debug!("Synthesis refused: {}", e);
            self.utterance = None;
        }
    }

    /// Teardown when the message leaves the display. Runs at most once,
    /// releases both backends from any state, and never panics; backend
    /// errors during teardown are discarded.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(mut handle) = self.audio_handle.take() {
            handle.pause();
            handle.detach();
        }
        self.synthesis.cancel_all();
        self.utterance = None;
        self.is_playing = false;
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::backend::{AudioBackend, AudioHandle, SynthesisEngine};
    use crate::ReciteError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Recorded-audio fake: reports play/pause synchronously through the
    /// event channel, like a backend that confirms immediately.
    struct FakeHandle {
        events: EventSender,
        refuse_play: bool,
        detached: Arc<AtomicBool>,
    }

    impl AudioHandle for FakeHandle {
        fn play(&mut self) -> crate::Result<()> {
            if self.refuse_play {
                return Err(ReciteError::PlaybackError("blocked".into()));
            }
            self.events.send(PlaybackEvent::Started).unwrap();
            Ok(())
        }

        fn pause(&mut self) {
            let _ = self.events.send(PlaybackEvent::Paused);
        }

        fn detach(&mut self) {
            self.detached.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        refuse_play: bool,
        fail_open: bool,
        opened: AtomicUsize,
        detached: Arc<AtomicBool>,
    }

    impl AudioBackend for FakeBackend {
        fn open(&self, _url: &str, events: EventSender) -> crate::Result<Box<dyn AudioHandle>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(ReciteError::AudioDecodeError("bad clip".into()));
            }
            Ok(Box::new(FakeHandle {
                events,
                refuse_play: self.refuse_play,
                detached: Arc::clone(&self.detached),
            }))
        }
    }

    /// Shared-engine fake: one utterance slot, global cancel, synchronous
    /// start event.
    #[derive(Default)]
    struct FakeSynthesis {
        speaking: AtomicBool,
        fail_speak: bool,
        cancels: AtomicUsize,
        spoken: AtomicUsize,
        live: Mutex<Option<EventSender>>,
    }

    impl FakeSynthesis {
        /// Simulate the current utterance running to completion.
        fn finish(&self) {
            self.speaking.store(false, Ordering::SeqCst);
            if let Some(tx) = self.live.lock().take() {
                let _ = tx.send(PlaybackEvent::Ended);
            }
        }
    }

    impl SynthesisEngine for FakeSynthesis {
        fn speak(&self, _utterance: Utterance, events: EventSender) -> crate::Result<()> {
            if self.fail_speak {
                return Err(ReciteError::SynthesisError("no voice".into()));
            }
            self.spoken.fetch_add(1, Ordering::SeqCst);
            self.speaking.store(true, Ordering::SeqCst);
            events.send(PlaybackEvent::Started).unwrap();
            *self.live.lock() = Some(events);
            Ok(())
        }

        fn cancel_all(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.speaking.store(false, Ordering::SeqCst);
            self.live.lock().take();
        }

        fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }
    }

    fn recorded_controller(
        backend: Arc<FakeBackend>,
        synthesis: Arc<FakeSynthesis>,
    ) -> SpeechController {
        SpeechController::new(
            PlaybackSource::Recorded("file:///tmp/reply.wav".into()),
            backend,
            synthesis,
        )
    }

    fn synthesized_controller(synthesis: Arc<FakeSynthesis>) -> SpeechController {
        SpeechController::new(
            PlaybackSource::Synthesized("hello there".into()),
            Arc::new(FakeBackend::default()),
            synthesis,
        )
    }

    #[test]
    fn test_recorded_handle_opens_lazily() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), synthesis);

        assert_eq!(backend.opened.load(Ordering::SeqCst), 0);

        controller.toggle();
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);

        controller.poll_events();
        assert!(controller.is_playing());
    }

    #[test]
    fn test_recorded_pause_keeps_handle_for_resume() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), synthesis);

        controller.toggle();
        controller.poll_events();
        assert!(controller.is_playing());

        controller.toggle();
        controller.poll_events();
        assert!(!controller.is_playing());

        // Resume reuses the handle rather than opening a new one.
        controller.toggle();
        controller.poll_events();
        assert!(controller.is_playing());
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_toggle_settles_idle() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(backend, synthesis);

        controller.toggle();
        controller.toggle();
        controller.poll_events();
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_refused_play_stays_idle() {
        let backend = Arc::new(FakeBackend {
            refuse_play: true,
            ..Default::default()
        });
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), synthesis);

        controller.toggle();
        controller.poll_events();
        assert!(!controller.is_playing());
        // The handle is kept; a later toggle retries play on it.
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
        controller.toggle();
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_open_is_swallowed_and_retried() {
        let backend = Arc::new(FakeBackend {
            fail_open: true,
            ..Default::default()
        });
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), synthesis);

        controller.toggle();
        assert!(!controller.is_playing());

        controller.toggle();
        assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_synthesis_starts_and_cancels() {
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = synthesized_controller(Arc::clone(&synthesis));

        controller.toggle();
        controller.poll_events();
        assert!(controller.is_playing());
        assert!(synthesis.is_speaking());

        controller.toggle();
        assert!(!controller.is_playing());
        assert!(!synthesis.is_speaking());
        assert_eq!(synthesis.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_synthesis_restarts_after_end() {
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = synthesized_controller(Arc::clone(&synthesis));

        controller.toggle();
        synthesis.finish();
        controller.poll_events();
        assert!(!controller.is_playing());

        controller.toggle();
        controller.poll_events();
        assert!(controller.is_playing());
        assert_eq!(synthesis.spoken.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_engine_speaking_routes_to_stop_branch() {
        let synthesis = Arc::new(FakeSynthesis::default());
        // Some other controller is driving the shared engine.
        synthesis.speaking.store(true, Ordering::SeqCst);

        let mut controller = synthesized_controller(Arc::clone(&synthesis));
        controller.toggle();

        assert_eq!(synthesis.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(synthesis.spoken.load(Ordering::SeqCst), 0);
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_refused_speak_clears_utterance() {
        let synthesis = Arc::new(FakeSynthesis {
            fail_speak: true,
            ..Default::default()
        });
        let mut controller = synthesized_controller(Arc::clone(&synthesis));

        controller.toggle();
        controller.poll_events();
        assert!(!controller.is_playing());
        // Not stuck: the next toggle tries to speak again.
        controller.toggle();
        assert_eq!(synthesis.cancels.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backends_are_exclusive() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());

        let mut recorded = recorded_controller(Arc::clone(&backend), Arc::clone(&synthesis));
        recorded.toggle();
        assert!(recorded.has_audio_handle());
        assert!(!recorded.has_live_utterance());

        let mut spoken = synthesized_controller(synthesis);
        spoken.toggle();
        assert!(spoken.has_live_utterance());
        assert!(!spoken.has_audio_handle());
    }

    #[test]
    fn test_recorded_wins_over_synthesis() {
        let message = Message::new(MessageKind::Bot, "body")
            .with_recorded_audio("file:///tmp/reply.wav");
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());

        let mut controller = SpeechController::for_message(
            &message,
            Arc::clone(&backend) as Arc<dyn AudioBackend>,
            Arc::clone(&synthesis) as Arc<dyn SynthesisEngine>,
        )
        .unwrap();

        controller.toggle();
        controller.toggle();
        controller.toggle();

        assert!(backend.opened.load(Ordering::SeqCst) >= 1);
        assert_eq!(synthesis.spoken.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_controller_for_plain_user_message() {
        let message = Message::new(MessageKind::User, "hi");
        let controller = SpeechController::for_message(
            &message,
            Arc::new(FakeBackend::default()),
            Arc::new(FakeSynthesis::default()),
        );
        assert!(controller.is_none());
    }

    #[test]
    fn test_failed_event_resets_to_idle() {
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = synthesized_controller(Arc::clone(&synthesis));

        controller.toggle();
        controller.poll_events();
        assert!(controller.is_playing());

        if let Some(tx) = synthesis.live.lock().take() {
            tx.send(PlaybackEvent::Failed("engine died".into())).unwrap();
        }
        controller.poll_events();
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_release_tears_down_recorded() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), Arc::clone(&synthesis));

        controller.toggle();
        controller.release();

        assert!(backend.detached.load(Ordering::SeqCst));
        assert!(!controller.is_playing());
        // Idempotent: a second release does not cancel again.
        let cancels = synthesis.cancels.load(Ordering::SeqCst);
        controller.release();
        assert_eq!(synthesis.cancels.load(Ordering::SeqCst), cancels);
    }

    #[test]
    fn test_release_cancels_synthesis() {
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = synthesized_controller(Arc::clone(&synthesis));

        controller.toggle();
        controller.release();

        assert!(!synthesis.is_speaking());
        assert!(synthesis.cancels.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_release_from_idle_is_safe() {
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = synthesized_controller(synthesis);
        controller.release();
        controller.toggle();
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_drop_runs_release() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let detached = Arc::clone(&backend.detached);

        let mut controller = recorded_controller(backend, synthesis);
        controller.toggle();
        drop(controller);

        assert!(detached.load(Ordering::SeqCst));
    }

    #[test]
    fn test_release_mid_flight_start() {
        let backend = Arc::new(FakeBackend::default());
        let synthesis = Arc::new(FakeSynthesis::default());
        let mut controller = recorded_controller(Arc::clone(&backend), synthesis);

        // Toggle then release before any event drain.
        controller.toggle();
        controller.release();
        assert!(backend.detached.load(Ordering::SeqCst));
        assert!(!controller.is_playing());
    }
}
