//! Playback backend seams
//!
//! Two mutually exclusive backends can voice a message: a per-message
//! recorded-audio player and a process-wide speech synthesis engine. Both
//! report what actually happened through [`PlaybackEvent`]s on a channel
//! registered before any playback request, so no event can be missed and
//! displayed state never runs ahead of the backend.

use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use crate::{ReciteError, Result};

/// Backend-originated playback notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback actually started (audio `play`, synthesis `start`).
    Started,
    /// Recorded playback paused; position is kept for resume.
    Paused,
    /// Playback ran to completion.
    Ended,
    /// Playback failed mid-flight.
    Failed(String),
}

pub type EventSender = Sender<PlaybackEvent>;
pub type EventReceiver = Receiver<PlaybackEvent>;

/// Channel pair for backend events. Unbounded: events are tiny and the
/// consumer drains every frame.
pub fn event_channel() -> (EventSender, EventReceiver) {
    unbounded()
}

/// One live playback of a recorded clip.
///
/// Handles are created lazily by [`AudioBackend::open`] and survive pauses
/// so a re-toggle resumes from the paused position.
pub trait AudioHandle {
    /// Request playback from the current position. Refusal (device busy,
    /// stream rejected) is non-fatal; the caller ignores the error and
    /// waits for events.
    fn play(&mut self) -> Result<()>;

    /// Pause, keeping the position for resume. Must not fail.
    fn pause(&mut self);

    /// Stop playback and release the underlying resource. Must not fail;
    /// called at most once, on teardown.
    fn detach(&mut self);
}

/// Factory for recorded-audio playback handles.
pub trait AudioBackend: Send + Sync {
    /// Open a handle for the given audio reference. The event sender is
    /// attached before playback can start.
    fn open(&self, url: &str, events: EventSender) -> Result<Box<dyn AudioHandle>>;
}

/// One piece of text queued for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// Process-wide, single-voice synthesis engine.
///
/// The engine is shared by every message's controller, so it exposes only
/// a global cancel and a "currently speaking" query; per-utterance pause
/// does not exist.
pub trait SynthesisEngine: Send + Sync {
    /// Submit an utterance. Events for it arrive on `events`; submission
    /// failure is reported synchronously and means nothing was queued.
    fn speak(&self, utterance: Utterance, events: EventSender) -> Result<()>;

    /// Cancel whatever the engine is speaking or has queued. Must not fail.
    fn cancel_all(&self);

    /// Whether the engine is currently speaking (any utterance, any
    /// controller).
    fn is_speaking(&self) -> bool;
}

/// Stand-in recorded-audio backend for builds without audio output.
/// Every open is refused; the controller absorbs the failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAudioBackend;

impl AudioBackend for DisabledAudioBackend {
    fn open(&self, url: &str, _events: EventSender) -> Result<Box<dyn AudioHandle>> {
        Err(ReciteError::PlaybackError(format!(
            "audio output unavailable, cannot open {}",
            url
        )))
    }
}

/// Stand-in synthesis engine used when no voice is configured. Submissions
/// are refused; the controller absorbs the failure and the toggle stays
/// visually idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSynthesis;

impl SynthesisEngine for DisabledSynthesis {
    fn speak(&self, _utterance: Utterance, _events: EventSender) -> Result<()> {
        Err(ReciteError::SynthesisError("no voice configured".into()))
    }

    fn cancel_all(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}
