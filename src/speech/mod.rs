//! Speech playback for chat messages
//!
//! This module provides:
//! - Backend seams for recorded-audio playback and shared speech synthesis
//! - The per-message `SpeechController` state machine
//! - Production backends: WAV playback and VITS synthesis via sherpa-rs

pub mod backend;
pub mod controller;
#[cfg(feature = "audio-io")]
pub mod recorded;
pub mod synthesis;

pub use backend::{
    event_channel, AudioBackend, AudioHandle, DisabledAudioBackend, DisabledSynthesis,
    EventReceiver, EventSender, PlaybackEvent, SynthesisEngine, Utterance,
};
pub use controller::{PlaybackSource, SpeechController};
#[cfg(feature = "audio-io")]
pub use recorded::WavAudioBackend;
pub use synthesis::{normalize_text_for_speech, SynthesisConfig, VitsVoice, VITS_SAMPLE_RATE};
#[cfg(feature = "audio-io")]
pub use synthesis::VitsSynthesis;
