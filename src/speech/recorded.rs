//! Recorded-audio backend for local WAV clips
//!
//! Resolves a message's recorded-audio reference (a plain path or a
//! `file://` URL) to a decoded clip and wraps it in a [`ClipPlayer`]-backed
//! handle. Opening happens on the first toggle, never at message
//! construction.

use crate::audio::{downmix_to_mono, read_wav, ClipPlayer};
use crate::speech::backend::{AudioBackend, AudioHandle, EventSender};
use crate::{ReciteError, Result};
use tracing::debug;

/// Factory for WAV-clip playback handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavAudioBackend;

impl WavAudioBackend {
    pub fn new() -> Self {
        Self
    }

    fn resolve_path(url: &str) -> Result<&str> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(path);
        }
        if url.contains("://") {
            return Err(ReciteError::PlaybackError(format!(
                "Unsupported audio URL scheme: {}",
                url
            )));
        }
        Ok(url)
    }
}

impl AudioBackend for WavAudioBackend {
    fn open(&self, url: &str, events: EventSender) -> Result<Box<dyn AudioHandle>> {
        let path = Self::resolve_path(url)?;
        let (samples, sample_rate, channels) = read_wav(path)?;
        let mono = downmix_to_mono(&samples, channels);

        debug!(
            "Opened recorded audio {}: {} samples @ {} Hz",
            url,
            mono.len(),
            sample_rate
        );

        let mut player = ClipPlayer::new(events)?;
        player.load(mono, sample_rate)?;

        Ok(Box::new(WavHandle { player }))
    }
}

struct WavHandle {
    player: ClipPlayer,
}

impl AudioHandle for WavHandle {
    fn play(&mut self) -> Result<()> {
        self.player.play()
    }

    fn pause(&mut self) {
        self.player.pause();
    }

    fn detach(&mut self) {
        self.player.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::write_wav;
    use crate::speech::backend::event_channel;

    #[test]
    fn test_resolve_path_strips_file_scheme() {
        assert_eq!(
            WavAudioBackend::resolve_path("file:///tmp/a.wav").unwrap(),
            "/tmp/a.wav"
        );
        assert_eq!(WavAudioBackend::resolve_path("/tmp/a.wav").unwrap(), "/tmp/a.wav");
    }

    #[test]
    fn test_resolve_path_rejects_remote_schemes() {
        assert!(WavAudioBackend::resolve_path("https://example.com/a.wav").is_err());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let (tx, _rx) = event_channel();
        let backend = WavAudioBackend::new();
        assert!(backend.open("/nonexistent/recite.wav", tx).is_err());
    }

    #[test]
    fn test_open_decodes_clip() {
        let path = std::env::temp_dir().join("recite_test_backend.wav");
        let samples: Vec<f32> = (0..8000).map(|i| (i as f32 * 0.01).sin() * 0.3).collect();
        write_wav(&path, &samples, 16000, 1).unwrap();

        let (tx, _rx) = event_channel();
        let backend = WavAudioBackend::new();
        // Needs an output device; decode errors would surface regardless.
        if let Ok(mut handle) = backend.open(path.to_str().unwrap(), tx) {
            handle.pause();
            handle.detach();
        }

        std::fs::remove_file(&path).ok();
    }
}
