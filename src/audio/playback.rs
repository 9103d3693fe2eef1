//! Clip playback on the default output device
//!
//! A `ClipPlayer` holds one loaded clip and plays it through a cpal output
//! stream. Pausing keeps the position so playback can resume where it
//! stopped; playing again after the clip ended restarts it from the top.
//! What actually happened is reported as [`PlaybackEvent`]s on the channel
//! supplied at construction.

use crate::audio::resample_clip;
use crate::speech::backend::{EventSender, PlaybackEvent};
use crate::{ReciteError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

struct ClipState {
    samples: Vec<f32>,
    position: usize,
    playing: bool,
}

pub struct ClipPlayer {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    state: Arc<Mutex<ClipState>>,
    events: EventSender,
}

impl ClipPlayer {
    /// Create a player on the default output device.
    pub fn new(events: EventSender) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| ReciteError::AudioDeviceError("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| {
                ReciteError::AudioDeviceError(format!("Failed to get output config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            state: Arc::new(Mutex::new(ClipState {
                samples: Vec::new(),
                position: 0,
                playing: false,
            })),
            events,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Load a mono clip, converting it to the device rate. Resets the
    /// playback position.
    pub fn load(&mut self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        let device_rate = self.sample_rate();
        let samples = if sample_rate != device_rate {
            resample_clip(&samples, sample_rate, device_rate)?
        } else {
            samples
        };

        debug!("Loaded clip: {} samples @ {} Hz", samples.len(), device_rate);

        let mut state = self.state.lock();
        state.samples = samples;
        state.position = 0;
        state.playing = false;
        Ok(())
    }

    /// Start or resume playback from the current position. A finished clip
    /// restarts from the top. The output stream is built on first play.
    pub fn play(&mut self) -> Result<()> {
        if self.stream.is_none() {
            self.stream = Some(self.build_stream()?);
        }

        {
            let mut state = self.state.lock();
            if state.samples.is_empty() {
                return Err(ReciteError::PlaybackError("No clip loaded".into()));
            }
            if state.position >= state.samples.len() {
                state.position = 0;
            }
            state.playing = true;
        }

        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| ReciteError::PlaybackError(format!("Failed to start stream: {}", e)))?;
        }

        let _ = self.events.send(PlaybackEvent::Started);
        Ok(())
    }

    /// Pause, keeping the position for resume.
    pub fn pause(&mut self) {
        let was_playing = {
            let mut state = self.state.lock();
            let was = state.playing;
            state.playing = false;
            was
        };

        if was_playing {
            let _ = self.events.send(PlaybackEvent::Paused);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Playback progress as a fraction (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        let state = self.state.lock();
        if state.samples.is_empty() {
            return 0.0;
        }
        state.position as f32 / state.samples.len() as f32
    }

    /// Stop playback and drop the stream and clip. Safe to call from any
    /// state, including before the first play.
    pub fn detach(&mut self) {
        {
            let mut state = self.state.lock();
            state.playing = false;
            state.samples.clear();
            state.position = 0;
        }

        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Released output stream");
        }
    }

    fn build_stream(&self) -> Result<Stream> {
        let channels = self.config.channels as usize;
        let state = Arc::clone(&self.state);
        let events = self.events.clone();

        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut state = state.lock();
                    if !state.playing {
                        data.fill(0.0);
                        return;
                    }

                    let frames = data.len() / channels;
                    let available = (state.samples.len() - state.position).min(frames);

                    for i in 0..available {
                        let sample = state.samples[state.position + i];
                        for c in 0..channels {
                            data[i * channels + c] = sample;
                        }
                    }

                    // Fill the rest with silence
                    for value in data[available * channels..].iter_mut() {
                        *value = 0.0;
                    }

                    state.position += available;
                    if state.position >= state.samples.len() {
                        state.playing = false;
                        let _ = events.send(PlaybackEvent::Ended);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                ReciteError::AudioDeviceError(format!("Failed to build output stream: {}", e))
            })?;

        Ok(stream)
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::backend::event_channel;

    // These tests need an output device and are skipped in environments
    // without one, matching how the stream tests behave in CI.

    #[test]
    fn test_play_reports_started() {
        let (tx, rx) = event_channel();
        if let Ok(mut player) = ClipPlayer::new(tx) {
            let rate = player.sample_rate();
            player.load(vec![0.0; rate as usize / 10], rate).unwrap();

            if player.play().is_ok() {
                assert!(player.is_playing());
                assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Started));

                player.pause();
                assert!(!player.is_playing());
                assert_eq!(rx.try_recv(), Ok(PlaybackEvent::Paused));
            }

            player.detach();
            assert!(!player.is_playing());
        }
    }

    #[test]
    fn test_play_without_clip_is_refused() {
        let (tx, _rx) = event_channel();
        if let Ok(mut player) = ClipPlayer::new(tx) {
            assert!(player.play().is_err());
        }
    }

    #[test]
    fn test_pause_before_play_sends_nothing() {
        let (tx, rx) = event_channel();
        if let Ok(mut player) = ClipPlayer::new(tx) {
            player.pause();
            assert!(rx.try_recv().is_err());
        }
    }
}
