//! Speech synthesis with sherpa-rs (VITS models)
//!
//! `VitsVoice` turns text into audio samples; `VitsSynthesis` wraps it in a
//! worker thread and implements the process-wide [`SynthesisEngine`]: one
//! voice, global cancel, last submission wins.

use crate::{ReciteError, Result};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use tracing::{debug, info};

/// Default sample rate for VITS output (22050 Hz typical for Piper models)
pub const VITS_SAMPLE_RATE: u32 = 22050;

/// Configuration for the synthesis voice
#[derive(Clone, Debug)]
pub struct SynthesisConfig {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Path to the tokens file
    pub tokens_path: String,

    /// Path to the lexicon file (optional for some models)
    pub lexicon_path: Option<String>,

    /// Path to the data directory (optional)
    pub data_dir: Option<String>,

    /// Path to dict directory (optional)
    pub dict_dir: Option<String>,

    /// Length scale for speech rate (1.0 = normal, <1.0 = faster, >1.0 = slower)
    pub length_scale: f32,

    /// Noise scale for variation
    pub noise_scale: f32,

    /// Noise scale width
    pub noise_scale_w: f32,

    /// Optional speaker ID for multi-speaker models
    pub speaker_id: i32,

    /// Maximum queue size for pending utterances
    pub queue_size: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            tokens_path: String::new(),
            lexicon_path: None,
            data_dir: None,
            dict_dir: None,
            length_scale: 1.0,
            noise_scale: 0.667,
            noise_scale_w: 0.8,
            speaker_id: 0,
            queue_size: 16,
        }
    }
}

impl SynthesisConfig {
    /// Create a new config with required paths
    pub fn new(model_path: impl Into<String>, tokens_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            tokens_path: tokens_path.into(),
            ..Default::default()
        }
    }

    /// Set the lexicon path
    pub fn with_lexicon(mut self, lexicon_path: impl Into<String>) -> Self {
        self.lexicon_path = Some(lexicon_path.into());
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Set the dict directory
    pub fn with_dict_dir(mut self, dict_dir: impl Into<String>) -> Self {
        self.dict_dir = Some(dict_dir.into());
        self
    }

    /// Set the speaker ID for multi-speaker models
    pub fn with_speaker(mut self, speaker_id: i32) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    /// Set the speech rate (length scale)
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.length_scale = 1.0 / speed.max(0.1); // Invert: higher speed = lower length_scale
        self
    }
}

/// VITS voice wrapping sherpa-rs
pub struct VitsVoice {
    tts: VitsTts,
    config: SynthesisConfig,
}

impl VitsVoice {
    /// Load a voice from the configured model files
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        if config.model_path.is_empty() {
            return Err(ReciteError::ConfigError("Model path is required".into()));
        }

        if config.tokens_path.is_empty() {
            return Err(ReciteError::ConfigError("Tokens path is required".into()));
        }

        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(ReciteError::VoiceLoadError(format!(
                "Model not found: {}",
                config.model_path
            )));
        }

        let tokens_path = Path::new(&config.tokens_path);
        if !tokens_path.exists() {
            return Err(ReciteError::VoiceLoadError(format!(
                "Tokens file not found: {}",
                config.tokens_path
            )));
        }

        info!("Loading VITS voice from: {}", config.model_path);

        let vits_config = VitsTtsConfig {
            model: config.model_path.clone(),
            tokens: config.tokens_path.clone(),
            lexicon: config.lexicon_path.clone().unwrap_or_default(),
            data_dir: config.data_dir.clone().unwrap_or_default(),
            dict_dir: config.dict_dir.clone().unwrap_or_default(),
            length_scale: config.length_scale,
            noise_scale: config.noise_scale,
            noise_scale_w: config.noise_scale_w,
            ..Default::default()
        };

        let tts = VitsTts::new(vits_config);

        info!("VITS voice loaded");

        Ok(Self { tts, config })
    }

    /// Synthesize message text to mono audio samples
    ///
    /// # Returns
    /// * Tuple of (samples, sample_rate); empty samples for empty text
    pub fn synthesize(&mut self, text: &str) -> Result<(Vec<f32>, u32)> {
        let normalized = normalize_text_for_speech(text);
        if normalized.is_empty() {
            return Ok((Vec::new(), VITS_SAMPLE_RATE));
        }

        debug!("Synthesizing: {}", normalized);

        let audio = self
            .tts
            .create(&normalized, self.config.speaker_id, 1.0)
            .map_err(|e| ReciteError::SynthesisError(format!("Synthesis failed: {}", e)))?;

        let sample_rate = audio.sample_rate as u32;
        let samples = audio.samples;

        debug!(
            "Synthesized {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / sample_rate as f32
        );

        Ok((samples, sample_rate))
    }
}

/// Normalize message text for speech output
///
/// Chat messages are markdown; the voice should read the words, not the
/// markup. Code fences are skipped entirely, links read their label, and
/// common symbols are spelled out.
pub fn normalize_text_for_speech(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        // Heading markers
        let line = trimmed.trim_start_matches('#').trim_start();
        result.push_str(&strip_links(line));
        result.push(' ');
    }

    // Emphasis, inline code, quote and table markup
    let mut result: String = result
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '>' | '|'))
        .collect();

    // Spell out common symbols
    let symbols = [
        ("&", " and "),
        ("%", " percent"),
        ("@", " at "),
        ("#", " number "),
        ("+", " plus "),
        ("=", " equals "),
    ];
    for (symbol, spoken) in symbols {
        result = result.replace(symbol, spoken);
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce `[label](target)` links to their label
fn strip_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let Some(middle) = rest[open..].find("](") else {
            break;
        };
        let middle = open + middle;
        let Some(end) = rest[middle..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&rest[open + 1..middle]);
        rest = &rest[middle + end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(feature = "audio-io")]
mod engine {
    use super::{SynthesisConfig, VitsVoice};
    use crate::audio::ClipPlayer;
    use crate::speech::backend::{
        event_channel, EventSender, PlaybackEvent, SynthesisEngine, Utterance,
    };
    use crate::{ReciteError, Result};
    use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tracing::{error, info, warn};

    enum SynthCommand {
        Speak {
            utterance: Utterance,
            events: EventSender,
            generation: u64,
        },
        Shutdown,
    }

    /// Process-wide VITS synthesis engine
    ///
    /// A worker thread owns the voice and the output stream. `cancel_all`
    /// bumps a generation counter: queued utterances from older generations
    /// are dropped, and an in-flight one is stopped and reports `Ended` to
    /// whoever submitted it. Submitting a new utterance supersedes the
    /// current one.
    pub struct VitsSynthesis {
        commands: Sender<SynthCommand>,
        speaking: Arc<AtomicBool>,
        generation: Arc<AtomicU64>,
        worker: Option<thread::JoinHandle<()>>,
    }

    impl VitsSynthesis {
        /// Start the engine worker. The voice is loaded on the worker; a
        /// load failure turns every later submission into a `Failed` event.
        pub fn spawn(config: SynthesisConfig) -> Result<Self> {
            let (command_tx, command_rx) = bounded(config.queue_size);
            let speaking = Arc::new(AtomicBool::new(false));
            let generation = Arc::new(AtomicU64::new(0));

            let worker = {
                let speaking = Arc::clone(&speaking);
                let generation = Arc::clone(&generation);
                thread::spawn(move || worker_loop(config, command_rx, speaking, generation))
            };

            Ok(Self {
                commands: command_tx,
                speaking,
                generation,
                worker: Some(worker),
            })
        }
    }

    impl SynthesisEngine for VitsSynthesis {
        fn speak(&self, utterance: Utterance, events: EventSender) -> Result<()> {
            // Single voice: a new utterance supersedes whatever is running.
            self.cancel_all();
            let generation = self.generation.load(Ordering::SeqCst);

            self.commands
                .try_send(SynthCommand::Speak {
                    utterance,
                    events,
                    generation,
                })
                .map_err(|e| {
                    ReciteError::ChannelError(format!("Synthesis queue unavailable: {}", e))
                })
        }

        fn cancel_all(&self) {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.speaking.store(false, Ordering::SeqCst);
        }

        fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }
    }

    impl Drop for VitsSynthesis {
        fn drop(&mut self) {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let _ = self.commands.try_send(SynthCommand::Shutdown);
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
        }
    }

    fn worker_loop(
        config: SynthesisConfig,
        command_rx: Receiver<SynthCommand>,
        speaking: Arc<AtomicBool>,
        generation: Arc<AtomicU64>,
    ) {
        info!("Synthesis worker starting");

        let mut voice = match VitsVoice::new(config) {
            Ok(voice) => voice,
            Err(e) => {
                error!("Failed to load synthesis voice: {}", e);
                // Keep answering so submissions fail visibly instead of
                // hanging.
                while let Ok(command) = command_rx.recv() {
                    match command {
                        SynthCommand::Speak { events, .. } => {
                            let _ = events.send(PlaybackEvent::Failed(e.to_string()));
                        }
                        SynthCommand::Shutdown => break,
                    }
                }
                return;
            }
        };

        info!("Synthesis worker ready");

        loop {
            match command_rx.recv() {
                Ok(SynthCommand::Speak {
                    utterance,
                    events,
                    generation: submitted,
                }) => {
                    // Cancelled while queued
                    if generation.load(Ordering::SeqCst) != submitted {
                        continue;
                    }
                    speak_one(
                        &mut voice,
                        &utterance,
                        &events,
                        &generation,
                        submitted,
                        &speaking,
                    );
                }
                Ok(SynthCommand::Shutdown) | Err(_) => break,
            }
        }

        info!("Synthesis worker stopped");
    }

    fn speak_one(
        voice: &mut VitsVoice,
        utterance: &Utterance,
        events: &EventSender,
        generation: &AtomicU64,
        submitted: u64,
        speaking: &AtomicBool,
    ) {
        let (samples, sample_rate) = match voice.synthesize(&utterance.text) {
            Ok(output) => output,
            Err(e) => {
                warn!("Synthesis failed for utterance {}: {}", utterance.id, e);
                let _ = events.send(PlaybackEvent::Failed(e.to_string()));
                return;
            }
        };

        if samples.is_empty() {
            let _ = events.send(PlaybackEvent::Ended);
            return;
        }

        // Cancelled during synthesis
        if generation.load(Ordering::SeqCst) != submitted {
            return;
        }

        let (player_tx, player_rx) = event_channel();
        let mut player = match ClipPlayer::new(player_tx) {
            Ok(player) => player,
            Err(e) => {
                let _ = events.send(PlaybackEvent::Failed(e.to_string()));
                return;
            }
        };
        if let Err(e) = player.load(samples, sample_rate) {
            let _ = events.send(PlaybackEvent::Failed(e.to_string()));
            return;
        }
        if let Err(e) = player.play() {
            let _ = events.send(PlaybackEvent::Failed(e.to_string()));
            return;
        }

        speaking.store(true, Ordering::SeqCst);
        let _ = events.send(PlaybackEvent::Started);

        loop {
            // A newer generation means cancel: stop the clip and report the
            // end of this utterance to its submitter.
            if generation.load(Ordering::SeqCst) != submitted {
                player.detach();
                let _ = events.send(PlaybackEvent::Ended);
                return;
            }

            match player_rx.recv_timeout(Duration::from_millis(20)) {
                Ok(PlaybackEvent::Ended) => {
                    speaking.store(false, Ordering::SeqCst);
                    let _ = events.send(PlaybackEvent::Ended);
                    return;
                }
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    speaking.store(false, Ordering::SeqCst);
                    let _ = events.send(PlaybackEvent::Failed("Output stream lost".into()));
                    return;
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_voice_fails_submissions() {
            let engine =
                VitsSynthesis::spawn(SynthesisConfig::new("/nonexistent.onnx", "/nonexistent.txt"))
                    .unwrap();
            let (tx, rx) = event_channel();

            engine.speak(Utterance::new("hello"), tx).unwrap();

            let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert!(matches!(event, PlaybackEvent::Failed(_)));
            assert!(!engine.is_speaking());
        }

        #[test]
        fn test_cancel_all_clears_speaking() {
            let engine =
                VitsSynthesis::spawn(SynthesisConfig::new("/nonexistent.onnx", "/nonexistent.txt"))
                    .unwrap();
            engine.speaking.store(true, Ordering::SeqCst);
            engine.cancel_all();
            assert!(!engine.is_speaking());
        }
    }
}

#[cfg(feature = "audio-io")]
pub use engine::VitsSynthesis;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SynthesisConfig::default();
        assert_eq!(config.speaker_id, 0);
        assert!(config.lexicon_path.is_none());
        assert!((config.length_scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = SynthesisConfig::new("model.onnx", "tokens.txt")
            .with_lexicon("lexicon.txt")
            .with_speaker(5)
            .with_speed(1.5);

        assert_eq!(config.model_path, "model.onnx");
        assert_eq!(config.tokens_path, "tokens.txt");
        assert_eq!(config.lexicon_path, Some("lexicon.txt".to_string()));
        assert_eq!(config.speaker_id, 5);
        assert!((config.length_scale - 0.667).abs() < 0.01); // 1.0 / 1.5
    }

    #[test]
    fn test_voice_requires_paths() {
        let result = VitsVoice::new(SynthesisConfig::default());
        assert!(matches!(result, Err(ReciteError::ConfigError(_))));
    }

    #[test]
    fn test_voice_missing_model() {
        let result = VitsVoice::new(SynthesisConfig::new("/nonexistent.onnx", "/nonexistent.txt"));
        assert!(matches!(result, Err(ReciteError::VoiceLoadError(_))));
    }

    #[test]
    fn test_normalize_strips_emphasis() {
        let text = "This is **important** and _subtle_.";
        assert_eq!(
            normalize_text_for_speech(text),
            "This is important and subtle."
        );
    }

    #[test]
    fn test_normalize_skips_code_fences() {
        let text = "Run this:\n```\nlet x = 1;\n```\nDone.";
        assert_eq!(normalize_text_for_speech(text), "Run this: Done.");
    }

    #[test]
    fn test_normalize_reads_link_labels() {
        let text = "See [the report](http://example.com/q1.pdf) for details.";
        assert_eq!(
            normalize_text_for_speech(text),
            "See the report for details."
        );
    }

    #[test]
    fn test_normalize_strips_headings() {
        let text = "## Summary\nAll good.";
        assert_eq!(normalize_text_for_speech(text), "Summary All good.");
    }

    #[test]
    fn test_normalize_spells_symbols() {
        let text = "50% faster & cheaper";
        let normalized = normalize_text_for_speech(text);
        assert!(normalized.contains("percent"));
        assert!(normalized.contains("and"));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text_for_speech(""), "");
        assert_eq!(normalize_text_for_speech("```\ncode only\n```"), "");
    }

    #[test]
    fn test_strip_links_unclosed() {
        assert_eq!(strip_links("stray [bracket"), "stray [bracket");
    }
}
