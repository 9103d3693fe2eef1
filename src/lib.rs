pub mod audio;
pub mod messages;
pub mod sources;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ReciteError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio decode error: {0}")]
    AudioDecodeError(String),

    #[error("Voice load error: {0}")]
    VoiceLoadError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for ReciteError {
    fn from(e: std::io::Error) -> Self {
        ReciteError::IOError(e.to_string())
    }
}

impl ReciteError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            ReciteError::AudioDeviceError(_) => false,
            // Voice errors require fixing the installation
            ReciteError::VoiceLoadError(_) => false,
            // These are typically transient errors
            ReciteError::AudioDecodeError(_) => true,
            ReciteError::SynthesisError(_) => true,
            ReciteError::PlaybackError(_) => true,
            ReciteError::AudioProcessingError(_) => true,
            ReciteError::IOError(_) => false,
            ReciteError::ConfigError(_) => false,
            ReciteError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ReciteError::AudioDeviceError(_) => {
                "Audio device error. Please check your speakers.".to_string()
            }
            ReciteError::AudioDecodeError(_) => {
                "Could not decode the recorded audio for this message.".to_string()
            }
            ReciteError::VoiceLoadError(_) => {
                "Failed to load the speech voice. Please verify voice files are present.".to_string()
            }
            ReciteError::SynthesisError(_) => {
                "Text-to-speech failed. The message is still shown as text.".to_string()
            }
            ReciteError::PlaybackError(_) => {
                "Audio playback failed. Please try again.".to_string()
            }
            ReciteError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            ReciteError::IOError(_) => "File system error occurred.".to_string(),
            ReciteError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ReciteError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReciteError>;
