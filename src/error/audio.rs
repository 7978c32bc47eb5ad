// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// These constants provide a single source of truth for error codes shared
/// with engine diagnostics tooling (stats overlay, crash reports).
///
/// Error code range: 2001-2009
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Clip has no samples or a malformed descriptor
    pub const CLIP_INVALID: i32 = 2001;

    /// Backend could not allocate a clip/listener/source resource
    pub const RESOURCE_CREATION_FAILED: i32 = 2002;

    /// Requested playback device is not present
    pub const DEVICE_UNAVAILABLE: i32 = 2003;

    /// No output device exists on the host
    pub const NO_OUTPUT_DEVICE: i32 = 2004;

    /// Failed to open the output audio stream
    pub const STREAM_OPEN_FAILED: i32 = 2005;

    /// Mixer command queue is full
    pub const MIXER_QUEUE_FULL: i32 = 2006;

    /// Facade is shutting down and no longer accepts resource creation
    pub const SHUTTING_DOWN: i32 = 2007;

    /// Mutex was poisoned
    pub const LOCK_POISONED: i32 = 2008;

    /// Failed to decode imported audio data
    pub const DECODE_FAILED: i32 = 2009;
}

/// Log an audio error with structured context
///
/// Logs the numeric code, the component, and the human-readable message.
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Audio, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover backend resource creation, device selection, stream
/// management, and clip import.
///
/// Error code range: 2001-2009
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Clip has no samples or a malformed descriptor
    ClipInvalid,

    /// Backend could not allocate a resource (clip, listener, or source)
    ResourceCreationFailed { kind: String, reason: String },

    /// Requested playback device is not present on the host
    DeviceUnavailable { name: String },

    /// No output device exists on the host
    NoOutputDevice,

    /// Failed to open the output audio stream
    StreamOpenFailed { reason: String },

    /// Mixer command queue is full; the voice was dropped
    MixerQueueFull,

    /// Facade is shutting down and no longer accepts resource creation
    ShuttingDown,

    /// Mutex was poisoned
    LockPoisoned { component: String },

    /// Failed to decode imported audio data
    DecodeFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::ClipInvalid => AudioErrorCodes::CLIP_INVALID,
            AudioError::ResourceCreationFailed { .. } => {
                AudioErrorCodes::RESOURCE_CREATION_FAILED
            }
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::NoOutputDevice => AudioErrorCodes::NO_OUTPUT_DEVICE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::MixerQueueFull => AudioErrorCodes::MIXER_QUEUE_FULL,
            AudioError::ShuttingDown => AudioErrorCodes::SHUTTING_DOWN,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::ClipInvalid => {
                "Audio clip is invalid (empty samples or malformed descriptor)".to_string()
            }
            AudioError::ResourceCreationFailed { kind, reason } => {
                format!("Failed to create audio {}: {}", kind, reason)
            }
            AudioError::DeviceUnavailable { name } => {
                format!("Audio device not available: {}", name)
            }
            AudioError::NoOutputDevice => "No audio output device present".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::MixerQueueFull => {
                "Mixer command queue full; voice dropped".to_string()
            }
            AudioError::ShuttingDown => {
                "Audio facade is shutting down; no new resources accepted".to_string()
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::DecodeFailed { reason } => {
                format!("Failed to decode audio data: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        AudioError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(AudioError::ClipInvalid.code(), AudioErrorCodes::CLIP_INVALID);
        assert_eq!(
            AudioError::ResourceCreationFailed {
                kind: "source".to_string(),
                reason: "test".to_string()
            }
            .code(),
            AudioErrorCodes::RESOURCE_CREATION_FAILED
        );
        assert_eq!(
            AudioError::DeviceUnavailable {
                name: "Speakers".to_string()
            }
            .code(),
            AudioErrorCodes::DEVICE_UNAVAILABLE
        );
        assert_eq!(
            AudioError::NoOutputDevice.code(),
            AudioErrorCodes::NO_OUTPUT_DEVICE
        );
        assert_eq!(
            AudioError::StreamOpenFailed {
                reason: "test".to_string()
            }
            .code(),
            AudioErrorCodes::STREAM_OPEN_FAILED
        );
        assert_eq!(
            AudioError::MixerQueueFull.code(),
            AudioErrorCodes::MIXER_QUEUE_FULL
        );
        assert_eq!(AudioError::ShuttingDown.code(), AudioErrorCodes::SHUTTING_DOWN);
        assert_eq!(
            AudioError::LockPoisoned {
                component: "test".to_string()
            }
            .code(),
            AudioErrorCodes::LOCK_POISONED
        );
        assert_eq!(
            AudioError::DecodeFailed {
                reason: "test".to_string()
            }
            .code(),
            AudioErrorCodes::DECODE_FAILED
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::ResourceCreationFailed {
            kind: "source".to_string(),
            reason: "driver gone".to_string(),
        };
        assert_eq!(err.message(), "Failed to create audio source: driver gone");

        let err = AudioError::DeviceUnavailable {
            name: "Speakers".to_string(),
        };
        assert!(err.message().contains("Speakers"));

        let err = AudioError::ClipInvalid;
        assert!(err.message().contains("invalid"));

        let err = AudioError::ShuttingDown;
        assert!(err.message().contains("shutting down"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::NoOutputDevice;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("test io error");
        let audio_err: AudioError = io_err.into();
        match audio_err {
            AudioError::DecodeFailed { reason } => {
                assert!(reason.contains("test io error"));
            }
            _ => panic!("Expected DecodeFailed"),
        }
    }
}
