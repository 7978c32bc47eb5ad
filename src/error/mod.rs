// Error types for the soundstage audio facade
//
// This module defines custom error types for backend and playback operations,
// providing structured error handling with stable numeric error codes suitable
// for engine-level diagnostics overlays.

mod audio;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// engine subsystem boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
