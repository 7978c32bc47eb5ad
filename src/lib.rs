// Soundstage - Game Engine Audio Facade
// Fire-and-forget playback, device selection, and per-frame source reclamation

// Module declarations
pub mod backend;
pub mod clip;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod facade;
pub mod listener;
pub mod math;
pub mod source;

// Re-exports for convenience
pub use backend::{
    AudioBackend, ClipBackend, CpalBackend, ListenerBackend, NullBackend, NullBackendHandle,
    SourceBackend,
};
pub use clip::{AudioClip, AudioClipDesc};
pub use config::AudioConfig;
pub use device::AudioDevice;
pub use error::{AudioError, AudioErrorCodes, ErrorCode};
pub use events::{AudioEvent, AudioEventHub};
pub use facade::Audio;
pub use listener::AudioListener;
pub use math::Vec3;
pub use source::AudioSource;

/// Initialize logging for hosts that do not install their own subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().try_init();
    tracing::debug!("soundstage logging initialized");
}
