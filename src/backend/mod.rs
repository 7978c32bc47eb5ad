//! Backend abstractions for the audio facade.
//!
//! The facade owns exactly one [`AudioBackend`] selected at startup. The
//! backend performs device enumeration and real playback; resource traits
//! ([`ClipBackend`], [`SourceBackend`], [`ListenerBackend`]) represent the
//! handles its factories return.
//!
//! Backends are deliberately not `Send`/`Sync`: the facade follows a
//! single-threaded cooperative model where all calls happen on the engine
//! thread, and only the backend's own audio callback runs elsewhere, fed
//! through lock-free state.

use std::sync::Arc;

use crate::clip::{AudioClip, AudioClipDesc};
use crate::device::AudioDevice;
use crate::error::AudioError;
use crate::events::AudioEvent;
use crate::math::Vec3;

/// Backend-side audio clip resource: immutable PCM data plus descriptor.
pub trait ClipBackend {
    fn desc(&self) -> &AudioClipDesc;

    /// Interleaved f32 samples, `desc().channels` per frame.
    fn samples(&self) -> &Arc<Vec<f32>>;

    /// Whether the clip can be played: non-empty samples, sane descriptor,
    /// and a descriptor sample count that matches the actual data.
    fn is_valid(&self) -> bool {
        let desc = self.desc();
        !self.samples().is_empty()
            && desc.sample_rate > 0
            && desc.channels > 0
            && desc.num_samples as usize == self.samples().len()
    }
}

/// Backend-side playback source resource.
///
/// A source binds one clip at a time. Position is stored for all sources
/// but only meaningful when the bound clip is spatial.
pub trait SourceBackend {
    fn set_clip(&mut self, clip: &AudioClip);
    fn set_position(&mut self, position: Vec3);
    fn set_volume(&mut self, volume: f32);

    /// Current world-space position.
    fn position(&self) -> Vec3;

    /// Per-source volume in [0, 1].
    fn volume(&self) -> f32;

    /// Start playback of the bound clip from the beginning.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop playback. Idempotent.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Backend-side listener resource.
///
/// Spatialization math is owned by the backend; this trait only carries
/// the listener pose.
pub trait ListenerBackend {
    fn set_position(&mut self, position: Vec3);
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_orientation(&mut self, forward: Vec3, up: Vec3);

    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;

    /// Current (forward, up) orientation pair.
    fn orientation(&self) -> (Vec3, Vec3);
}

/// Trait implemented by concrete audio backends.
///
/// Factories return freshly constructed resources; callers configure them
/// afterwards. Factory failures surface as
/// [`AudioError::ResourceCreationFailed`] when the device or driver cannot
/// allocate the resource.
pub trait AudioBackend {
    /// Set global volume, already clamped to [0, 1] by the facade.
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;

    /// Pause or resume playback globally, across all active sources.
    fn set_paused(&mut self, paused: bool);
    fn is_paused(&self) -> bool;

    /// Switch playback to the given device.
    ///
    /// Returns the device actually selected: the requested one, or the
    /// default device when the requested one is unavailable. Errors only
    /// when the output stream cannot be reopened at all.
    fn set_active_device(&mut self, device: &AudioDevice) -> Result<AudioDevice, AudioError>;

    fn active_device(&self) -> AudioDevice;
    fn default_device(&self) -> AudioDevice;

    /// Stable-ordered device list, valid until the next enumeration refresh.
    fn all_devices(&self) -> &[AudioDevice];

    /// Create a new clip resource from interleaved f32 PCM data.
    fn create_clip(
        &mut self,
        samples: Arc<Vec<f32>>,
        desc: AudioClipDesc,
    ) -> Result<Arc<dyn ClipBackend>, AudioError>;

    /// Create a new listener resource.
    fn create_listener(&mut self) -> Result<Box<dyn ListenerBackend>, AudioError>;

    /// Create a new, not-yet-started source resource.
    fn create_source(&mut self) -> Result<Box<dyn SourceBackend>, AudioError>;

    /// Advance streaming and device bookkeeping; called once per frame.
    ///
    /// Returned events are published by the facade on its event hub.
    fn update(&mut self) -> Result<Vec<AudioEvent>, AudioError>;

    /// Release the output stream and invalidate all live voices. One-way.
    fn shutdown(&mut self);
}

mod cpal;
pub use cpal::CpalBackend;

mod null;
pub use null::{NullBackend, NullBackendHandle};
