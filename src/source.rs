//! Caller-controlled audio source resource.
//!
//! This is the full-control counterpart to [`Audio::play`]: the caller
//! keeps the handle, binds clips, and starts/stops playback explicitly.
//! Fire-and-forget sources created by `play()` never surface here; they
//! stay inside the facade.

use crate::backend::SourceBackend;
use crate::clip::AudioClip;
use crate::error::AudioError;
use crate::facade::Audio;
use crate::math::Vec3;

/// Handle to a backend playback source.
pub struct AudioSource {
    inner: Box<dyn SourceBackend>,
}

impl AudioSource {
    /// Allocate a source on the active backend.
    pub fn new(audio: &mut Audio) -> Result<Self, AudioError> {
        let inner = audio.create_source_backend()?;
        Ok(Self { inner })
    }

    /// Bind a clip. Takes effect on the next `play()`.
    pub fn set_clip(&mut self, clip: &AudioClip) {
        self.inner.set_clip(clip);
    }

    /// World-space position; only meaningful for spatial clips.
    pub fn set_position(&mut self, position: Vec3) {
        self.inner.set_position(position);
    }

    /// Per-source volume in [0, 1], multiplied with the global volume.
    pub fn set_volume(&mut self, volume: f32) {
        self.inner.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn position(&self) -> Vec3 {
        self.inner.position()
    }

    pub fn volume(&self) -> f32 {
        self.inner.volume()
    }

    /// Start playback of the bound clip from the beginning.
    pub fn play(&mut self) -> Result<(), AudioError> {
        self.inner.start()
    }

    /// Stop playback. Idempotent.
    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }
}
