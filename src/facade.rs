//! The `Audio` facade: single entry point for global playback state and
//! fire-and-forget sound playback.
//!
//! The facade owns one backend selected at startup and a pool of "manual"
//! sources created by [`Audio::play`] calls. Callers never receive handles
//! to manual sources; the facade reclaims them during the per-frame
//! [`Audio::update`] tick. Construct one facade at engine startup and pass
//! it by reference to subsystems that need it; there is no global static.

use crate::backend::{AudioBackend, ClipBackend, CpalBackend, ListenerBackend, SourceBackend};
use crate::clip::{AudioClip, AudioClipDesc};
use crate::config::AudioConfig;
use crate::device::AudioDevice;
use crate::error::{log_audio_error, AudioError};
use crate::events::{AudioEvent, AudioEventHub};
use crate::math::Vec3;

use std::sync::Arc;

/// Facade lifecycle state. The transition to `ShuttingDown` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Active,
    ShuttingDown,
}

/// Global audio playback facade.
pub struct Audio {
    backend: Box<dyn AudioBackend>,
    /// Sources created by `play()`, owned exclusively by the facade.
    manual_sources: Vec<Box<dyn SourceBackend>>,
    /// Scratch collection for the update-pass swap; empty between frames.
    temp_sources: Vec<Box<dyn SourceBackend>>,
    events: AudioEventHub,
    state: LifecycleState,
}

impl Audio {
    /// Build a facade over the given backend.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            manual_sources: Vec::new(),
            temp_sources: Vec::new(),
            events: AudioEventHub::default(),
            state: LifecycleState::Active,
        }
    }

    /// Build a facade over the platform default backend (cpal).
    pub fn with_default_backend(config: &AudioConfig) -> Result<Self, AudioError> {
        let backend = CpalBackend::new(config)?;
        let mut audio = Self::new(Box::new(backend));
        audio.set_volume(config.playback.default_volume);
        audio.set_paused(config.playback.start_paused);
        Ok(audio)
    }

    // ========================================================================
    // FIRE-AND-FORGET PLAYBACK
    // ========================================================================

    /// Start playback of the provided audio clip at a world position.
    ///
    /// This is the quick path for playing a sound without creating an
    /// [`crate::AudioSource`] manually: the facade allocates a source,
    /// configures it, starts it, and reclaims it once playback finishes.
    /// No handle is returned and the instance cannot be controlled
    /// afterwards.
    ///
    /// Invalid clips and backend failures are logged and ignored; the
    /// call never panics or propagates an error.
    pub fn play(&mut self, clip: &AudioClip, position: Vec3, volume: f32) {
        if self.state == LifecycleState::ShuttingDown {
            log::warn!("[Audio] play() ignored during shutdown");
            return;
        }
        if !clip.is_valid() {
            log::debug!("[Audio] play() ignored: clip is invalid");
            return;
        }

        let mut source = match self.backend.create_source() {
            Ok(source) => source,
            Err(err) => {
                log_audio_error(&err, "play");
                return;
            }
        };

        source.set_clip(clip);
        source.set_position(position);
        source.set_volume(volume.clamp(0.0, 1.0));

        if let Err(err) = source.start() {
            log_audio_error(&err, "play");
            return;
        }

        self.manual_sources.push(source);
    }

    /// Play a clip at the origin with full volume.
    pub fn play_clip(&mut self, clip: &AudioClip) {
        self.play(clip, Vec3::ZERO, 1.0);
    }

    /// Number of live fire-and-forget sources.
    pub fn manual_source_count(&self) -> usize {
        self.manual_sources.len()
    }

    // ========================================================================
    // GLOBAL STATE
    // ========================================================================

    /// Set global audio volume. Values outside [0, 1] are clamped.
    pub fn set_volume(&mut self, volume: f32) {
        self.backend.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Global audio volume in [0, 1].
    pub fn volume(&self) -> f32 {
        self.backend.volume()
    }

    /// Pause or resume audio reproduction globally, including manual
    /// sources already started.
    pub fn set_paused(&mut self, paused: bool) {
        self.backend.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.backend.is_paused()
    }

    // ========================================================================
    // DEVICE SELECTION
    // ========================================================================

    /// Switch playback to the given output device.
    ///
    /// If the device is not in [`Audio::all_devices`], playback falls back
    /// to the default device and a [`AudioEvent::DeviceFallback`] event is
    /// published. Fails with [`AudioError::ShuttingDown`] after
    /// [`Audio::shutdown`]; otherwise errors only when the backend cannot
    /// reopen its output stream at all.
    pub fn set_active_device(&mut self, device: &AudioDevice) -> Result<(), AudioError> {
        self.ensure_active()?;
        let applied = self.backend.set_active_device(device).map_err(|err| {
            log_audio_error(&err, "set_active_device");
            err
        })?;

        if applied == *device {
            self.events
                .publish(AudioEvent::ActiveDeviceChanged { device: applied });
        } else {
            self.events.publish(AudioEvent::DeviceFallback {
                requested: device.name().to_string(),
                fallback: applied,
            });
        }
        Ok(())
    }

    /// The device audio is currently played back on.
    pub fn active_device(&self) -> AudioDevice {
        self.backend.active_device()
    }

    /// The host's default output device.
    pub fn default_device(&self) -> AudioDevice {
        self.backend.default_device()
    }

    /// Stable-ordered list of available output devices, valid until the
    /// next enumeration refresh.
    pub fn all_devices(&self) -> &[AudioDevice] {
        self.backend.all_devices()
    }

    /// Subscribe-able hub for device and reclamation events.
    pub fn events(&self) -> &AudioEventHub {
        &self.events
    }

    // ========================================================================
    // PER-FRAME TICK
    // ========================================================================

    /// Advance streaming and reclaim finished manual sources.
    ///
    /// Called once per frame by the engine loop. Still-playing manual
    /// sources are moved into the scratch collection and swapped back,
    /// so the pool is never mutated while being iterated and buffer
    /// capacity is reused across frames. A finished source never survives
    /// past the update that observed it.
    pub fn update(&mut self) {
        if self.state == LifecycleState::ShuttingDown {
            return;
        }

        match self.backend.update() {
            Ok(events) => {
                for event in events {
                    self.events.publish(event);
                }
            }
            Err(err) => log_audio_error(&err, "update"),
        }

        debug_assert!(self.temp_sources.is_empty());
        let mut survivors = std::mem::take(&mut self.temp_sources);
        let before = self.manual_sources.len();

        for source in self.manual_sources.drain(..) {
            if source.is_playing() {
                survivors.push(source);
            }
            // Finished sources drop here, releasing the backend resource.
        }

        std::mem::swap(&mut self.manual_sources, &mut survivors);
        survivors.clear();
        self.temp_sources = survivors;

        let reclaimed = before - self.manual_sources.len();
        if reclaimed > 0 {
            log::debug!("[Audio] Reclaimed {} finished manual source(s)", reclaimed);
            self.events
                .publish(AudioEvent::SourcesReclaimed { count: reclaimed });
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Stop and release every fire-and-forget source immediately.
    ///
    /// Idempotent; used by shutdown and available to gameplay code for
    /// hard scene transitions.
    pub fn stop_manual_sources(&mut self) {
        for mut source in self.manual_sources.drain(..) {
            source.stop();
        }
        self.temp_sources.clear();
    }

    /// Transition to `ShuttingDown`, stop manual sources, and release the
    /// backend's output resources. One-way; further `play()` and
    /// `update()` calls are ignored.
    pub fn shutdown(&mut self) {
        if self.state == LifecycleState::ShuttingDown {
            return;
        }
        self.state = LifecycleState::ShuttingDown;
        self.stop_manual_sources();
        self.backend.shutdown();
        log::info!("[Audio] Facade shut down");
    }

    // ========================================================================
    // RESOURCE FACTORIES
    // Crate-visible so only the resource wrappers (AudioClip, AudioSource,
    // AudioListener) can reach the backend factories.
    // ========================================================================

    pub(crate) fn create_clip_backend(
        &mut self,
        samples: Arc<Vec<f32>>,
        desc: AudioClipDesc,
    ) -> Result<Arc<dyn ClipBackend>, AudioError> {
        self.ensure_active()?;
        self.backend.create_clip(samples, desc)
    }

    pub(crate) fn create_listener_backend(
        &mut self,
    ) -> Result<Box<dyn ListenerBackend>, AudioError> {
        self.ensure_active()?;
        self.backend.create_listener()
    }

    pub(crate) fn create_source_backend(&mut self) -> Result<Box<dyn SourceBackend>, AudioError> {
        self.ensure_active()?;
        self.backend.create_source()
    }

    fn ensure_active(&self) -> Result<(), AudioError> {
        if self.state == LifecycleState::ShuttingDown {
            return Err(AudioError::ShuttingDown);
        }
        Ok(())
    }
}

impl Drop for Audio {
    fn drop(&mut self) {
        self.shutdown();
    }
}
