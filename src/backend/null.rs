//! Null audio backend for headless testing and CI.
//!
//! Mirrors the real backend's state machine (volume, pause, device
//! selection, source lifecycle) without opening any audio stream. Voices
//! keep playing until a [`NullBackendHandle`] finishes them, which makes
//! source reclamation deterministic in tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::clip::{AudioClip, AudioClipDesc};
use crate::device::AudioDevice;
use crate::error::AudioError;
use crate::events::AudioEvent;
use crate::math::Vec3;

use super::{AudioBackend, ClipBackend, ListenerBackend, SourceBackend};

const DEFAULT_DEVICE_NAME: &str = "Null Output";

/// Playback state shared between a null source and the backend handle.
struct NullVoice {
    playing: AtomicBool,
    volume_bits: AtomicU32,
}

impl NullVoice {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }
}

type VoiceRegistry = Arc<Mutex<Vec<Arc<NullVoice>>>>;

/// Test hook for driving null-backend playback from outside the facade.
#[derive(Clone)]
pub struct NullBackendHandle {
    voices: VoiceRegistry,
}

impl NullBackendHandle {
    /// Mark every currently running voice as finished.
    pub fn finish_all(&self) {
        if let Ok(voices) = self.voices.lock() {
            for voice in voices.iter() {
                voice.playing.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Volumes of all registered voices, in registration order.
    pub fn voice_volumes(&self) -> Vec<f32> {
        self.voices
            .lock()
            .map(|voices| voices.iter().map(|v| v.volume()).collect())
            .unwrap_or_default()
    }

    /// Number of voices still playing.
    pub fn live_voices(&self) -> usize {
        self.voices
            .lock()
            .map(|voices| {
                voices
                    .iter()
                    .filter(|v| v.playing.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }
}

struct NullClip {
    samples: Arc<Vec<f32>>,
    desc: AudioClipDesc,
}

impl ClipBackend for NullClip {
    fn desc(&self) -> &AudioClipDesc {
        &self.desc
    }

    fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }
}

struct NullSource {
    clip: Option<AudioClip>,
    position: Vec3,
    voice: Arc<NullVoice>,
    registry: VoiceRegistry,
}

impl SourceBackend for NullSource {
    fn set_clip(&mut self, clip: &AudioClip) {
        self.clip = Some(clip.clone());
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_volume(&mut self, volume: f32) {
        self.voice
            .volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn volume(&self) -> f32 {
        self.voice.volume()
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let valid = self.clip.as_ref().is_some_and(|clip| clip.is_valid());
        if !valid {
            return Err(AudioError::ClipInvalid);
        }

        self.voice.playing.store(true, Ordering::SeqCst);
        // Re-register after a restart in case update() pruned the voice.
        if let Ok(mut voices) = self.registry.lock() {
            if !voices.iter().any(|v| Arc::ptr_eq(v, &self.voice)) {
                voices.push(Arc::clone(&self.voice));
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.voice.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.voice.playing.load(Ordering::SeqCst)
    }
}

struct NullListener {
    position: Vec3,
    velocity: Vec3,
    forward: Vec3,
    up: Vec3,
}

impl ListenerBackend for NullListener {
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn set_orientation(&mut self, forward: Vec3, up: Vec3) {
        self.forward = forward;
        self.up = up;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn orientation(&self) -> (Vec3, Vec3) {
        (self.forward, self.up)
    }
}

/// Null backend: full facade contract, no audio I/O.
pub struct NullBackend {
    volume: f32,
    paused: bool,
    devices: Vec<AudioDevice>,
    active: AudioDevice,
    voices: VoiceRegistry,
    shut_down: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::with_devices(&[DEFAULT_DEVICE_NAME])
    }

    /// Build a null backend with a fixed device list; the first entry is
    /// the default device.
    pub fn with_devices(names: &[&str]) -> Self {
        let devices: Vec<AudioDevice> = names
            .iter()
            .enumerate()
            .map(|(i, name)| AudioDevice::new(*name, i == 0))
            .collect();
        let active = devices
            .first()
            .cloned()
            .unwrap_or_else(|| AudioDevice::new(DEFAULT_DEVICE_NAME, true));

        Self {
            volume: 1.0,
            paused: false,
            devices,
            active,
            voices: Arc::new(Mutex::new(Vec::new())),
            shut_down: false,
        }
    }

    /// Create a backend plus a handle for finishing voices from tests.
    pub fn with_handle() -> (Self, NullBackendHandle) {
        let backend = Self::new();
        let handle = NullBackendHandle {
            voices: Arc::clone(&backend.voices),
        };
        (backend, handle)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullBackend {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_active_device(&mut self, device: &AudioDevice) -> Result<AudioDevice, AudioError> {
        let selected = match self.devices.iter().find(|d| *d == device) {
            Some(found) => found.clone(),
            None => {
                log::warn!(
                    "[NullBackend] Device '{}' not available, falling back to default",
                    device.name()
                );
                self.default_device()
            }
        };
        self.active = selected.clone();
        Ok(selected)
    }

    fn active_device(&self) -> AudioDevice {
        self.active.clone()
    }

    fn default_device(&self) -> AudioDevice {
        self.devices
            .iter()
            .find(|d| d.is_default())
            .cloned()
            .unwrap_or_else(|| self.active.clone())
    }

    fn all_devices(&self) -> &[AudioDevice] {
        &self.devices
    }

    fn create_clip(
        &mut self,
        samples: Arc<Vec<f32>>,
        desc: AudioClipDesc,
    ) -> Result<Arc<dyn ClipBackend>, AudioError> {
        Ok(Arc::new(NullClip { samples, desc }))
    }

    fn create_listener(&mut self) -> Result<Box<dyn ListenerBackend>, AudioError> {
        Ok(Box::new(NullListener {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }))
    }

    fn create_source(&mut self) -> Result<Box<dyn SourceBackend>, AudioError> {
        if self.shut_down {
            return Err(AudioError::ResourceCreationFailed {
                kind: "source".to_string(),
                reason: "backend is shut down".to_string(),
            });
        }
        Ok(Box::new(NullSource {
            clip: None,
            position: Vec3::ZERO,
            voice: Arc::new(NullVoice::new()),
            registry: Arc::clone(&self.voices),
        }))
    }

    fn update(&mut self) -> Result<Vec<AudioEvent>, AudioError> {
        // Drop registry entries whose voices have finished.
        if let Ok(mut voices) = self.voices.lock() {
            voices.retain(|v| v.playing.load(Ordering::SeqCst));
        }
        Ok(Vec::new())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        if let Ok(mut voices) = self.voices.lock() {
            for voice in voices.iter() {
                voice.playing.store(false, Ordering::SeqCst);
            }
            voices.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device_falls_back_to_default() {
        let mut backend = NullBackend::with_devices(&["Main", "Secondary"]);
        let requested = AudioDevice::new("Missing", false);
        let applied = backend.set_active_device(&requested).unwrap();
        assert_eq!(applied.name(), "Main");
        assert_eq!(backend.active_device().name(), "Main");
    }

    #[test]
    fn test_known_device_is_selected() {
        let mut backend = NullBackend::with_devices(&["Main", "Secondary"]);
        let requested = AudioDevice::new("Secondary", false);
        let applied = backend.set_active_device(&requested).unwrap();
        assert_eq!(applied.name(), "Secondary");
    }

    #[test]
    fn test_source_without_clip_fails_to_start() {
        let mut backend = NullBackend::new();
        let mut source = backend.create_source().unwrap();
        assert!(matches!(source.start(), Err(AudioError::ClipInvalid)));
        assert!(!source.is_playing());
    }

    #[test]
    fn test_handle_finishes_voices() {
        let (mut backend, handle) = NullBackend::with_handle();
        let clip_inner = backend
            .create_clip(
                Arc::new(vec![0.0, 0.1]),
                AudioClipDesc {
                    num_samples: 2,
                    ..AudioClipDesc::default()
                },
            )
            .unwrap();
        // Route through a real AudioClip so validity checks run.
        let clip = crate::clip::test_support::wrap(clip_inner);

        let mut source = backend.create_source().unwrap();
        source.set_clip(&clip);
        source.start().unwrap();
        assert!(source.is_playing());
        assert_eq!(handle.live_voices(), 1);

        handle.finish_all();
        assert!(!source.is_playing());
        assert_eq!(handle.live_voices(), 0);
    }

    #[test]
    fn test_shutdown_blocks_source_creation() {
        let mut backend = NullBackend::new();
        backend.shutdown();
        assert!(matches!(
            backend.create_source(),
            Err(AudioError::ResourceCreationFailed { .. })
        ));
    }
}
