//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows).
//!
//! Playback runs in the cpal output callback. Voices reach the callback
//! over a lock-free SPSC ring so the real-time thread never allocates or
//! blocks; master volume and pause state are plain atomics shared with the
//! control side. Device enumeration is refreshed on an update interval and
//! the backend falls back to the default device when the active one
//! disappears.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::clip::{AudioClip, AudioClipDesc};
use crate::config::AudioConfig;
use crate::device::AudioDevice;
use crate::error::AudioError;
use crate::events::AudioEvent;
use crate::math::Vec3;

use super::{AudioBackend, ClipBackend, ListenerBackend, SourceBackend};

/// Master playback state shared with the audio callback.
struct MasterControls {
    volume_bits: AtomicU32,
    paused: AtomicBool,
}

impl MasterControls {
    fn new(volume: f32, paused: bool) -> Self {
        Self {
            volume_bits: AtomicU32::new(volume.to_bits()),
            paused: AtomicBool::new(paused),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.to_bits(), Ordering::Relaxed);
    }
}

/// Per-voice state shared between a source handle and the callback.
///
/// `generation` counts restarts of the owning source. A queued voice
/// carries the generation it was started with; the callback drops any
/// voice whose generation is stale, so restarting a source retires the
/// previous playback instance instead of doubling it.
struct VoiceControls {
    playing: AtomicBool,
    volume_bits: AtomicU32,
    generation: AtomicU64,
}

impl VoiceControls {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            generation: AtomicU64::new(0),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }
}

/// A playing clip instance owned by the audio callback.
struct Voice {
    samples: Arc<Vec<f32>>,
    channels: usize,
    cursor: usize,
    generation: u64,
    controls: Arc<VoiceControls>,
}

impl Voice {
    fn is_current(&self) -> bool {
        self.controls.generation.load(Ordering::Relaxed) == self.generation
    }
}

/// Commands sent from the control thread to the audio callback.
enum MixerCommand {
    AddVoice(Voice),
}

type SharedProducer = Arc<Mutex<Option<rtrb::Producer<MixerCommand>>>>;

/// Mix one voice into an interleaved output buffer.
///
/// Mono clips are broadcast to every output channel; multi-channel clips
/// map pairwise with the last clip channel repeated. Returns false once
/// the voice has finished or was stopped, so the caller can drop it.
fn mix_voice(voice: &mut Voice, data: &mut [f32], out_channels: usize, master_gain: f32) -> bool {
    if !voice.is_current() || !voice.controls.playing.load(Ordering::Relaxed) {
        return false;
    }

    let gain = master_gain * voice.controls.volume();
    let frames = data.len() / out_channels;

    for frame in 0..frames {
        if voice.cursor + voice.channels > voice.samples.len() {
            // Only the current playback instance may clear the flag; a
            // stale voice exhausting must not kill its successor.
            if voice.is_current() {
                voice.controls.playing.store(false, Ordering::Relaxed);
            }
            return false;
        }
        for ch in 0..out_channels {
            let src_ch = ch.min(voice.channels - 1);
            data[frame * out_channels + ch] += voice.samples[voice.cursor + src_ch] * gain;
        }
        voice.cursor += voice.channels;
    }
    true
}

struct CpalClip {
    samples: Arc<Vec<f32>>,
    desc: AudioClipDesc,
}

impl ClipBackend for CpalClip {
    fn desc(&self) -> &AudioClipDesc {
        &self.desc
    }

    fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }
}

struct CpalSource {
    clip: Option<AudioClip>,
    position: Vec3,
    controls: Arc<VoiceControls>,
    producer: SharedProducer,
}

impl SourceBackend for CpalSource {
    fn set_clip(&mut self, clip: &AudioClip) {
        self.clip = Some(clip.clone());
    }

    fn set_position(&mut self, position: Vec3) {
        // Stored for the spatialization stage; the plain mixer only
        // applies gain.
        self.position = position;
    }

    fn set_volume(&mut self, volume: f32) {
        self.controls
            .volume_bits
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn volume(&self) -> f32 {
        self.controls.volume()
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let clip = self
            .clip
            .as_ref()
            .filter(|clip| clip.is_valid())
            .ok_or(AudioError::ClipInvalid)?;

        // Retire any voice from a previous start() before queueing the
        // new one, so playback restarts from the beginning.
        let generation = self.controls.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let channels = clip.desc().channels.max(1) as usize;
        let voice = Voice {
            samples: Arc::clone(clip.backend().samples()),
            channels,
            cursor: 0,
            generation,
            controls: Arc::clone(&self.controls),
        };

        self.controls.playing.store(true, Ordering::Relaxed);

        let mut guard = self.producer.lock().map_err(|_| AudioError::LockPoisoned {
            component: "mixer_producer".to_string(),
        })?;
        let producer = guard.as_mut().ok_or_else(|| AudioError::StreamOpenFailed {
            reason: "output stream not open".to_string(),
        })?;

        producer
            .push(MixerCommand::AddVoice(voice))
            .map_err(|_| {
                self.controls.playing.store(false, Ordering::Relaxed);
                AudioError::MixerQueueFull
            })?;

        Ok(())
    }

    fn stop(&mut self) {
        self.controls.playing.store(false, Ordering::Relaxed);
    }

    fn is_playing(&self) -> bool {
        self.controls.playing.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct CpalListener {
    position: Vec3,
    velocity: Vec3,
    forward: Vec3,
    up: Vec3,
}

impl ListenerBackend for CpalListener {
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

/// CPAL-backed audio backend.
pub struct CpalBackend {
    host: cpal::Host,
    devices: Vec<AudioDevice>,
    active: AudioDevice,
    stream: Option<cpal::Stream>,
    controls: Arc<MasterControls>,
    producer: SharedProducer,
    live_voices: Vec<Weak<VoiceControls>>,
    command_queue_capacity: usize,
    max_voices: usize,
    refresh_interval: u64,
    updates_since_refresh: u64,
}

impl CpalBackend {
    /// Open the default host and an output stream on the default device.
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let devices = enumerate_devices(&host);
        if devices.is_empty() {
            return Err(AudioError::NoOutputDevice);
        }

        let active = devices
            .iter()
            .find(|d| d.is_default())
            .cloned()
            .unwrap_or_else(|| devices[0].clone());

        let mut backend = Self {
            host,
            devices,
            active: active.clone(),
            stream: None,
            controls: Arc::new(MasterControls::new(
                config.playback.default_volume.clamp(0.0, 1.0),
                config.playback.start_paused,
            )),
            producer: Arc::new(Mutex::new(None)),
            live_voices: Vec::new(),
            command_queue_capacity: config.mixer.command_queue_capacity,
            max_voices: config.mixer.max_voices,
            refresh_interval: config.devices.refresh_interval_updates.max(1),
            updates_since_refresh: 0,
        };
        backend.open_stream(&active)?;
        Ok(backend)
    }

    fn find_cpal_device(&self, name: &str) -> Option<cpal::Device> {
        let devices = self.host.output_devices().ok()?;
        for device in devices {
            if device.name().is_ok_and(|n| n == name) {
                return Some(device);
            }
        }
        None
    }

    /// Stop voices tied to the current stream. Their source handles see
    /// `is_playing() == false` and get reclaimed by the facade.
    fn invalidate_live_voices(&mut self) {
        for weak in &self.live_voices {
            if let Some(controls) = weak.upgrade() {
                controls.playing.store(false, Ordering::Relaxed);
            }
        }
        self.live_voices.retain(|w| w.strong_count() > 0);
    }

    /// (Re)open the output stream on the given device with a fresh mixer
    /// ring. In-flight voices do not survive a stream rebuild.
    fn open_stream(&mut self, device: &AudioDevice) -> Result<(), AudioError> {
        self.invalidate_live_voices();
        self.stream = None;

        let cpal_device =
            self.find_cpal_device(device.name())
                .ok_or_else(|| AudioError::DeviceUnavailable {
                    name: device.name().to_string(),
                })?;

        let supported =
            cpal_device
                .default_output_config()
                .map_err(|e| AudioError::StreamOpenFailed {
                    reason: format!("Failed to get default output config: {:?}", e),
                })?;

        let stream_config: cpal::StreamConfig = supported.clone().into();
        let channels_count = stream_config.channels as usize;
        let sample_rate = stream_config.sample_rate.0;

        let (producer, consumer) = rtrb::RingBuffer::new(self.command_queue_capacity);
        let controls = Arc::clone(&self.controls);
        let max_voices = self.max_voices;

        let err_fn = |err| log::error!("[CpalBackend] Output stream error: {}", err);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                let mut consumer = consumer;
                let mut voices: Vec<Voice> = Vec::with_capacity(max_voices);
                cpal_device.build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        while let Ok(MixerCommand::AddVoice(voice)) = consumer.pop() {
                            if voices.len() < max_voices {
                                voices.push(voice);
                            } else {
                                voice.controls.playing.store(false, Ordering::Relaxed);
                            }
                        }

                        data.fill(0.0);
                        if controls.paused.load(Ordering::Relaxed) {
                            // Voices stay queued with frozen cursors.
                            return;
                        }

                        let master = controls.volume();
                        voices.retain_mut(|voice| {
                            mix_voice(voice, data, channels_count, master)
                        });
                    },
                    err_fn,
                    None,
                )
            }
            _ => {
                return Err(AudioError::StreamOpenFailed {
                    reason: "Only F32 sample format is currently supported for output"
                        .to_string(),
                })
            }
        }
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        stream.play().map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        {
            let mut guard = self.producer.lock().map_err(|_| AudioError::LockPoisoned {
                component: "mixer_producer".to_string(),
            })?;
            *guard = Some(producer);
        }

        self.stream = Some(stream);
        self.active = device.clone();
        log::info!(
            "[CpalBackend] Output stream opened on '{}' ({} ch, {} Hz)",
            device.name(),
            channels_count,
            sample_rate
        );
        Ok(())
    }

    fn close_stream(&mut self) {
        self.invalidate_live_voices();
        self.stream = None;
        if let Ok(mut guard) = self.producer.lock() {
            *guard = None;
        }
    }
}

impl AudioBackend for CpalBackend {
    fn set_volume(&mut self, volume: f32) {
        self.controls.set_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.controls.volume()
    }

    fn set_paused(&mut self, paused: bool) {
        self.controls.paused.store(paused, Ordering::Relaxed);
    }

    fn is_paused(&self) -> bool {
        self.controls.paused.load(Ordering::Relaxed)
    }

    fn set_active_device(&mut self, device: &AudioDevice) -> Result<AudioDevice, AudioError> {
        let target = if self.devices.iter().any(|d| d == device) {
            device.clone()
        } else {
            log::warn!(
                "[CpalBackend] Device '{}' not available, falling back to default",
                device.name()
            );
            self.default_device()
        };
        self.open_stream(&target)?;
        Ok(target)
    }

    fn active_device(&self) -> AudioDevice {
        self.active.clone()
    }

    fn default_device(&self) -> AudioDevice {
        self.devices
            .iter()
            .find(|d| d.is_default())
            .or_else(|| self.devices.first())
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
        Ok(Arc::new(CpalClip { samples, desc }))
    }

    fn create_listener(&mut self) -> Result<Box<dyn ListenerBackend>, AudioError> {
        Ok(Box::new(CpalListener {
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            ..CpalListener::default()
        }))
    }

    fn create_source(&mut self) -> Result<Box<dyn SourceBackend>, AudioError> {
        if self.stream.is_none() {
            return Err(AudioError::ResourceCreationFailed {
                kind: "source".to_string(),
                reason: "output stream not open".to_string(),
            });
        }
        let controls = Arc::new(VoiceControls::new());
        self.live_voices.push(Arc::downgrade(&controls));
        Ok(Box::new(CpalSource {
            clip: None,
            position: Vec3::ZERO,
            controls,
            producer: Arc::clone(&self.producer),
        }))
    }

    fn update(&mut self) -> Result<Vec<AudioEvent>, AudioError> {
        let mut events = Vec::new();

        self.updates_since_refresh += 1;
        if self.updates_since_refresh >= self.refresh_interval {
            self.updates_since_refresh = 0;

            let fresh = enumerate_devices(&self.host);
            if fresh != self.devices {
                self.devices = fresh;
                events.push(AudioEvent::DeviceListRefreshed {
                    count: self.devices.len(),
                });

                if self.devices.is_empty() {
                    self.close_stream();
                    return Err(AudioError::NoOutputDevice);
                }

                let active = self.active.clone();
                if !self.devices.contains(&active) {
                    let requested = active.name().to_string();
                    log::warn!(
                        "[CpalBackend] Active device '{}' lost, falling back to default",
                        requested
                    );
                    let fallback = self.default_device();
                    self.open_stream(&fallback)?;
                    events.push(AudioEvent::DeviceFallback {
                        requested,
                        fallback,
                    });
                }
            }
        }

        self.live_voices.retain(|w| w.strong_count() > 0);
        Ok(events)
    }

    fn shutdown(&mut self) {
        self.close_stream();
        log::info!("[CpalBackend] Shut down");
    }
}

fn enumerate_devices(host: &cpal::Host) -> Vec<AudioDevice> {
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    match host.output_devices() {
        Ok(iter) => {
            for device in iter {
                match device.name() {
                    Ok(name) => {
                        let is_default = Some(&name) == default_name.as_ref();
                        devices.push(AudioDevice::new(name, is_default));
                    }
                    Err(err) => {
                        log::warn!("[CpalBackend] Skipping unnamed output device: {}", err)
                    }
                }
            }
        }
        Err(err) => {
            log::warn!("[CpalBackend] Failed to enumerate output devices: {}", err)
        }
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_voice(samples: Vec<f32>, channels: usize, volume: f32) -> Voice {
        let controls = Arc::new(VoiceControls::new());
        controls.playing.store(true, Ordering::Relaxed);
        controls
            .volume_bits
            .store(volume.to_bits(), Ordering::Relaxed);
        spawn_voice(samples, channels, &controls)
    }

    /// Queue a voice on shared controls the way `CpalSource::start` does.
    fn spawn_voice(samples: Vec<f32>, channels: usize, controls: &Arc<VoiceControls>) -> Voice {
        let generation = controls.generation.fetch_add(1, Ordering::Relaxed) + 1;
        controls.playing.store(true, Ordering::Relaxed);
        Voice {
            samples: Arc::new(samples),
            channels,
            cursor: 0,
            generation,
            controls: Arc::clone(controls),
        }
    }

    #[test]
    fn test_mix_voice_mono_broadcasts_to_all_channels() {
        let mut voice = make_voice(vec![0.5, 0.25], 1, 1.0);
        let mut data = vec![0.0f32; 4]; // 2 frames, stereo

        let alive = mix_voice(&mut voice, &mut data, 2, 1.0);
        assert!(alive);
        assert_eq!(data, vec![0.5, 0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_mix_voice_applies_gains() {
        let mut voice = make_voice(vec![1.0], 1, 0.5);
        let mut data = vec![0.0f32; 2];

        // Finishes inside this buffer: one source frame, two output frames.
        let alive = mix_voice(&mut voice, &mut data, 2, 0.5);
        assert!(!alive);
        assert_eq!(data[0], 0.25);
        assert_eq!(data[1], 0.25);
    }

    #[test]
    fn test_mix_voice_finishes_and_clears_playing() {
        let mut voice = make_voice(vec![0.1, 0.2], 1, 1.0);
        let mut data = vec![0.0f32; 8]; // more frames than samples

        let alive = mix_voice(&mut voice, &mut data, 2, 1.0);
        assert!(!alive);
        assert!(!voice.controls.playing.load(Ordering::Relaxed));
    }

    #[test]
    fn test_mix_voice_stopped_voice_is_dropped() {
        let mut voice = make_voice(vec![0.1, 0.2, 0.3], 1, 1.0);
        voice.controls.playing.store(false, Ordering::Relaxed);
        let mut data = vec![0.0f32; 4];

        let alive = mix_voice(&mut voice, &mut data, 2, 1.0);
        assert!(!alive);
        assert_eq!(data, vec![0.0; 4]);
    }

    #[test]
    fn test_mix_voice_accumulates_into_buffer() {
        let mut first = make_voice(vec![0.25, 0.25], 1, 1.0);
        let mut second = make_voice(vec![0.5, 0.5], 1, 1.0);
        let mut data = vec![0.0f32; 4];

        mix_voice(&mut first, &mut data, 2, 1.0);
        mix_voice(&mut second, &mut data, 2, 1.0);
        assert_eq!(data, vec![0.75, 0.75, 0.75, 0.75]);
    }

    #[test]
    fn test_restart_retires_previous_voice() {
        let controls = Arc::new(VoiceControls::new());
        let mut old = spawn_voice(vec![0.5; 8], 1, &controls);

        // Second start on the same source: the old voice is stale and
        // must not mix anymore; only the new one produces output.
        let mut fresh = spawn_voice(vec![0.25; 8], 1, &controls);
        let mut data = vec![0.0f32; 4];

        assert!(!mix_voice(&mut old, &mut data, 2, 1.0));
        assert_eq!(data, vec![0.0; 4], "stale voice must not mix");

        assert!(mix_voice(&mut fresh, &mut data, 2, 1.0));
        assert_eq!(data, vec![0.25; 4]);
        assert!(controls.playing.load(Ordering::Relaxed));
    }

    #[test]
    fn test_stale_voice_exhausting_keeps_successor_playing() {
        let controls = Arc::new(VoiceControls::new());
        let mut old = spawn_voice(vec![0.5], 1, &controls);

        // Drain the old voice while it is still current, then restart.
        let mut sink = vec![0.0f32; 8];
        assert!(!mix_voice(&mut old, &mut sink, 2, 1.0));

        let mut fresh = spawn_voice(vec![0.25; 8], 1, &controls);

        // The exhausted stale voice is dropped again without clearing
        // the shared playing flag out from under the new voice.
        assert!(!mix_voice(&mut old, &mut sink, 2, 1.0));
        assert!(controls.playing.load(Ordering::Relaxed));

        let mut data = vec![0.0f32; 4];
        assert!(mix_voice(&mut fresh, &mut data, 2, 1.0));
        assert_eq!(data, vec![0.25; 4]);
    }

    #[test]
    fn test_master_controls_volume_roundtrip() {
        let controls = MasterControls::new(0.75, false);
        assert_eq!(controls.volume(), 0.75);
        controls.set_volume(0.1);
        assert_eq!(controls.volume(), 0.1);
    }
}
