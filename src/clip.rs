//! Audio clip resources.
//!
//! Clips hold immutable, in-memory f32 PCM data owned by the backend.
//! They are created only through the facade so the backend factory stays
//! capability-scoped to resource constructors in this crate.

use std::path::Path;
use std::sync::Arc;

use crate::backend::ClipBackend;
use crate::error::AudioError;
use crate::facade::Audio;

/// Descriptor for an audio clip's PCM layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioClipDesc {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Total sample count across all channels.
    pub num_samples: u32,
    /// Whether the clip is positioned in world space when played.
    pub is_3d: bool,
}

impl Default for AudioClipDesc {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            num_samples: 0,
            is_3d: false,
        }
    }
}

/// Handle to a backend clip resource.
///
/// Cheap to clone; all clones share the same backend resource.
#[derive(Clone)]
pub struct AudioClip {
    inner: Arc<dyn ClipBackend>,
}

impl AudioClip {
    /// Create a clip from interleaved f32 PCM samples.
    ///
    /// The clip resource is allocated by the active backend. A clip with
    /// empty samples or a malformed descriptor is still created but
    /// reports `is_valid() == false` and is silently ignored by
    /// [`Audio::play`].
    pub fn from_samples(
        audio: &mut Audio,
        samples: Vec<f32>,
        desc: AudioClipDesc,
    ) -> Result<Self, AudioError> {
        let inner = audio.create_clip_backend(Arc::new(samples), desc)?;
        Ok(Self { inner })
    }

    /// Load a clip from a WAV file.
    ///
    /// Integer samples are normalized to [-1, 1]. `spatial` marks the clip
    /// as 3-D positioned for playback.
    pub fn load_wav(
        audio: &mut Audio,
        path: impl AsRef<Path>,
        spatial: bool,
    ) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        log::info!(
            "[Clip] Loaded {:?}: {} samples, {} Hz, {} channel(s)",
            path.as_ref(),
            samples.len(),
            spec.sample_rate,
            spec.channels
        );

        let desc = AudioClipDesc {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            num_samples: samples.len() as u32,
            is_3d: spatial,
        };
        Self::from_samples(audio, samples, desc)
    }

    /// Whether this clip can be played.
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    pub fn desc(&self) -> &AudioClipDesc {
        self.inner.desc()
    }

    /// Clip length in frames (samples per channel).
    pub fn duration_frames(&self) -> u32 {
        let desc = self.inner.desc();
        if desc.channels == 0 {
            return 0;
        }
        desc.num_samples / desc.channels as u32
    }

    pub(crate) fn backend(&self) -> &Arc<dyn ClipBackend> {
        &self.inner
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Wrap a raw backend clip for tests that bypass the facade factory.
    pub(crate) fn wrap(inner: Arc<dyn ClipBackend>) -> AudioClip {
        AudioClip { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;

    fn test_audio() -> Audio {
        Audio::new(Box::new(NullBackend::new()))
    }

    #[test]
    fn test_clip_from_samples_is_valid() {
        let mut audio = test_audio();
        let desc = AudioClipDesc {
            num_samples: 4,
            ..AudioClipDesc::default()
        };
        let clip = AudioClip::from_samples(&mut audio, vec![0.0, 0.5, -0.5, 0.0], desc)
            .expect("clip creation should succeed");
        assert!(clip.is_valid());
        assert_eq!(clip.duration_frames(), 4);
    }

    #[test]
    fn test_empty_clip_is_invalid() {
        let mut audio = test_audio();
        let clip = AudioClip::from_samples(&mut audio, vec![], AudioClipDesc::default())
            .expect("clip creation should succeed");
        assert!(!clip.is_valid());
    }

    #[test]
    fn test_zero_rate_clip_is_invalid() {
        let mut audio = test_audio();
        let desc = AudioClipDesc {
            sample_rate: 0,
            num_samples: 2,
            ..AudioClipDesc::default()
        };
        let clip = AudioClip::from_samples(&mut audio, vec![0.1, 0.2], desc)
            .expect("clip creation should succeed");
        assert!(!clip.is_valid());
    }

    #[test]
    fn test_mismatched_sample_count_is_invalid() {
        let mut audio = test_audio();
        // Descriptor claims more samples than the data holds; the clip
        // must not pass validity and misreport its duration.
        let desc = AudioClipDesc {
            num_samples: 8,
            ..AudioClipDesc::default()
        };
        let clip = AudioClip::from_samples(&mut audio, vec![0.1, 0.2], desc)
            .expect("clip creation should succeed");
        assert!(!clip.is_valid());
    }

    #[test]
    fn test_stereo_duration_frames() {
        let mut audio = test_audio();
        let desc = AudioClipDesc {
            channels: 2,
            num_samples: 8,
            ..AudioClipDesc::default()
        };
        let clip = AudioClip::from_samples(&mut audio, vec![0.0; 8], desc)
            .expect("clip creation should succeed");
        assert_eq!(clip.duration_frames(), 4);
    }

    #[test]
    fn test_load_wav_int_samples() {
        let dir = std::env::temp_dir();
        let path = dir.join("soundstage_test_clip.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for value in [0i16, 8192, -8192, 16384] {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let mut audio = test_audio();
        let clip = AudioClip::load_wav(&mut audio, &path, false).expect("wav should decode");
        let _ = std::fs::remove_file(&path);

        assert!(clip.is_valid());
        assert_eq!(clip.desc().sample_rate, 22_050);
        assert_eq!(clip.desc().channels, 1);
        assert_eq!(clip.duration_frames(), 4);
    }

    #[test]
    fn test_load_wav_missing_file_is_decode_failed() {
        let mut audio = test_audio();
        let result = AudioClip::load_wav(&mut audio, "/nonexistent/clip.wav", false);
        assert!(matches!(result, Err(AudioError::DecodeFailed { .. })));
    }
}
