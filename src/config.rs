//! Configuration management for the audio subsystem
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling tuning of playback defaults, mixer capacities, and device
//! polling without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete audio subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub playback: PlaybackConfig,
    pub mixer: MixerConfig,
    pub devices: DeviceConfig,
}

/// Playback defaults applied at facade startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Global volume applied at startup, in [0, 1]
    pub default_volume: f32,
    /// Whether playback starts globally paused
    pub start_paused: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            start_paused: false,
        }
    }
}

/// Mixer capacities shared with the real-time audio callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Capacity of the lock-free command queue feeding the audio callback
    pub command_queue_capacity: usize,
    /// Maximum number of simultaneously mixed voices
    pub max_voices: usize,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            command_queue_capacity: 64,
            max_voices: 32,
        }
    }
}

/// Output device polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Re-enumerate output devices every N facade updates
    pub refresh_interval_updates: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // At 60 updates per second this re-enumerates roughly every 5s
            refresh_interval_updates: 300,
        }
    }
}

impl Default for AudioConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            mixer: MixerConfig::default(),
            devices: DeviceConfig::default(),
        }
    }
}

impl AudioConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `AudioConfig` - Loaded configuration, or defaults if the file is
    ///   missing or malformed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded audio configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
