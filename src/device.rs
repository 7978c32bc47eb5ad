//! Playback device identifiers
//!
//! Devices are value objects identified by their human-readable name. The
//! backend owns enumeration; this type only carries identity.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier for a device that can be used for playing audio.
///
/// Equality and hashing consider only the device name, so a descriptor
/// obtained before a device-list refresh still compares equal to the same
/// physical device afterwards.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    name: String,
    is_default: bool,
}

impl AudioDevice {
    pub fn new(name: impl Into<String>, is_default: bool) -> Self {
        Self {
            name: name.into(),
            is_default,
        }
    }

    /// Human-readable device name as reported by the host.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the host reported this device as its default output.
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl PartialEq for AudioDevice {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AudioDevice {}

impl Hash for AudioDevice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
