//! Audio listener resource.

use crate::backend::ListenerBackend;
use crate::error::AudioError;
use crate::facade::Audio;
use crate::math::Vec3;

/// The point in world space that hears spatial audio.
///
/// Created through the facade factory; the backend resource is owned by
/// this handle. An engine typically keeps one listener attached to the
/// active camera.
pub struct AudioListener {
    inner: Box<dyn ListenerBackend>,
}

impl AudioListener {
    /// Allocate a listener on the active backend.
    pub fn new(audio: &mut Audio) -> Result<Self, AudioError> {
        let inner = audio.create_listener_backend()?;
        Ok(Self { inner })
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.inner.set_position(position);
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.inner.set_velocity(velocity);
    }

    pub fn set_orientation(&mut self, forward: Vec3, up: Vec3) {
        self.inner.set_orientation(forward, up);
    }

    pub fn position(&self) -> Vec3 {
        self.inner.position()
    }

    pub fn velocity(&self) -> Vec3 {
        self.inner.velocity()
    }

    /// Current (forward, up) orientation pair.
    pub fn orientation(&self) -> (Vec3, Vec3) {
        self.inner.orientation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;

    #[test]
    fn test_listener_creation_and_pose() {
        let mut audio = Audio::new(Box::new(NullBackend::new()));
        let mut listener = AudioListener::new(&mut audio).expect("listener should be created");
        listener.set_position(Vec3::new(1.0, 2.0, 3.0));
        listener.set_velocity(Vec3::new(0.0, 0.0, 1.0));
        listener.set_orientation(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(listener.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(listener.velocity(), Vec3::new(0.0, 0.0, 1.0));
        let (forward, up) = listener.orientation();
        assert_eq!(forward, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(up, Vec3::new(0.0, 1.0, 0.0));
    }
}
