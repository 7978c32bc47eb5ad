// Minimal world-space math shared by spatial audio resources

/// World-space position or direction vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Origin / zero vector.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Vec3::ZERO, Vec3::default());
    }

    #[test]
    fn test_new() {
        let v = Vec3::new(1.0, -2.0, 3.5);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, -2.0);
        assert_eq!(v.z, 3.5);
    }
}
