use serde::Serialize;

/// Three little-endian f32 values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    /// Encoded size in bytes
    pub const SIZE: usize = 12;

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_le_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self::new(f(0), f(4), f(8))
    }

    /// Angle of the (x, z) ground-plane projection, `atan2(z, x)`, in radians
    pub fn heading(self) -> f64 {
        (self.z as f64).atan2(self.x as f64)
    }
}
