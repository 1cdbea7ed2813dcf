//! First-person camera orientation (yaw/pitch) with a clamped pitch range.

use glam::{EulerRot, Quat, Vec3};

/// Yaw/pitch view orientation driven by pointer deltas.
///
/// Pitch is kept inside `[-max_pitch, max_pitch]` by every mutation, so the
/// view can never flip over the poles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrientation {
    /// Radians per pixel of pointer movement.
    pub sensitivity: f32,
    max_pitch: f32,
    yaw: f32,
    pitch: f32,
}

impl Default for CameraOrientation {
    fn default() -> Self {
        Self::new(0.0025, std::f32::consts::FRAC_PI_2 - 0.01)
    }
}

impl CameraOrientation {
    pub fn new(sensitivity: f32, max_pitch: f32) -> Self {
        Self {
            sensitivity,
            max_pitch: max_pitch.abs(),
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn max_pitch(&self) -> f32 {
        self.max_pitch
    }

    /// Set both angles; pitch is clamped.
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-self.max_pitch, self.max_pitch);
    }

    /// Process pointer movement for FPS look controls.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        let yaw = self.yaw - delta_x * self.sensitivity;
        let pitch = self.pitch - delta_y * self.sensitivity;
        self.set_rotation(yaw, pitch);
    }

    /// Snap the orientation so that `eye` looks at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        let dir = target - eye;
        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        if dir.length_squared() < 1e-8 {
            return;
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = dir.y.atan2(horizontal);
        self.set_rotation(yaw, pitch);
    }

    /// View rotation (yaw around Y, then pitch around local X).
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Look direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    /// Forward direction projected on the horizontal plane.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Right direction projected on the horizontal plane.
    pub fn flat_right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }
}
