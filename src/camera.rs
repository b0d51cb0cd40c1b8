//! Orbit camera.
//!
//! The renderer itself only consumes a projection matrix; this camera is the
//! collaborator that produces one. It orbits a look-at point with pitch/yaw
//! control and combines a right-handed perspective projection with the view
//! transform.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

const MAX_PITCH: f32 = PI * 89.0 / 180.0;

/// A perspective camera orbiting a look-at point.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Viewport aspect ratio (width / height).
    pub aspect_ratio: f32,
    fovy: f32,
    near: f32,
    far: f32,
    position: Vec3,
    pitch: f32,
    yaw: f32,
    look_at: Vec3,
}

impl Camera {
    /// Create a camera at the default orbit position.
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            aspect_ratio,
            fovy: 1.4,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 2.0),
            pitch: 0.0,
            yaw: 0.0,
            look_at: Vec3::ZERO,
        }
    }

    /// Orbit by a pitch/yaw delta in radians. Pitch is clamped to ±89° to
    /// keep the up vector well defined.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw += yaw;
    }

    /// Current pitch in radians.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// The camera's world position after applying the orbit rotation.
    pub fn eye(&self) -> Vec3 {
        let rotation = Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch);
        rotation.transform_point3(self.position)
    }

    /// The combined projection * view matrix for the current orbit state.
    pub fn projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.look_at, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fovy, self.aspect_ratio, self.near, self.far);
        projection * view
    }
}
