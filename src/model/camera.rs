use glam::{Mat4, Vec3};

/// Render camera: a world-space eye looking at a target point.
///
/// The camera controller owns where it goes; this type only stores the pose
/// and turns it into matrices for the renderer.
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::ZERO,
            // Looks down -Z until the controller places it.
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 500.0,
        }
    }

    pub fn set_position(&mut self, eye: Vec3) {
        self.eye = eye;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Unit view direction, or zero when eye and target coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_proj(&self) -> Mat4 {
        // look_at_rh is undefined for a zero-length view vector
        let target = if self.eye.distance_squared(self.target) > f32::EPSILON {
            self.target
        } else {
            self.eye + Vec3::NEG_Z
        };
        let view = Mat4::look_at_rh(self.eye, target, self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forward_is_negative_z() {
        let cam = Camera::new(800, 600);
        assert_eq!(cam.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn test_degenerate_pose_has_zero_forward() {
        let mut cam = Camera::new(800, 600);
        cam.set_position(Vec3::ONE);
        cam.look_at(Vec3::ONE);
        assert_eq!(cam.forward(), Vec3::ZERO);
        assert!(cam.view_proj().is_finite(), "view_proj must stay finite");
    }
}
