use glam::Vec3;

use crate::config::CameraConfig;
use crate::model::Camera;

/// Read-only view of whatever the camera follows.
pub trait TrackedTarget {
    fn position(&self) -> Vec3;

    /// False while the subject's visual representation is still loading.
    fn is_ready(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Centred orbit around the subject.
    #[default]
    Orbit,
    /// Closer framing with the subject pushed off-centre.
    Shoulder,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::Orbit => CameraMode::Shoulder,
            CameraMode::Shoulder => CameraMode::Orbit,
        }
    }
}

/// Mouse-driven orbit camera that exponentially damps toward an ideal pose
/// computed from yaw/pitch and the tracked subject's position.
pub struct CameraController {
    pub config: CameraConfig,
    pub yaw: f32,
    pub pitch: f32,
    pub mode: CameraMode,
    /// Damped pose; persists across frames and starts at the origin.
    pub current_position: Vec3,
    pub current_look_at: Vec3,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            yaw: 0.0,
            pitch: config.initial_pitch.clamp(config.min_pitch, config.max_pitch),
            mode: CameraMode::Orbit,
            current_position: Vec3::ZERO,
            current_look_at: Vec3::ZERO,
        }
    }

    /// Apply a raw mouse delta in pixels.
    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        let sens = self.config.sensitivity;
        self.yaw -= dx * sens;
        self.pitch = (self.pitch - dy * sens).clamp(self.config.min_pitch, self.config.max_pitch);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        tracing::info!(mode = ?self.mode, "camera mode");
    }

    /// Horizontal unit vector to the camera's right, from yaw alone.
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Ideal `(position, look_at)` for a subject standing at `target`.
    pub fn ideal_pose(&self, target: Vec3) -> (Vec3, Vec3) {
        let cfg = &self.config;
        let radius = match self.mode {
            CameraMode::Orbit => cfg.radius,
            CameraMode::Shoulder => cfg.shoulder_radius,
        };

        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let mut offset = Vec3::new(
            radius * sin_yaw * cos_pitch,
            radius * sin_pitch + cfg.height,
            radius * cos_yaw * cos_pitch,
        );
        let mut look_offset = Vec3::new(0.0, cfg.look_height, 0.0);

        if self.mode == CameraMode::Shoulder {
            let right = self.right();
            offset += right * cfg.shoulder_offset;
            look_offset -= right * cfg.shoulder_look_offset;
        }

        let mut position = target + offset;
        position.y = position.y.max(cfg.min_height);
        (position, target + look_offset)
    }

    /// Fraction of the remaining gap closed in a step of `dt` seconds.
    pub fn damping_factor(&self, dt: f32) -> f32 {
        1.0 - (-self.config.decay_rate * dt).exp()
    }

    pub fn update(&mut self, dt: f32, target: &impl TrackedTarget, camera: &mut Camera) {
        if !target.is_ready() {
            return;
        }

        let (ideal_position, ideal_look_at) = self.ideal_pose(target.position());
        let t = self.damping_factor(dt);
        self.current_position = self.current_position.lerp(ideal_position, t);
        self.current_look_at = self.current_look_at.lerp(ideal_look_at, t);

        camera.set_position(self.current_position);
        camera.look_at(self.current_look_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        at: Vec3,
        ready: bool,
    }

    impl TrackedTarget for Fixed {
        fn position(&self) -> Vec3 {
            self.at
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    fn controller() -> CameraController {
        CameraController::new(CameraConfig::default())
    }

    #[test]
    fn test_mouse_delta_turns_yaw() {
        let mut cam = controller();
        let pitch = cam.pitch;
        cam.apply_look(100.0, 0.0);
        assert!((cam.yaw + 0.2).abs() < 1e-6, "yaw was {}", cam.yaw);
        assert_eq!(cam.pitch, pitch);
    }

    #[test]
    fn test_pitch_stays_clamped() {
        let mut cam = controller();
        let (lo, hi) = (cam.config.min_pitch, cam.config.max_pitch);
        let deltas = [1e6, -3.0, -1e7, 250.0, -250.0, 0.5, f32::MAX / 2.0, -f32::MAX / 2.0];
        for dy in deltas {
            cam.apply_look(0.0, dy);
            assert!(cam.pitch >= lo && cam.pitch <= hi, "pitch {} out of range", cam.pitch);
        }
        cam.apply_look(0.0, -1e6);
        assert_eq!(cam.pitch, hi);
        cam.apply_look(0.0, 1e6);
        assert_eq!(cam.pitch, lo);
    }

    #[test]
    fn test_orbit_pose_behind_subject() {
        let mut cam = controller();
        cam.pitch = 0.0;
        let target = Vec3::new(3.0, 0.0, -2.0);
        let (pos, look) = cam.ideal_pose(target);

        let cfg = cam.config;
        assert!(pos.distance(target + Vec3::new(0.0, cfg.height, cfg.radius)) < 1e-5);
        assert!(look.distance(target + Vec3::new(0.0, cfg.look_height, 0.0)) < 1e-5);
    }

    #[test]
    fn test_camera_never_below_floor() {
        let mut cam = controller();
        cam.pitch = cam.config.min_pitch;
        let (pos, _) = cam.ideal_pose(Vec3::ZERO);
        assert!(pos.y >= cam.config.min_height);

        cam.config.height = -10.0;
        let (pos, _) = cam.ideal_pose(Vec3::ZERO);
        assert_eq!(pos.y, cam.config.min_height);
    }

    #[test]
    fn test_shoulder_offsets_are_opposed() {
        let mut cam = controller();
        cam.pitch = 0.0;
        cam.yaw = 0.0;
        let (orbit_pos, orbit_look) = cam.ideal_pose(Vec3::ZERO);
        assert_eq!(orbit_pos.x, 0.0);

        cam.toggle_mode();
        assert_eq!(cam.mode, CameraMode::Shoulder);
        let (pos, look) = cam.ideal_pose(Vec3::ZERO);
        assert!(pos.x > 0.0, "camera shifts to the right");
        assert!(look.x < 0.0, "look-at shifts the other way");
        assert!(pos.z < orbit_pos.z, "shoulder view sits closer");
        assert_eq!(look.y, orbit_look.y);

        cam.toggle_mode();
        assert_eq!(cam.mode, CameraMode::Orbit);
    }

    #[test]
    fn test_right_vector_follows_yaw() {
        let mut cam = controller();
        assert!(cam.right().distance(Vec3::X) < 1e-6);
        cam.yaw = std::f32::consts::FRAC_PI_2;
        // Camera sits on +X looking toward -X, so its right is -Z
        assert!(cam.right().distance(Vec3::NEG_Z) < 1e-6);
    }

    #[test]
    fn test_damping_converges() {
        let mut cam = controller();
        let mut render = Camera::new(800, 600);
        let subject = Fixed { at: Vec3::new(4.0, 0.0, 1.0), ready: true };
        let (ideal, _) = cam.ideal_pose(subject.at);

        let mut prev = cam.current_position.distance(ideal);
        let mut steps = 0;
        while prev > 1e-4 {
            cam.update(1.0 / 60.0, &subject, &mut render);
            let d = cam.current_position.distance(ideal);
            assert!(d < prev, "distance must strictly shrink ({d} >= {prev})");
            prev = d;
            steps += 1;
            assert!(steps < 1000, "did not converge");
        }
        assert_eq!(render.eye, cam.current_position);
        assert_eq!(render.target, cam.current_look_at);
    }

    #[test]
    fn test_damping_is_frame_rate_independent() {
        let cam = controller();
        let one = cam.damping_factor(0.1);
        let two_halves = 1.0 - (1.0 - cam.damping_factor(0.05)).powi(2);
        assert!((one - two_halves).abs() < 1e-6);
        assert!(cam.damping_factor(100.0) > 0.9999);
        assert_eq!(cam.damping_factor(0.0), 0.0);
    }

    #[test]
    fn test_waits_for_subject() {
        let mut cam = controller();
        let mut render = Camera::new(800, 600);
        let subject = Fixed { at: Vec3::ONE, ready: false };
        cam.update(0.5, &subject, &mut render);
        assert_eq!(cam.current_position, Vec3::ZERO);
        assert_eq!(render.target, Vec3::NEG_Z, "render camera untouched");
    }
}
