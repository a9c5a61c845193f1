use crate::config::ControllerConfig;
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{InputEvent, InputProcessor, InputState};
use crate::controller::player_controller::PlayerController;
use crate::model::{AssetError, Camera, CharacterAssets};

/// Owns the input state and both controllers and runs them in order once
/// per rendered frame: input -> player -> camera.
pub struct FrameDriver {
    pub config: ControllerConfig,
    pub input: InputState,
    pub processor: InputProcessor,
    pub player: PlayerController,
    pub camera_controller: CameraController,
    pub camera: Camera,
    pub fps: FpsCounter,
}

impl FrameDriver {
    pub fn new(config: ControllerConfig, assets: CharacterAssets, width: u32, height: u32) -> Self {
        tracing::debug!(camera_half_life = config.camera.half_life(), max_frame_dt = config.max_frame_dt, "frame driver");
        Self {
            config,
            input: InputState::new(),
            processor: InputProcessor::default(),
            player: PlayerController::new(config.player, assets),
            camera_controller: CameraController::new(config.camera),
            camera: Camera::new(width, height),
            fps: FpsCounter::default(),
        }
    }

    /// Record a platform event. Nothing is recomputed until the next tick.
    pub fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::KeyDown(key) = event {
            if self.processor.is_escape(key) {
                self.input.request_pointer_release();
            }
        }
        self.input.process_event(event);
    }

    /// Drop held keys, pending presses and queued look samples.
    pub fn clear_keys(&mut self) {
        self.input.clear_keys();
        self.input.look_samples.clear();
    }

    /// Advance one frame by `dt` seconds.
    ///
    /// Fails only when a character asset failed to load; the caller decides
    /// whether that ends the session.
    pub fn tick(&mut self, dt: f32) -> Result<(), AssetError> {
        // Time step
        let dt = if dt.is_finite() { dt.clamp(0.0, self.config.max_frame_dt) } else { 0.0 };
        self.fps.record(dt);

        self.player.poll_assets()?;

        for key in self.input.consume_presses() {
            if self.processor.wants_to_toggle_view(&key) {
                self.camera_controller.toggle_mode();
            }
        }

        for (dx, dy) in self.input.consume_look() {
            self.camera_controller.apply_look(dx, dy);
        }

        // Player reads last frame's camera facing, camera then tracks the
        // player's new position.
        let keys = self.processor.key_state(&self.input);
        self.player.update(dt, &keys, self.camera.forward());
        self.camera_controller.update(dt, &self.player, &mut self.camera);

        Ok(())
    }
}

/// Frames-per-second averaged over roughly one second.
#[derive(Debug, Default, Clone)]
pub struct FpsCounter {
    pub fps: f32,
    frame_count: u32,
    timer: f32,
}

impl FpsCounter {
    pub fn record(&mut self, dt: f32) {
        self.frame_count += 1;
        self.timer += dt;
        if self.timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.timer;
            self.frame_count = 0;
            self.timer = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::camera_controller::CameraMode;
    use crate::controller::TrackedTarget;
    use crate::model::assets;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn driver() -> FrameDriver {
        let assets = CharacterAssets::pending();
        assets::resolve_procedural(&assets);
        FrameDriver::new(ControllerConfig::default(), assets, 800, 600)
    }

    fn key(name: &str, down: bool) -> InputEvent {
        if down {
            InputEvent::KeyDown(name.to_string())
        } else {
            InputEvent::KeyUp(name.to_string())
        }
    }

    #[test]
    fn test_camera_settles_behind_player() {
        let mut d = driver();
        d.handle_event(&key("KeyW", true));
        for _ in 0..120 {
            d.tick(DT).unwrap();
        }
        d.handle_event(&key("KeyW", false));
        for _ in 0..120 {
            d.tick(DT).unwrap();
        }

        let player = d.player.position();
        assert!(player.z < -3.0, "player walked toward -Z, got {player}");
        let (ideal_pos, ideal_look) = d.camera_controller.ideal_pose(player);
        assert!(d.camera.eye.distance(ideal_pos) < 1e-2);
        assert!(d.camera.target.distance(ideal_look) < 1e-2);
        assert!(d.camera.eye.z > player.z, "camera trails behind the player");
    }

    #[test]
    fn test_elapsed_time_is_clamped() {
        let mut d = driver();
        d.handle_event(&key("KeyW", true));
        // First tick points the camera, the second moves with its facing.
        d.tick(DT).unwrap();
        let z = d.player.position.z;
        d.tick(5.0).unwrap();
        let moved = z - d.player.position.z;
        let max = d.config.player.speed * d.config.max_frame_dt;
        assert!(moved > 0.0 && moved <= max + 1e-5, "moved {moved}, max {max}");
    }

    #[test]
    fn test_view_toggle_key() {
        let mut d = driver();
        d.handle_event(&key("KeyV", true));
        d.tick(DT).unwrap();
        assert_eq!(d.camera_controller.mode, CameraMode::Shoulder);

        // Held key does not toggle again
        d.handle_event(&key("KeyV", true));
        d.tick(DT).unwrap();
        assert_eq!(d.camera_controller.mode, CameraMode::Shoulder);

        d.handle_event(&key("KeyV", false));
        d.handle_event(&key("KeyV", true));
        d.tick(DT).unwrap();
        assert_eq!(d.camera_controller.mode, CameraMode::Orbit);
    }

    #[test]
    fn test_mouse_look_requires_capture() {
        let mut d = driver();
        d.handle_event(&InputEvent::MouseMove { dx: 100.0, dy: 0.0 });
        d.tick(DT).unwrap();
        assert_eq!(d.camera_controller.yaw, 0.0);

        d.handle_event(&InputEvent::PointerLockChanged { locked: true });
        d.handle_event(&InputEvent::MouseMove { dx: 100.0, dy: 0.0 });
        d.tick(DT).unwrap();
        assert!((d.camera_controller.yaw + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_clamps_per_mouse_sample() {
        let mut d = driver();
        d.handle_event(&InputEvent::PointerLockChanged { locked: true });
        d.handle_event(&InputEvent::MouseMove { dx: 0.0, dy: -1000.0 });
        d.handle_event(&InputEvent::MouseMove { dx: 0.0, dy: 100.0 });
        d.tick(DT).unwrap();
        // Up past the limit, then back down from the clamped 1.2
        let expected = d.config.camera.max_pitch - 100.0 * d.config.camera.sensitivity;
        assert!(
            (d.camera_controller.pitch - expected).abs() < 1e-5,
            "pitch was {}, expected {expected}",
            d.camera_controller.pitch
        );
    }

    #[test]
    fn test_clear_drops_queued_input() {
        let mut d = driver();
        d.handle_event(&InputEvent::PointerLockChanged { locked: true });
        d.handle_event(&key("KeyV", true));
        d.handle_event(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });
        d.clear_keys();
        d.tick(DT).unwrap();
        assert_eq!(d.camera_controller.mode, CameraMode::Orbit);
        assert_eq!(d.camera_controller.yaw, 0.0);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut d = driver();
        d.handle_event(&key("KeyW", true));
        d.tick(f32::NAN).unwrap();
        d.tick(f32::INFINITY).unwrap();
        assert!(d.player.position.is_finite(), "position was {}", d.player.position);
        assert!(d.camera.eye.is_finite(), "camera eye was {}", d.camera.eye);
        d.tick(DT).unwrap();
        assert!(d.player.position.is_finite());
    }

    #[test]
    fn test_escape_releases_capture() {
        let mut d = driver();
        d.handle_event(&key("Escape", true));
        assert_eq!(d.input.take_pointer_lock_request(), None);

        d.handle_event(&InputEvent::PointerLockChanged { locked: true });
        d.handle_event(&key("Escape", false));
        d.handle_event(&key("Escape", true));
        assert_eq!(d.input.take_pointer_lock_request(), Some(false));
    }

    #[test]
    fn test_asset_failure_is_fatal() {
        let assets = CharacterAssets::pending();
        let mut d = FrameDriver::new(ControllerConfig::default(), assets.clone(), 800, 600);
        d.tick(DT).unwrap();
        assert!(!d.player.is_loaded());
        assert_eq!(d.camera_controller.current_position, Vec3::ZERO, "camera idle while loading");

        assets.clip_slot("walk").unwrap().fail("corrupt");
        assert!(matches!(d.tick(DT), Err(AssetError::Failed { .. })));
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for _ in 0..61 {
            fps.record(DT);
        }
        assert!((fps.fps - 60.0).abs() < 1.0, "fps was {}", fps.fps);
    }
}
