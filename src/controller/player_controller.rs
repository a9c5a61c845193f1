use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::config::PlayerConfig;
use crate::controller::animation::{AnimationMixer, AnimationState};
use crate::controller::camera_controller::TrackedTarget;
use crate::controller::input::KeyState;
use crate::model::{AssetError, CharacterAssets, CharacterModel};

/// Player movement, jump/gravity integration and animation selection.
///
/// The ground is the infinite plane y = 0; there is no other collision.
pub struct PlayerController {
    pub config: PlayerConfig,
    pub position: Vec3,
    pub vertical_velocity: f32,
    pub is_jumping: bool,
    /// Yaw-only rotation of the visual mesh.
    pub facing: Quat,
    pub animation_state: AnimationState,
    mixer: AnimationMixer,
    assets: CharacterAssets,
    model: Option<CharacterModel>,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, assets: CharacterAssets) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            vertical_velocity: 0.0,
            is_jumping: false,
            facing: Quat::IDENTITY,
            animation_state: AnimationState::Idle,
            mixer: AnimationMixer::default(),
            assets,
            model: None,
        }
    }

    /// Check the asset gate; opens at most once.
    ///
    /// Returns whether the character is loaded. A failed asset is fatal and
    /// is handed back to the caller.
    pub fn poll_assets(&mut self) -> Result<bool, AssetError> {
        if self.model.is_some() {
            return Ok(true);
        }
        let Some(model) = self.assets.poll()? else {
            return Ok(false);
        };

        self.mixer = AnimationMixer::new(model.clips.iter().cloned());
        self.mixer.play(self.animation_state, 0.0);
        tracing::info!(
            vertices = model.mesh.vertices.len(),
            clips = model.clips.len(),
            "character loaded"
        );
        self.model = Some(model);
        Ok(true)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&CharacterModel> {
        self.model.as_ref()
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Advance one frame. `camera_forward` is the render camera's current
    /// view direction; only its horizontal part is used.
    pub fn update(&mut self, dt: f32, keys: &KeyState, camera_forward: Vec3) {
        if !self.is_loaded() {
            return;
        }

        self.mixer.update(dt);

        if keys.jump && !self.is_jumping {
            self.vertical_velocity = self.config.jump_force;
            self.is_jumping = true;
        }

        // Semi-implicit Euler
        self.vertical_velocity += self.config.gravity * dt;
        self.position.y += self.vertical_velocity * dt;

        if self.position.y <= 0.0 {
            self.position.y = 0.0;
            self.vertical_velocity = 0.0;
            self.is_jumping = false;
        }

        let input = input_axes(keys);
        let has_move_input = input != Vec2::ZERO;
        if has_move_input {
            if let Some(direction) = camera_relative_direction(input, camera_forward) {
                self.position += direction * self.config.speed * dt;
                self.turn_towards(direction, dt);
            }
        }

        let next = AnimationState::select(self.is_jumping, has_move_input);
        if next != self.animation_state {
            self.animation_state = next;
            self.mixer.play(next, self.config.crossfade);
        }
    }

    fn turn_towards(&mut self, direction: Vec3, dt: f32) {
        let target_yaw = direction.x.atan2(direction.z);
        let target = Quat::from_rotation_y(target_yaw);
        let t = (self.config.turn_rate * dt).min(1.0);
        self.facing = self.facing.slerp(target, t);
    }

    /// Current yaw of the visual mesh in radians.
    pub fn facing_yaw(&self) -> f32 {
        let (yaw, _, _) = self.facing.to_euler(EulerRot::YXZ);
        yaw
    }

    /// World transform for the character mesh.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.facing, self.position)
    }
}

impl TrackedTarget for PlayerController {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn is_ready(&self) -> bool {
        self.is_loaded()
    }
}

/// Raw input axes: `x` is right (+) / left (-), `y` is the world-z axis
/// where forward is -1 and backward is +1. Opposing keys cancel.
pub fn input_axes(keys: &KeyState) -> Vec2 {
    let mut input = Vec2::ZERO;
    if keys.forward {
        input.y -= 1.0;
    }
    if keys.backward {
        input.y += 1.0;
    }
    if keys.left {
        input.x -= 1.0;
    }
    if keys.right {
        input.x += 1.0;
    }
    input
}

/// Map input axes to a unit world-space direction on the ground plane,
/// relative to where the camera looks. `None` for zero input or a camera
/// looking straight up or down.
pub fn camera_relative_direction(input: Vec2, camera_forward: Vec3) -> Option<Vec3> {
    if input == Vec2::ZERO {
        return None;
    }
    let input = input.normalize();

    let forward = Vec3::new(camera_forward.x, 0.0, camera_forward.z).try_normalize()?;
    let right = forward.cross(Vec3::Y);

    (forward * -input.y + right * input.x).try_normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::assets;

    const DT: f32 = 1.0 / 60.0;

    fn loaded_player() -> PlayerController {
        let assets = CharacterAssets::pending();
        assets::resolve_procedural(&assets);
        let mut player = PlayerController::new(PlayerConfig::default(), assets);
        assert_eq!(player.poll_assets(), Ok(true));
        player
    }

    fn keys(f: impl FnOnce(&mut KeyState)) -> KeyState {
        let mut k = KeyState::default();
        f(&mut k);
        k
    }

    #[test]
    fn test_noop_until_loaded() {
        let mut player = PlayerController::new(PlayerConfig::default(), CharacterAssets::pending());
        let k = keys(|k| {
            k.forward = true;
            k.jump = true;
        });
        player.update(DT, &k, Vec3::NEG_Z);
        assert_eq!(player.position, Vec3::ZERO);
        assert!(!player.is_jumping);
        assert_eq!(player.poll_assets(), Ok(false));
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let combos = [
            keys(|k| {
                k.forward = true;
                k.backward = true;
            }),
            keys(|k| {
                k.left = true;
                k.right = true;
            }),
            keys(|k| {
                k.forward = true;
                k.backward = true;
                k.left = true;
                k.right = true;
            }),
        ];
        for k in combos {
            assert_eq!(input_axes(&k), Vec2::ZERO);
            let mut player = loaded_player();
            for _ in 0..30 {
                player.update(DT, &k, Vec3::NEG_Z);
            }
            assert_eq!(player.position.x, 0.0);
            assert_eq!(player.position.z, 0.0);
            assert_eq!(player.animation_state, AnimationState::Idle);
        }
    }

    #[test]
    fn test_never_below_ground() {
        let mut player = loaded_player();
        let steps = [0.001, 0.016, 0.05, 0.1, 0.033, 0.5, 0.016];
        for i in 0..200 {
            let k = keys(|k| {
                k.jump = i % 37 == 0;
                k.forward = i % 3 == 0;
            });
            player.update(steps[i % steps.len()], &k, Vec3::new(0.3, -0.8, -0.5));
            assert!(player.position.y >= 0.0, "y went negative: {}", player.position.y);
        }
    }

    #[test]
    fn test_jump_not_retriggered_midair() {
        let mut player = loaded_player();
        let jump = keys(|k| k.jump = true);
        player.update(DT, &jump, Vec3::NEG_Z);
        assert!(player.is_jumping);

        for _ in 0..10 {
            player.update(DT, &KeyState::default(), Vec3::NEG_Z);
        }
        let before = player.vertical_velocity;
        player.update(DT, &jump, Vec3::NEG_Z);
        let expected = before + player.config.gravity * DT;
        assert!((player.vertical_velocity - expected).abs() < 1e-5, "velocity was reset mid-air");
        assert!(player.vertical_velocity < player.config.jump_force);
    }

    #[test]
    fn test_jump_arc() {
        let mut player = loaded_player();
        assert_eq!(player.config.gravity, -20.0);
        assert_eq!(player.config.jump_force, 8.0);

        player.update(DT, &keys(|k| k.jump = true), Vec3::NEG_Z);
        assert_eq!(player.animation_state, AnimationState::Jump);

        let mut peak: f32 = player.position.y;
        for _ in 0..60 {
            player.update(DT, &KeyState::default(), Vec3::NEG_Z);
            peak = peak.max(player.position.y);
        }

        // v^2 / 2g = 64 / 40
        assert!((peak - 1.6).abs() < 0.1, "peak was {peak}");
        assert_eq!(player.position.y, 0.0);
        assert_eq!(player.vertical_velocity, 0.0);
        assert!(!player.is_jumping);
        assert_eq!(player.animation_state, AnimationState::Idle);
    }

    #[test]
    fn test_forward_follows_camera() {
        let mut player = loaded_player();
        let forward = keys(|k| k.forward = true);
        for _ in 0..60 {
            player.update(DT, &forward, Vec3::NEG_Z);
        }

        let speed = player.config.speed;
        assert!((player.position.z + speed).abs() < 1e-3, "z was {}", player.position.z);
        assert!(player.position.x.abs() < 1e-5);
        assert_eq!(player.position.y, 0.0);
        assert_eq!(player.animation_state, AnimationState::Walk);

        // The mesh's +Z front turns to face the direction of travel
        let front = player.facing * Vec3::Z;
        assert!(front.distance(Vec3::NEG_Z) < 1e-2, "front was {front}");
        assert!((player.facing_yaw().abs() - std::f32::consts::PI).abs() < 1e-2);
    }

    #[test]
    fn test_camera_pitch_does_not_slow_movement() {
        let mut player = loaded_player();
        let forward = keys(|k| k.forward = true);
        // Camera looking steeply down along -Z
        player.update(1.0 / 10.0, &forward, Vec3::new(0.0, -0.9, -0.1).normalize());
        assert!((player.position.z + 0.4).abs() < 1e-4, "z was {}", player.position.z);
    }

    #[test]
    fn test_strafe_right_is_camera_right() {
        let dir = camera_relative_direction(Vec2::new(1.0, 0.0), Vec3::NEG_Z).unwrap();
        assert!(dir.distance(Vec3::X) < 1e-6);

        // Camera looking down +X: its right is +Z
        let dir = camera_relative_direction(Vec2::new(1.0, 0.0), Vec3::X).unwrap();
        assert!(dir.distance(Vec3::Z) < 1e-6);

        let diag = camera_relative_direction(Vec2::new(1.0, -1.0), Vec3::NEG_Z).unwrap();
        assert!((diag.length() - 1.0).abs() < 1e-6, "diagonal is normalised");
    }

    #[test]
    fn test_degenerate_camera_forward_skips_movement() {
        assert_eq!(camera_relative_direction(Vec2::new(0.0, -1.0), Vec3::NEG_Y), None);
        assert_eq!(camera_relative_direction(Vec2::ZERO, Vec3::NEG_Z), None);

        let mut player = loaded_player();
        player.update(DT, &keys(|k| k.forward = true), Vec3::ZERO);
        assert_eq!(player.position, Vec3::ZERO);
    }
}
