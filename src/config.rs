/// Tunables for the player and camera controllers.
///
/// Every constant the controllers use lives here so the binaries and tests
/// can tweak behaviour without touching the update code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub player: PlayerConfig,
    pub camera: CameraConfig,
    /// Upper bound on the elapsed time fed into a single frame (seconds).
    pub max_frame_dt: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            camera: CameraConfig::default(),
            max_frame_dt: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    /// Horizontal walk speed in world units per second. Default 4.0.
    pub speed: f32,
    /// Vertical acceleration, negative is down. Default -20.0.
    pub gravity: f32,
    /// Vertical velocity applied when a jump starts. Default 8.0.
    pub jump_force: f32,
    /// Facing slerp factor per second, clamped to 1 per frame. Default 10.0.
    pub turn_rate: f32,
    /// Animation cross-fade duration in seconds. Default 0.2.
    pub crossfade: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            gravity: -20.0,
            jump_force: 8.0,
            turn_rate: 10.0,
            crossfade: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Radians of rotation per pixel of mouse movement. Default 0.002.
    pub sensitivity: f32,
    /// Lowest pitch in radians. Default -0.35.
    pub min_pitch: f32,
    /// Highest pitch in radians. Default 1.2.
    pub max_pitch: f32,
    /// Pitch at construction, raised above the horizon. Default 0.3.
    pub initial_pitch: f32,
    /// Orbit distance from the player in orbit mode. Default 5.0.
    pub radius: f32,
    /// Orbit distance from the player in shoulder mode. Default 3.0.
    pub shoulder_radius: f32,
    /// Vertical offset added to the camera position. Default 1.5.
    pub height: f32,
    /// Vertical offset of the look-at point above the player. Default 1.2.
    pub look_height: f32,
    /// Floor for the camera's world-space y. Default 0.2.
    pub min_height: f32,
    /// Exponential damping rate. The damped pose covers half the remaining
    /// distance every `ln 2 / decay_rate` seconds (~69 ms at the default 10.0).
    pub decay_rate: f32,
    /// Lateral camera offset in shoulder mode. Default 0.8.
    pub shoulder_offset: f32,
    /// Lateral look-at offset in shoulder mode, applied opposite to the
    /// camera offset. Default 0.6.
    pub shoulder_look_offset: f32,
}

impl CameraConfig {
    /// Time for the damped pose to close half of the gap to the ideal pose.
    pub fn half_life(&self) -> f32 {
        std::f32::consts::LN_2 / self.decay_rate
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.002,
            min_pitch: -0.35,
            max_pitch: 1.2,
            initial_pitch: 0.3,
            radius: 5.0,
            shoulder_radius: 3.0,
            height: 1.5,
            look_height: 1.2,
            min_height: 0.2,
            decay_rate: 10.0,
            shoulder_offset: 0.8,
            shoulder_look_offset: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_half_life() {
        let cfg = CameraConfig::default();
        assert!((cfg.half_life() - 0.0693).abs() < 1e-3, "half-life was {}", cfg.half_life());
    }

    #[test]
    fn test_pitch_range_is_ordered() {
        let cfg = CameraConfig::default();
        assert!(cfg.min_pitch < cfg.max_pitch);
        assert!(cfg.max_pitch < std::f32::consts::FRAC_PI_2);
    }
}
