// CONTROLLER: Input, player and camera logic, and the update loop
pub mod input;
pub mod animation;
pub mod player_controller;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{InputEvent, InputProcessor, InputState, KeyState};
pub use animation::{AnimationMixer, AnimationState};
pub use player_controller::PlayerController;
pub use camera_controller::{CameraController, CameraMode, TrackedTarget};
pub use frame_loop::{FpsCounter, FrameDriver};
