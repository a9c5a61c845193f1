// MODEL: Camera pose and loaded character data
pub mod camera;
pub mod assets;

pub use camera::Camera;
pub use assets::{AnimationClip, AssetError, AssetSlot, CharacterAssets, CharacterModel, LoadState};
