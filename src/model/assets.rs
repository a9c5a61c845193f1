//! Character asset loading as a polled state machine.
//!
//! Each asset lives in an [`AssetSlot`] that moves from `Loading` to either
//! `Ready` or `Failed` exactly once. [`CharacterAssets`] aggregates the mesh
//! slot and one slot per required clip into a single readiness gate.

use std::cell::RefCell;
use std::rc::Rc;

use crate::utils::{self, Mesh};

/// Clips the player controller needs before it starts updating.
pub const REQUIRED_CLIPS: [&str; 3] = ["idle", "walk", "jump"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load asset `{name}`: {reason}")]
    Failed { name: String, reason: String },

    #[error("animation clip `{0}` missing from loaded character")]
    MissingClip(String),
}

/// Named animation clip. Only timing is modelled; poses are out of scope.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub looping: bool,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, looping: bool) -> Self {
        Self { name: name.into(), duration, looping }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

/// Single-threaded shared handle to one asynchronously loaded asset.
#[derive(Debug)]
pub struct AssetSlot<T> {
    name: String,
    state: Rc<RefCell<LoadState<T>>>,
}

impl<T> Clone for AssetSlot<T> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), state: self.state.clone() }
    }
}

impl<T: Clone> AssetSlot<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Rc::new(RefCell::new(LoadState::Loading)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transition `Loading -> Ready`. Returns false if the slot already settled.
    pub fn resolve(&self, value: T) -> bool {
        let mut state = self.state.borrow_mut();
        if !matches!(*state, LoadState::Loading) {
            tracing::warn!(asset = %self.name, "ignoring second completion");
            return false;
        }
        *state = LoadState::Ready(value);
        tracing::debug!(asset = %self.name, "asset ready");
        true
    }

    /// Transition `Loading -> Failed`. Returns false if the slot already settled.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let mut state = self.state.borrow_mut();
        if !matches!(*state, LoadState::Loading) {
            return false;
        }
        let reason = reason.into();
        tracing::error!(asset = %self.name, %reason, "asset failed to load");
        *state = LoadState::Failed(reason);
        true
    }

    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Ready(_))
    }
}

/// Everything the player needs once loading completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterModel {
    pub mesh: Mesh,
    pub clips: Vec<AnimationClip>,
}

impl CharacterModel {
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.iter().find(|c| c.name == name)
    }
}

/// Readiness gate over the character mesh and its required clips.
#[derive(Debug, Clone)]
pub struct CharacterAssets {
    pub mesh: AssetSlot<Mesh>,
    pub clips: Vec<AssetSlot<AnimationClip>>,
}

impl CharacterAssets {
    /// Fresh gate with every slot still loading.
    pub fn pending() -> Self {
        Self {
            mesh: AssetSlot::new("character_mesh"),
            clips: REQUIRED_CLIPS.iter().map(|name| AssetSlot::new(*name)).collect(),
        }
    }

    pub fn clip_slot(&self, name: &str) -> Option<&AssetSlot<AnimationClip>> {
        self.clips.iter().find(|slot| slot.name() == name)
    }

    /// `Ok(Some)` once every slot is ready, `Ok(None)` while any is loading,
    /// `Err` as soon as any slot failed.
    pub fn poll(&self) -> Result<Option<CharacterModel>, AssetError> {
        let mesh = match self.mesh.state() {
            LoadState::Failed(reason) => return Err(failed(self.mesh.name(), reason)),
            LoadState::Loading => None,
            LoadState::Ready(mesh) => Some(mesh),
        };

        let mut clips = Vec::with_capacity(self.clips.len());
        let mut all_clips = true;
        for slot in &self.clips {
            match slot.state() {
                LoadState::Failed(reason) => return Err(failed(slot.name(), reason)),
                LoadState::Loading => all_clips = false,
                LoadState::Ready(clip) => {
                    if clip.name != slot.name() {
                        return Err(AssetError::MissingClip(slot.name().to_string()));
                    }
                    clips.push(clip);
                }
            }
        }

        match mesh {
            Some(mesh) if all_clips => Ok(Some(CharacterModel { mesh, clips })),
            _ => Ok(None),
        }
    }
}

fn failed(name: &str, reason: String) -> AssetError {
    AssetError::Failed { name: name.to_string(), reason }
}

/// Resolve every slot with the procedural stand-in character.
pub fn resolve_procedural(assets: &CharacterAssets) {
    assets.mesh.resolve(utils::create_character_mesh());
    for slot in &assets.clips {
        let clip = match slot.name() {
            "idle" => AnimationClip::new("idle", 2.0, true),
            "walk" => AnimationClip::new("walk", 0.8, true),
            "jump" => AnimationClip::new("jump", 0.8, false),
            other => AnimationClip::new(other, 1.0, true),
        };
        slot.resolve(clip);
    }
}

/// Kick off loading of the demo character.
///
/// On wasm the slots resolve from a spawned future after the current task
/// yields; natively they are ready by the time this returns.
pub fn load_character() -> CharacterAssets {
    let assets = CharacterAssets::pending();

    #[cfg(target_arch = "wasm32")]
    {
        let pending = assets.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let tick = js_sys::Promise::resolve(&wasm_bindgen::JsValue::NULL);
            if let Err(e) = wasm_bindgen_futures::JsFuture::from(tick).await {
                pending.mesh.fail(format!("{e:?}"));
                return;
            }
            resolve_procedural(&pending);
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    resolve_procedural(&assets);

    assets
}
