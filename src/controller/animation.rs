use crate::model::AnimationClip;

/// High-level animation states the player can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Walk,
    Jump,
}

impl AnimationState {
    pub fn clip_name(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walk => "walk",
            AnimationState::Jump => "jump",
        }
    }

    /// Priority: airborne beats moving beats standing still.
    pub fn select(is_jumping: bool, has_move_input: bool) -> Self {
        if is_jumping {
            AnimationState::Jump
        } else if has_move_input {
            AnimationState::Walk
        } else {
            AnimationState::Idle
        }
    }
}

#[derive(Debug, Clone)]
struct Action {
    clip: AnimationClip,
    time: f32,
    weight: f32,
    target_weight: f32,
    /// Weight change per second while fading.
    fade_rate: f32,
    playing: bool,
}

impl Action {
    fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            weight: 0.0,
            target_weight: 0.0,
            fade_rate: 0.0,
            playing: false,
        }
    }

    fn fade_to(&mut self, target: f32, duration: f32) {
        self.target_weight = target;
        if duration <= 0.0 {
            self.weight = target;
            self.fade_rate = 0.0;
        } else {
            self.fade_rate = 1.0 / duration;
        }
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }

        self.time += dt;
        let duration = self.clip.duration;
        if duration > 0.0 {
            self.time = if self.clip.looping {
                self.time.rem_euclid(duration)
            } else {
                self.time.min(duration)
            };
        }

        let step = self.fade_rate * dt;
        if self.weight < self.target_weight {
            self.weight = (self.weight + step).min(self.target_weight);
        } else if self.weight > self.target_weight {
            self.weight = (self.weight - step).max(self.target_weight);
        }

        if self.target_weight == 0.0 && self.weight == 0.0 {
            self.playing = false;
        }
    }
}

/// Cross-fading clip player. Drives clip times and blend weights; sampling
/// poses from those is left to whoever renders the skinned mesh.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: Vec<Action>,
    current: Option<AnimationState>,
}

impl AnimationMixer {
    pub fn new(clips: impl IntoIterator<Item = AnimationClip>) -> Self {
        Self {
            actions: clips.into_iter().map(Action::new).collect(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<AnimationState> {
        self.current
    }

    /// Switch to `state`, cross-fading over `fade` seconds.
    ///
    /// Returns false when `state` is already playing or its clip is unknown.
    pub fn play(&mut self, state: AnimationState, fade: f32) -> bool {
        if self.current == Some(state) {
            return false;
        }
        let Some(next) = self.index_of(state.clip_name()) else {
            tracing::debug!(clip = state.clip_name(), "unknown animation clip, ignoring");
            return false;
        };

        if let Some(prev) = self.current.and_then(|s| self.index_of(s.clip_name())) {
            self.actions[prev].fade_to(0.0, fade);
        }

        let action = &mut self.actions[next];
        action.time = 0.0;
        action.weight = 0.0;
        action.playing = true;
        action.fade_to(1.0, fade);

        tracing::debug!(from = ?self.current, to = ?state, "animation switch");
        self.current = Some(state);
        true
    }

    pub fn update(&mut self, dt: f32) {
        for action in &mut self.actions {
            action.advance(dt);
        }
    }

    /// Blend weight of the named clip, 0 if unknown or stopped.
    pub fn weight(&self, clip: &str) -> f32 {
        self.action(clip).map_or(0.0, |a| a.weight)
    }

    /// Playback time of the named clip in seconds.
    pub fn time(&self, clip: &str) -> Option<f32> {
        self.action(clip).map(|a| a.time)
    }

    pub fn is_playing(&self, clip: &str) -> bool {
        self.action(clip).is_some_and(|a| a.playing)
    }

    fn action(&self, clip: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.clip.name == clip)
    }

    fn index_of(&self, clip: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.clip.name == clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer() -> AnimationMixer {
        AnimationMixer::new([
            AnimationClip::new("idle", 2.0, true),
            AnimationClip::new("walk", 1.0, true),
            AnimationClip::new("jump", 0.5, false),
        ])
    }

    #[test]
    fn test_select_priority() {
        assert_eq!(AnimationState::select(true, true), AnimationState::Jump);
        assert_eq!(AnimationState::select(false, true), AnimationState::Walk);
        assert_eq!(AnimationState::select(false, false), AnimationState::Idle);
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut m = mixer();
        assert!(m.play(AnimationState::Idle, 0.2));
        m.update(0.5);
        let t = m.time("idle").unwrap();
        assert!(!m.play(AnimationState::Idle, 0.2));
        assert_eq!(m.time("idle"), Some(t), "replaying must not restart the clip");
    }

    #[test]
    fn test_crossfade() {
        let mut m = mixer();
        m.play(AnimationState::Idle, 0.0);
        assert_eq!(m.weight("idle"), 1.0);

        m.update(0.3);
        m.play(AnimationState::Walk, 0.2);
        assert_eq!(m.time("walk"), Some(0.0));

        m.update(0.1);
        assert!((m.weight("walk") - 0.5).abs() < 1e-5);
        assert!((m.weight("idle") - 0.5).abs() < 1e-5);

        m.update(0.15);
        assert_eq!(m.weight("walk"), 1.0);
        assert_eq!(m.weight("idle"), 0.0);
        assert!(!m.is_playing("idle"), "faded out clip stops");
        assert!(m.is_playing("walk"));
    }

    #[test]
    fn test_unknown_clip_ignored() {
        let mut m = AnimationMixer::new([AnimationClip::new("idle", 1.0, true)]);
        m.play(AnimationState::Idle, 0.0);
        assert!(!m.play(AnimationState::Jump, 0.2));
        assert_eq!(m.current(), Some(AnimationState::Idle));
        assert_eq!(m.weight("idle"), 1.0);
    }

    #[test]
    fn test_clip_time_wraps_or_clamps() {
        let mut m = mixer();
        m.play(AnimationState::Walk, 0.0);
        m.update(1.25);
        assert!((m.time("walk").unwrap() - 0.25).abs() < 1e-5);

        m.play(AnimationState::Jump, 0.0);
        m.update(2.0);
        assert_eq!(m.time("jump"), Some(0.5));
    }
}
