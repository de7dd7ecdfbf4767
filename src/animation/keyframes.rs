use std::fmt;

use crate::{
    foundation::core::wrap_degrees,
    foundation::error::{ViewfxError, ViewfxResult},
    geometry::viewport::ViewportState,
};

fn default_steps() -> u32 {
    1
}

/// A viewport pose plus the number of steps spent travelling *into* it from the previous one.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub state: ViewportState,
    #[serde(default = "default_steps")]
    pub steps: u32,
}

impl Keyframe {
    pub fn new(state: ViewportState, steps: u32) -> Self {
        Self {
            state,
            steps: steps.max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyframeMode {
    /// Hold each keyframe for its window, then snap to the next.
    Jump,
    /// Blend linearly between consecutive keyframes.
    #[default]
    Interpolate,
}

/// Looping keyframe player for the viewport pose.
#[derive(Clone, Debug, Default)]
pub struct ViewportAnimator {
    keyframes: Vec<Keyframe>,
    mode: KeyframeMode,
    playing: bool,
    current_step: u64,
}

impl ViewportAnimator {
    pub fn new(mode: KeyframeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_keyframes(mode: KeyframeMode, keyframes: Vec<Keyframe>) -> Self {
        let mut anim = Self::new(mode);
        for kf in keyframes {
            anim.add_state(kf.state, kf.steps);
        }
        anim
    }

    /// Append a keyframe; `steps` below 1 becomes 1.
    pub fn add_state(&mut self, state: ViewportState, steps: u32) {
        self.keyframes.push(Keyframe::new(state, steps));
    }

    /// [`ViewportAnimator::add_state`] from a raw `[x, y, w, h, angle]` slice.
    pub fn add_state_slice(&mut self, values: &[f64], steps: u32) -> ViewfxResult<()> {
        self.add_state(ViewportState::from_slice(values)?, steps);
        Ok(())
    }

    /// Pose for the current step, then advance. `None` while paused or without keyframes.
    pub fn update(&mut self) -> Option<ViewportState> {
        let total = self.total_steps();
        if !self.playing || total == 0 {
            return None;
        }
        let n = self.keyframes.len();
        let pos = self.current_step % total;

        // Keyframe i owns the window of its own `steps`; progress toward the next one is
        // measured in the next keyframe's steps and saturates at 1.
        let mut offset = pos;
        let mut index = 0;
        for (i, kf) in self.keyframes.iter().enumerate() {
            let len = u64::from(kf.steps);
            if offset < len {
                index = i;
                break;
            }
            offset -= len;
        }
        let a = self.keyframes[index];
        let b = self.keyframes[(index + 1) % n];

        let state = match self.mode {
            KeyframeMode::Jump => a.state,
            KeyframeMode::Interpolate => {
                let t = (offset as f64 / f64::from(b.steps)).min(1.0);
                blend(a.state, b.state, t)
            }
        };

        self.current_step = (pos + 1) % total;
        Some(state)
    }

    pub fn playpause(&mut self) {
        self.playing = !self.playing;
        tracing::info!(playing = self.playing, "viewport animation toggled");
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stop, rewind, and drop all keyframes.
    pub fn reset(&mut self) {
        self.playing = false;
        self.current_step = 0;
        self.keyframes.clear();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            KeyframeMode::Jump => KeyframeMode::Interpolate,
            KeyframeMode::Interpolate => KeyframeMode::Jump,
        };
    }

    pub fn mode(&self) -> KeyframeMode {
        self.mode
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    /// Length of one loop.
    pub fn total_steps(&self) -> u64 {
        self.keyframes.iter().map(|k| u64::from(k.steps)).sum()
    }

    /// Keyframes serialized as `[{"state": [...], "steps": n}, ...]`.
    pub fn to_json(&self) -> ViewfxResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.keyframes)?)
    }

    pub fn from_json(mode: KeyframeMode, value: serde_json::Value) -> ViewfxResult<Self> {
        let keyframes: Vec<Keyframe> = serde_json::from_value(value)
            .map_err(|e| ViewfxError::animation(format!("invalid keyframes: {e}")))?;
        Ok(Self::with_keyframes(mode, keyframes))
    }
}

impl fmt::Display for ViewportAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "viewport animator ({:?}, {}, step {}/{})",
            self.mode,
            if self.playing { "playing" } else { "paused" },
            self.current_step,
            self.total_steps()
        )?;
        for (i, kf) in self.keyframes.iter().enumerate() {
            writeln!(f, "  {i}: {} x{}", kf.state, kf.steps)?;
        }
        Ok(())
    }
}

fn blend(a: ViewportState, b: ViewportState, t: f64) -> ViewportState {
    let lerp = |x: f64, y: f64| x + (y - x) * t;
    ViewportState {
        x: lerp(a.x, b.x),
        y: lerp(a.y, b.y),
        w: lerp(a.w, b.w),
        h: lerp(a.h, b.h),
        angle: wrap_degrees(a.angle + shortest_arc(a.angle, b.angle) * t),
    }
}

/// Signed rotation from `from` to `to` along the shorter way round.
fn shortest_arc(from: f64, to: f64) -> f64 {
    let delta = to - from;
    if delta.abs() > 180.0 {
        -delta.signum() * (360.0 - delta.abs())
    } else {
        delta
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
