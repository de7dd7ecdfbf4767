use crate::{
    animation::ease::Ease,
    foundation::error::{ViewfxError, ViewfxResult},
    foundation::math::{Rng64, euclidean},
};

/// Rejected draws before a random leg falls back to the farthest corner of the bounds.
const MAX_RANDOM_DRAWS: usize = 1000;

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

/// A value an [`Animator`] can produce: a scalar or a fixed-length numeric tuple.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AnimValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl AnimValue {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::Vector(v) => v,
        }
    }

    pub fn dims(&self) -> usize {
        self.as_slice().len()
    }

    fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(_), Self::Scalar(_)) => true,
            (Self::Vector(a), Self::Vector(b)) => a.len() == b.len(),
            _ => false,
        }
    }

    fn like(template: &Self, coords: Vec<f64>) -> Self {
        match template {
            Self::Scalar(_) => Self::Scalar(coords.first().copied().unwrap_or(0.0)),
            Self::Vector(_) => Self::Vector(coords),
        }
    }
}

impl Lerp for AnimValue {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        match (a, b) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f64::lerp(a, b, t)),
            _ => Self::Vector(
                a.as_slice()
                    .iter()
                    .zip(b.as_slice())
                    .map(|(x, y)| f64::lerp(x, y, t))
                    .collect(),
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimMode {
    /// Always the first point.
    #[default]
    Static,
    /// Cycle through `points` in order, wrapping back to the first.
    Waypoints,
    /// Travel between freshly drawn random targets inside `bounds`.
    Random,
}

fn default_points() -> Vec<AnimValue> {
    vec![AnimValue::Scalar(0.0)]
}

fn default_speed() -> f64 {
    1.0
}

/// Declarative animator descriptor as it appears in a step's parameter map.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimatorConfig {
    pub mode: AnimMode,
    #[serde(default = "default_points")]
    pub points: Vec<AnimValue>,
    /// Steps per segment.
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub interpolation: Ease,
    /// `[[min...], [max...]]` for random targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl AnimatorConfig {
    pub fn new(mode: AnimMode, points: Vec<AnimValue>) -> Self {
        Self {
            mode,
            points,
            speed: default_speed(),
            interpolation: Ease::Linear,
            bounds: None,
            min_distance: None,
            seed: None,
        }
    }
}

/// Time-driven generator for one parameter. Call [`Animator::step`] once per tick.
#[derive(Clone, Debug)]
pub struct Animator {
    config: AnimatorConfig,
    points: Vec<AnimValue>,
    increment: f64,
    index: usize,
    t: f64,
    value: AnimValue,
    lo: Vec<f64>,
    hi: Vec<f64>,
    min_distance: f64,
    rng: Rng64,
}

impl Animator {
    /// Validate a descriptor and build its animator. `default_seed` is used when the
    /// descriptor has no `seed` of its own.
    pub fn new(config: AnimatorConfig, default_seed: u64) -> ViewfxResult<Self> {
        let Some(first) = config.points.first() else {
            return Err(ViewfxError::animation("animator needs at least one point"));
        };
        if first.dims() == 0 {
            return Err(ViewfxError::animation("animator points must not be empty lists"));
        }
        if !config.points.iter().all(|p| p.same_shape(first)) {
            return Err(ViewfxError::animation(
                "animator points must all have the same shape",
            ));
        }
        if config
            .points
            .iter()
            .flat_map(|p| p.as_slice().iter())
            .any(|v| !v.is_finite())
        {
            return Err(ViewfxError::animation("animator points must be finite"));
        }
        if !config.speed.is_finite() {
            return Err(ViewfxError::animation("animator speed must be finite"));
        }

        let dims = first.dims();
        let (lo, hi) = match &config.bounds {
            None => (vec![0.1; dims], vec![0.9; dims]),
            Some(b) => {
                if b.len() != 2 || b[0].len() != dims || b[1].len() != dims {
                    return Err(ViewfxError::animation(format!(
                        "animator bounds must be [[min x{dims}], [max x{dims}]]"
                    )));
                }
                let lo = b[0].iter().zip(&b[1]).map(|(a, b)| a.min(*b)).collect();
                let hi = b[0].iter().zip(&b[1]).map(|(a, b)| a.max(*b)).collect();
                (lo, hi)
            }
        };
        let min_distance = config.min_distance.unwrap_or(0.2);
        if !min_distance.is_finite() || min_distance < 0.0 {
            return Err(ViewfxError::animation(
                "animator min_distance must be finite and >= 0",
            ));
        }

        let mut points = config.points.clone();
        let mut rng = Rng64::new(config.seed.unwrap_or(default_seed));

        if config.mode == AnimMode::Random {
            let half_diagonal = euclidean(&lo, &hi) / 2.0;
            if min_distance > half_diagonal {
                return Err(ViewfxError::animation(format!(
                    "animator min_distance {min_distance} exceeds half the bounds diagonal ({half_diagonal})"
                )));
            }
            points.truncate(2);
            if points.len() < 2 {
                let target = draw_target(&mut rng, &points[0], &lo, &hi, min_distance);
                points.push(target);
            }
        }

        let value = points[0].clone();
        Ok(Self {
            increment: 1.0 / config.speed.max(1.0),
            config,
            points,
            index: 0,
            t: 0.0,
            value,
            lo,
            hi,
            min_distance,
            rng,
        })
    }

    /// Advance one tick and return the new value.
    pub fn step(&mut self) -> AnimValue {
        match self.config.mode {
            AnimMode::Static => {}
            AnimMode::Waypoints => {
                if self.advance() {
                    self.index = (self.index + 1) % self.points.len();
                    tracing::debug!(index = self.index, "animator reached waypoint");
                }
                let n = self.points.len();
                let a = &self.points[self.index];
                let b = &self.points[(self.index + 1) % n];
                self.value = AnimValue::lerp(a, b, self.config.interpolation.apply(self.t));
            }
            AnimMode::Random => {
                if self.advance() {
                    let retired = self.points[1].clone();
                    let next = draw_target(
                        &mut self.rng,
                        &retired,
                        &self.lo,
                        &self.hi,
                        self.min_distance,
                    );
                    tracing::debug!(target = ?next.as_slice(), "animator drew random target");
                    self.points[0] = retired;
                    self.points[1] = next;
                }
                self.value = AnimValue::lerp(
                    &self.points[0],
                    &self.points[1],
                    self.config.interpolation.apply(self.t),
                );
            }
        }
        self.value.clone()
    }

    fn advance(&mut self) -> bool {
        self.t += self.increment;
        if self.t >= 1.0 {
            self.t = 0.0;
            true
        } else {
            false
        }
    }

    /// Most recent output (the first point before any step).
    pub fn value(&self) -> &AnimValue {
        &self.value
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn mode(&self) -> AnimMode {
        self.config.mode
    }

    /// Progress within the current leg, in `[0, 1)`.
    pub fn progress(&self) -> f64 {
        self.t
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Current leg endpoints for random mode (start, target).
    pub fn leg(&self) -> (&AnimValue, &AnimValue) {
        let n = self.points.len();
        (&self.points[0], &self.points[1 % n])
    }

    pub fn bounds(&self) -> (&[f64], &[f64]) {
        (&self.lo, &self.hi)
    }
}

fn draw_target(
    rng: &mut Rng64,
    previous: &AnimValue,
    lo: &[f64],
    hi: &[f64],
    min_distance: f64,
) -> AnimValue {
    let prev = previous.as_slice();
    for _ in 0..MAX_RANDOM_DRAWS {
        let candidate: Vec<f64> = lo.iter().zip(hi).map(|(l, h)| rng.uniform(*l, *h)).collect();
        if euclidean(&candidate, prev) >= min_distance {
            return AnimValue::like(previous, candidate);
        }
    }
    // The farthest corner is at least half a diagonal away from any point.
    let corner = lo
        .iter()
        .zip(hi)
        .zip(prev)
        .map(|((l, h), p)| if (p - l).abs() >= (h - p).abs() { *l } else { *h })
        .collect();
    AnimValue::like(previous, corner)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
