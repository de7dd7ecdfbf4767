use std::{fmt, str::FromStr};

use image::Rgb;
use imageproc::drawing::draw_line_segment_mut;

use crate::{
    foundation::core::{Frame, Point, Vec2, extent_px, rotated_extent, wrap_degrees},
    foundation::error::{ViewfxError, ViewfxResult},
    geometry::sample::{rect_sub_pix, rotation_about, transpose, warp_affine},
};

/// Viewport pose as `[x, y, w, h, angle]` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 5]")]
pub struct ViewportState {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Degrees, clockwise on screen.
    pub angle: f64,
}

impl ViewportState {
    pub fn new(x: f64, y: f64, w: f64, h: f64, angle: f64) -> Self {
        Self { x, y, w, h, angle }
    }

    /// Parse a 5-element `[x, y, w, h, angle]` slice.
    pub fn from_slice(values: &[f64]) -> ViewfxResult<Self> {
        let [x, y, w, h, angle] = values else {
            return Err(ViewfxError::validation(format!(
                "viewport state needs 5 values [x, y, w, h, angle], got {}",
                values.len()
            )));
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ViewfxError::validation("viewport state values must be finite"));
        }
        Ok(Self::new(*x, *y, *w, *h, *angle))
    }

    pub fn to_array(self) -> [f64; 5] {
        [self.x, self.y, self.w, self.h, self.angle]
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(300.0, 300.0, 300.0, 300.0, 0.0)
    }
}

impl TryFrom<Vec<f64>> for ViewportState {
    type Error = ViewfxError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<ViewportState> for [f64; 5] {
    fn from(state: ViewportState) -> Self {
        state.to_array()
    }
}

impl fmt::Display for ViewportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.0}, {:.0}, {:.1}]",
            self.x, self.y, self.w, self.h, self.angle
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = ViewfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(ViewfxError::validation(format!(
                "unknown move direction '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoveMode {
    /// Move along the image axes and clamp immediately.
    #[default]
    Absolute,
    /// Move along the viewport's own rotated axes; clamped on the next update.
    Relative,
}

impl FromStr for MoveMode {
    type Err = ViewfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "relative" => Ok(Self::Relative),
            other => Err(ViewfxError::validation(format!("unknown move mode '{other}'"))),
        }
    }
}

/// Per-update drift applied before clamping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64,
    pub da: f64,
}

/// Geometry of the last update, for debug drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugOverlay {
    /// Axis-aligned bounding box corners, clockwise from top-left.
    pub bounds: [Point; 4],
    /// Rotated view corners, clockwise from the view's top-left.
    pub corners: [Point; 4],
    /// Center to the middle of the view's top edge.
    pub heading: (Point, Point),
}

const BOUNDS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const VIEW_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const HEADING_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// A rotatable, movable rectangular window over a source image.
#[derive(Clone, Debug)]
pub struct Viewport {
    image_w: u32,
    image_h: u32,
    x: f64,
    y: f64,
    w: u32,
    h: u32,
    angle: f64,
    rw: f64,
    rh: f64,
    velocity: Velocity,
    view: Frame,
    debug: bool,
    overlay: Option<DebugOverlay>,
}

impl Viewport {
    pub fn new(image_w: u32, image_h: u32, state: ViewportState) -> Self {
        let mut vp = Self {
            image_w,
            image_h,
            x: 0.0,
            y: 0.0,
            w: 1,
            h: 1,
            angle: 0.0,
            rw: 1.0,
            rh: 1.0,
            velocity: Velocity::default(),
            view: Frame::new(1, 1),
            debug: false,
            overlay: None,
        };
        vp.apply_state(state);
        vp
    }

    /// Viewport covering the whole image, unrotated.
    pub fn for_image(image_w: u32, image_h: u32) -> Self {
        let mut vp = Self::new(image_w, image_h, ViewportState::default());
        vp.reset();
        vp
    }

    /// Apply velocity, clamp the center so the rotated box stays inside the image, and
    /// resample the view from `source`.
    #[tracing::instrument(level = "trace", skip(self, source))]
    pub fn update(&mut self, source: &Frame) -> ViewfxResult<()> {
        let (iw, ih) = source.dimensions();
        if iw == 0 || ih == 0 {
            return Err(ViewfxError::evaluation("viewport source frame is empty"));
        }
        self.image_w = iw;
        self.image_h = ih;

        self.x += self.velocity.dx;
        self.y += self.velocity.dy;
        self.angle = wrap_degrees(self.angle + self.velocity.da);
        self.refresh_extent();
        if ![self.x, self.y, self.angle, self.rw, self.rh].iter().all(|v| v.is_finite()) {
            return Err(ViewfxError::evaluation(format!(
                "viewport pose is not finite: {}",
                self.state()
            )));
        }
        self.x = clamp_axis(self.x, self.rw, f64::from(iw));
        self.y = clamp_axis(self.y, self.rh, f64::from(ih));

        self.view = self.extract(source);
        self.overlay = self.debug.then(|| self.compute_overlay());
        Ok(())
    }

    fn extract(&self, source: &Frame) -> Frame {
        let (bw, bh) = (extent_px(self.rw), extent_px(self.rh));
        let boxed = rect_sub_pix(source, bw, bh, Point::new(self.x, self.y));
        let box_center = Point::new(f64::from(bw) / 2.0, f64::from(bh) / 2.0);

        let (sin, cos) = self.angle.to_radians().sin_cos();
        // Near-vertical headings unrotate by a further quarter turn and transpose, which keeps
        // the resampling rotation under 45 degrees.
        let transposed = sin.abs() > cos.abs();
        let undo = if transposed { self.angle + 90.0 } else { self.angle };
        let upright = if undo == 0.0 {
            boxed
        } else {
            warp_affine(&boxed, rotation_about(box_center, undo), bw, bh, Rgb([0, 0, 0]))
        };

        if transposed {
            let crop = rect_sub_pix(&upright, self.h, self.w, box_center);
            image::imageops::flip_horizontal(&transpose(&crop))
        } else {
            rect_sub_pix(&upright, self.w, self.h, box_center)
        }
    }

    fn refresh_extent(&mut self) {
        let (rw, rh) = rotated_extent(f64::from(self.w), f64::from(self.h), self.angle);
        self.rw = rw;
        self.rh = rh;
    }

    /// Unit vectors for the view's up and right directions in image space.
    fn axes(&self) -> (Vec2, Vec2) {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        (Vec2::new(sin, -cos), Vec2::new(cos, sin))
    }

    fn compute_overlay(&self) -> DebugOverlay {
        let c = Point::new(self.x, self.y);
        let (hw, hh) = (self.rw / 2.0, self.rh / 2.0);
        let bounds = [
            Point::new(c.x - hw, c.y - hh),
            Point::new(c.x + hw, c.y - hh),
            Point::new(c.x + hw, c.y + hh),
            Point::new(c.x - hw, c.y + hh),
        ];
        let (up, right) = self.axes();
        let (vw, vh) = (f64::from(self.w) / 2.0, f64::from(self.h) / 2.0);
        let corners = [
            c + up * vh - right * vw,
            c + up * vh + right * vw,
            c - up * vh + right * vw,
            c - up * vh - right * vw,
        ];
        DebugOverlay {
            bounds,
            corners,
            heading: (c, c + up * vh),
        }
    }

    /// Move by `step` pixels.
    pub fn translate(&mut self, direction: Direction, step: f64, mode: MoveMode) {
        match mode {
            MoveMode::Absolute => {
                let (iw, ih) = (f64::from(self.image_w), f64::from(self.image_h));
                match direction {
                    Direction::Up => self.y = clamp_axis(self.y - step, self.rh, ih),
                    Direction::Down => self.y = clamp_axis(self.y + step, self.rh, ih),
                    Direction::Left => self.x = clamp_axis(self.x - step, self.rw, iw),
                    Direction::Right => self.x = clamp_axis(self.x + step, self.rw, iw),
                }
            }
            MoveMode::Relative => {
                let (up, right) = self.axes();
                let delta = match direction {
                    Direction::Up => up * step,
                    Direction::Down => -up * step,
                    Direction::Left => -right * step,
                    Direction::Right => right * step,
                };
                self.x += delta.x;
                self.y += delta.y;
            }
        }
    }

    /// String-keyed [`Viewport::translate`]; unknown names leave the viewport untouched.
    pub fn translate_named(&mut self, direction: &str, step: f64, mode: &str) -> ViewfxResult<()> {
        let direction = direction.parse::<Direction>();
        let mode = mode.parse::<MoveMode>();
        match (direction, mode) {
            (Ok(d), Ok(m)) => {
                self.translate(d, step, m);
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "ignoring viewport move");
                Err(e)
            }
        }
    }

    /// Full-image, unrotated, centered.
    pub fn reset(&mut self) {
        self.velocity = Velocity::default();
        self.apply_state(ViewportState::new(
            f64::from(self.image_w) / 2.0,
            f64::from(self.image_h) / 2.0,
            f64::from(self.image_w),
            f64::from(self.image_h),
            0.0,
        ));
    }

    /// Zero the velocity.
    pub fn stop(&mut self) {
        self.velocity = Velocity::default();
    }

    /// Add to the current velocity.
    pub fn nudge(&mut self, dx: f64, dy: f64, da: f64) -> ViewfxResult<()> {
        if ![dx, dy, da].iter().all(|v| v.is_finite()) {
            return Err(ViewfxError::validation(format!(
                "viewport velocity must be finite, got ({dx}, {dy}, {da})"
            )));
        }
        self.velocity.dx += dx;
        self.velocity.dy += dy;
        self.velocity.da += da;
        Ok(())
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Multiply the view size, keeping the center.
    pub fn scale(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            tracing::warn!(factor, "ignoring non-positive viewport scale");
            return;
        }
        let mut state = self.state();
        state.w *= factor;
        state.h *= factor;
        self.apply_state(state);
    }

    /// Grow or shrink the view by whole pixels.
    pub fn resize(&mut self, dw: i64, dh: i64) {
        let mut state = self.state();
        state.w += dw as f64;
        state.h += dh as f64;
        self.apply_state(state);
    }

    pub fn state(&self) -> ViewportState {
        ViewportState::new(self.x, self.y, f64::from(self.w), f64::from(self.h), self.angle)
    }

    pub fn set_state(&mut self, state: ViewportState) -> ViewfxResult<()> {
        if !state.to_array().iter().all(|v| v.is_finite()) {
            return Err(ViewfxError::validation("viewport state values must be finite"));
        }
        self.apply_state(state);
        Ok(())
    }

    /// [`Viewport::set_state`] from a raw `[x, y, w, h, angle]` slice.
    pub fn set_state_slice(&mut self, values: &[f64]) -> ViewfxResult<()> {
        self.set_state(ViewportState::from_slice(values)?)
    }

    fn apply_state(&mut self, state: ViewportState) {
        self.x = state.x;
        self.y = state.y;
        self.w = whole_px(state.w);
        self.h = whole_px(state.h);
        self.angle = wrap_degrees(state.angle);
        self.refresh_extent();
    }

    /// Latest extracted view (`w x h`).
    pub fn view(&self) -> &Frame {
        &self.view
    }

    pub fn rotated_extent(&self) -> (f64, f64) {
        (self.rw, self.rh)
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_w, self.image_h)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        if !debug {
            self.overlay = None;
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn overlay(&self) -> Option<&DebugOverlay> {
        self.overlay.as_ref()
    }

    /// Copy of `source` with the bounding box, view outline and heading drawn on it.
    pub fn draw_overlay(&self, source: &Frame) -> Frame {
        let mut canvas = source.clone();
        let overlay = self.overlay.clone().unwrap_or_else(|| self.compute_overlay());
        draw_polygon(&mut canvas, &overlay.bounds, BOUNDS_COLOR);
        draw_polygon(&mut canvas, &overlay.corners, VIEW_COLOR);
        let (from, to) = overlay.heading;
        draw_line_segment_mut(
            &mut canvas,
            (from.x as f32, from.y as f32),
            (to.x as f32, to.y as f32),
            HEADING_COLOR,
        );
        canvas
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewport {} over {}x{}", self.state(), self.image_w, self.image_h)
    }
}

fn draw_polygon(canvas: &mut Frame, points: &[Point; 4], color: Rgb<u8>) {
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_line_segment_mut(canvas, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
    }
}

/// Keep a box of `extent` centered at `v` inside `[0, limit]`; oversized boxes pin to the middle.
fn clamp_axis(v: f64, extent: f64, limit: f64) -> f64 {
    if !extent.is_finite() {
        return v;
    }
    let half = extent / 2.0;
    if extent >= limit {
        limit / 2.0
    } else {
        v.clamp(half, limit - half)
    }
}

fn whole_px(v: f64) -> u32 {
    if !v.is_finite() || v < 1.0 {
        return 1;
    }
    v.round().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/viewport.rs"]
mod tests;
