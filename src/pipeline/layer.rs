use std::path::{Path, PathBuf};

use image::{Rgba, imageops::FilterType};

use crate::{
    animation::animator::{AnimValue, Animator},
    foundation::{
        core::{Affine, Frame, Point, RgbaFrame, extent_px, rotated_extent},
        error::{ViewfxError, ViewfxResult},
    },
    geometry::sample::{rotation_about, warp_affine},
    params::value::ParamValue,
    pipeline::{
        composite::composite_at,
        config::StepDecl,
        step::{Step, StepCore},
    },
};

/// Rendered overlay for one `(scale, rotation)` pair.
#[derive(Clone, Debug)]
struct RenderCache {
    scale: f64,
    rotation: f64,
    image: RgbaFrame,
}

/// Composites a secondary image onto the frame at a normalized position with scale,
/// rotation and opacity. Any of those parameters may be declared as an animator.
pub struct LayerStep {
    core: StepCore,
    path: PathBuf,
    source: RgbaFrame,
    animators: Vec<(String, Animator)>,
    cache: Option<RenderCache>,
    renders: u64,
}

impl LayerStep {
    pub fn build(core: StepCore) -> ViewfxResult<Box<dyn Step>> {
        Ok(Box::new(Self::new(core)?))
    }

    pub fn new(mut core: StepCore) -> ViewfxResult<Self> {
        let Some(source) = core.params().get_str("source") else {
            return Err(ViewfxError::validation("Layer: 'source' must be an image path"));
        };
        let path = core.global().input_root.join(source);

        core.default_param("position", vec![0.5, 0.5]);
        core.default_param("scale", 1.0);
        core.default_param("rotation", 0.0);
        core.default_param("opacity", 1.0);
        core.default_param("paused", false);

        let seed = core.global().seed;
        let animated: Vec<_> = core
            .params()
            .iter()
            .filter_map(|(k, v)| match v {
                ParamValue::Animated(cfg) => Some((k.to_owned(), cfg.clone())),
                _ => None,
            })
            .collect();
        let mut animators = Vec::with_capacity(animated.len());
        for (i, (name, cfg)) in animated.into_iter().enumerate() {
            let anim = Animator::new(cfg, seed.wrapping_add(i as u64))
                .map_err(|e| ViewfxError::animation(format!("Layer '{name}': {e}")))?;
            if name == "position" && !matches!(anim.value(), AnimValue::Vector(v) if v.len() == 2) {
                return Err(ViewfxError::validation(format!(
                    "Layer 'position': animator points must be [x, y], got {} value(s)",
                    anim.value().dims()
                )));
            }
            tracing::debug!(param = %name, mode = ?anim.mode(), "layer parameter animated");
            core.params_mut().set(name.as_str(), ParamValue::from(anim.value().clone()));
            animators.push((name, anim));
        }

        if !matches!(core.params().get_list("position"), Some([_, _])) {
            return Err(ViewfxError::validation("Layer: 'position' must be [x, y]"));
        }

        let source = load_overlay(&path)?;
        Ok(Self {
            core,
            path,
            source,
            animators,
            cache: None,
            renders: 0,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.path
    }

    fn position(&self) -> ViewfxResult<(f64, f64)> {
        match self.core.params().get_list("position") {
            Some([x, y]) => Ok((*x, *y)),
            _ => Err(ViewfxError::validation("Layer: 'position' must be [x, y]")),
        }
    }

    fn render(&mut self, scale: f64, rotation: f64) -> &RgbaFrame {
        let hit = self
            .cache
            .as_ref()
            .is_some_and(|c| c.scale == scale && c.rotation == rotation);
        if !hit {
            self.renders += 1;
            self.cache = Some(RenderCache {
                scale,
                rotation,
                image: render_overlay(&self.source, scale, rotation),
            });
        }
        match &self.cache {
            Some(c) => &c.image,
            None => &self.source,
        }
    }
}

fn load_overlay(path: &Path) -> ViewfxResult<RgbaFrame> {
    let img = image::open(path).map_err(|e| {
        ViewfxError::asset(format!("layer source '{}' could not be loaded: {e}", path.display()))
    })?;
    Ok(img.to_rgba8())
}

/// Resize by `scale`, then rotate into a canvas that holds the whole rotated image.
fn render_overlay(source: &RgbaFrame, scale: f64, rotation: f64) -> RgbaFrame {
    let (w, h) = source.dimensions();
    let nw = scaled_px(w, scale);
    let nh = scaled_px(h, scale);
    let resized = if (nw, nh) == (w, h) {
        source.clone()
    } else {
        image::imageops::resize(source, nw, nh, FilterType::Triangle)
    };
    if rotation == 0.0 {
        return resized;
    }
    let (rw, rh) = rotated_extent(f64::from(nw), f64::from(nh), rotation);
    let (cw, ch) = (extent_px(rw), extent_px(rh));
    let (nwf, nhf) = (f64::from(nw), f64::from(nh));
    let m = Affine::translate(((f64::from(cw) - nwf) / 2.0, (f64::from(ch) - nhf) / 2.0))
        * rotation_about(Point::new(nwf / 2.0, nhf / 2.0), rotation);
    warp_affine(&resized, m, cw, ch, Rgba([0, 0, 0, 0]))
}

/// Truncating scale, floored to one pixel.
fn scaled_px(v: u32, scale: f64) -> u32 {
    let s = f64::from(v) * scale;
    if !s.is_finite() || s < 1.0 {
        1
    } else {
        s.min(f64::from(u32::MAX)) as u32
    }
}

impl Step for LayerStep {
    fn core(&self) -> &StepCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StepCore {
        &mut self.core
    }

    fn apply(&mut self, mut frame: Frame) -> ViewfxResult<Frame> {
        if !self.core.bool_param("paused", false) {
            for (name, anim) in &mut self.animators {
                let v = anim.step();
                self.core.params_mut().set(name.as_str(), ParamValue::from(v));
            }
        }

        let scale = self.core.f64_param("scale", 1.0);
        let rotation = self.core.f64_param("rotation", 0.0);
        let opacity = self.core.f64_param("opacity", 1.0).clamp(0.0, 1.0);
        let (px, py) = self.position()?;
        let (fw, fh) = frame.dimensions();

        let overlay = self.render(scale, rotation);
        let (lw, lh) = overlay.dimensions();
        let cx = (px * f64::from(fw)) as i64;
        let cy = (py * f64::from(fh)) as i64;
        let x1 = cx - i64::from(lw / 2);
        let y1 = cy - i64::from(lh / 2);
        composite_at(&mut frame, overlay, x1, y1, opacity);
        Ok(frame)
    }

    /// Animated parameters are written back as their descriptors.
    fn to_decl(&self) -> StepDecl {
        let mut params = self.core.params().clone();
        for (name, anim) in &self.animators {
            params.set(name.as_str(), ParamValue::Animated(anim.config().clone()));
        }
        StepDecl::new(self.core.type_name(), params)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/layer.rs"]
mod tests;
