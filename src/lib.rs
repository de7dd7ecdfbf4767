//! viewfx is a live, frame-by-frame effects pipeline.
//!
//! Frames from an image, video or capture device pass through an optional rotating
//! [`Viewport`] (driven by a keyframed [`ViewportAnimator`]) and then through an ordered
//! [`Pipeline`] of runtime-editable [`Step`]s, before being saved or recorded.
//!
//! - Describe a run with an [`AppConfig`] JSON document
//! - Build steps through a [`StepRegistry`]
//! - Drive frames with a [`Session`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod geometry;
pub(crate) mod io;
pub(crate) mod params;
pub(crate) mod pipeline;
/// Per-frame driver and profiler.
pub mod session;

pub use crate::foundation::core::{
    Affine, Frame, FrameIndex, Point, Rect, RgbaFrame, Vec2, extent_px, rotated_extent,
    wrap_degrees,
};
pub use crate::foundation::error::{ViewfxError, ViewfxResult};
pub use crate::foundation::math::Rng64;

pub use crate::animation::animator::{AnimMode, AnimValue, Animator, AnimatorConfig, Lerp};
pub use crate::animation::ease::Ease;
pub use crate::animation::keyframes::{Keyframe, KeyframeMode, ViewportAnimator};

pub use crate::geometry::sample::{Image8, rect_sub_pix, rotation_about, transpose, warp_affine};
pub use crate::geometry::viewport::{
    DebugOverlay, Direction, MoveMode, Velocity, Viewport, ViewportState,
};

pub use crate::params::store::{ParamStore, RESERVED_TAIL};
pub use crate::params::value::{EditDirection, ParamValue};

pub use crate::io::record::{RecordConfig, Recorder, ffmpeg_version, fit_to_canvas};
pub use crate::io::source::{FrameSource, ImageSource, Throttle, Throttled, open_source};

pub use crate::pipeline::blur::{gaussian_blur, sigma_for_ksize};
pub use crate::pipeline::composite::{Clip, clip, composite_at, over};
pub use crate::pipeline::config::{
    AppConfig, GlobalConfig, InputType, PipeConfig, PipeSource, StepDecl, ViewportConfig,
    load_step_decls, save_step_decls,
};
pub use crate::pipeline::filters::{
    BlurStep, BorderStep, BrightnessContrastStep, ColorConvertStep, ColorSpace, ColorizeStep,
    Colormap, GaussianBlurStep, ResizeStep, ThresholdStep, TileStep, luma, resize_image,
};
pub use crate::pipeline::layer::LayerStep;
pub use crate::pipeline::output::{save_frame, unique_output_path, write_frame};
pub use crate::pipeline::registry::{StepCtor, StepRegistry};
pub use crate::pipeline::runner::{PARAM_MULTIPLIERS, Pipeline};
pub use crate::pipeline::step::{Step, StepCore};

pub use crate::session::{Profiler, Session};

#[cfg(feature = "media-ffmpeg")]
pub use crate::io::source::ffmpeg::FfmpegSource;
