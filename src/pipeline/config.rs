use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    animation::keyframes::{Keyframe, KeyframeMode},
    foundation::error::{ViewfxError, ViewfxResult},
    geometry::viewport::ViewportState,
    params::store::ParamStore,
    pipeline::output,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// A still image, repeated `max_frames` times.
    #[default]
    Image,
    /// A video file decoded through ffmpeg.
    Video,
    /// A capture device index.
    Live,
}

/// Settings shared by every step and by the session driver.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub input_root: PathBuf,
    pub input_type: InputType,
    pub input_source: String,
    /// Frames per second; 0 disables throttling.
    pub framerate: f64,
    pub output_root: PathBuf,
    pub numbered_files: bool,
    pub save_step_images: bool,
    pub screenshot_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
    /// Default seed for random animators.
    pub seed: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("."),
            input_type: InputType::Image,
            input_source: String::new(),
            framerate: 0.0,
            output_root: PathBuf::from("out"),
            numbered_files: false,
            save_step_images: false,
            screenshot_label: "screenshot".to_owned(),
            max_frames: None,
            seed: 0,
        }
    }
}

impl GlobalConfig {
    /// Path of the configured input, under `input_root`.
    pub fn input_path(&self) -> PathBuf {
        self.input_root.join(&self.input_source)
    }
}

/// `{ "name": ..., "params": {...} }`
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepDecl {
    pub name: String,
    #[serde(default)]
    pub params: ParamStore,
}

impl StepDecl {
    pub fn new(name: impl Into<String>, params: ParamStore) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PipeSource {
    Inline(Vec<StepDecl>),
    File(PathBuf),
}

impl Default for PipeSource {
    fn default() -> Self {
        Self::Inline(Vec::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    pub load_from_file: bool,
    pub pipe: PipeSource,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Initial pose; the whole image when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ViewportState>,
    pub mode: KeyframeMode,
    pub playing: bool,
    pub debug: bool,
    pub keyframes: Vec<Keyframe>,
}

/// The whole application document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AppConfig {
    pub config: GlobalConfig,
    #[serde(default)]
    pub pipe_config: PipeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<ViewportConfig>,
}

impl AppConfig {
    /// Read and resolve a config file; relative paths are taken from its directory.
    pub fn load(path: &Path) -> ViewfxResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&text, base)
    }

    pub fn from_json_str(text: &str, base_dir: &Path) -> ViewfxResult<Self> {
        let mut cfg: Self = serde_json::from_str(text)?;
        cfg.resolve_paths(base_dir);
        Ok(cfg)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.config.input_root);
        resolve(&mut self.config.output_root);
        if let PipeSource::File(p) = &mut self.pipe_config.pipe {
            resolve(p);
        }
    }

    /// Step declarations, reading the pipe file when configured to.
    pub fn step_decls(&self) -> ViewfxResult<Vec<StepDecl>> {
        match (&self.pipe_config.pipe, self.pipe_config.load_from_file) {
            (PipeSource::Inline(steps), false) => Ok(steps.clone()),
            (PipeSource::File(path), true) => load_step_decls(path),
            (PipeSource::Inline(_), true) => Err(ViewfxError::validation(
                "pipe_config.load_from_file is set but pipe is not a path",
            )),
            (PipeSource::File(_), false) => Err(ViewfxError::validation(
                "pipe_config.pipe is a path but load_from_file is not set",
            )),
        }
    }
}

/// Read a JSON array of step declarations.
pub fn load_step_decls(path: &Path) -> ViewfxResult<Vec<StepDecl>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read pipeline file '{}'", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Write step declarations as pretty JSON.
pub fn save_step_decls(path: &Path, decls: &[StepDecl]) -> ViewfxResult<()> {
    output::create_parent_dir(path)?;
    let text = serde_json::to_string_pretty(decls)?;
    std::fs::write(path, text).with_context(|| format!("write pipeline file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
