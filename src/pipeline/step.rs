use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    foundation::{core::Frame, error::ViewfxResult},
    params::{
        store::ParamStore,
        value::{EditDirection, ParamValue},
    },
    pipeline::{config::GlobalConfig, config::StepDecl, output},
};

/// State every step carries: its registered type name, the shared global config, and its
/// parameters.
#[derive(Clone, Debug)]
pub struct StepCore {
    type_name: String,
    global: Arc<GlobalConfig>,
    params: ParamStore,
    verbose: bool,
}

impl StepCore {
    pub fn new(type_name: impl Into<String>, global: Arc<GlobalConfig>, params: ParamStore) -> Self {
        Self {
            type_name: type_name.into(),
            global,
            params,
            verbose: false,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Insert `value` under `name` unless the declaration already set it.
    pub fn default_param(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.params.set_default(name, value);
    }

    pub fn f64_param(&self, name: &str, default: f64) -> f64 {
        self.params.get_f64(name).unwrap_or(default)
    }

    pub fn i64_param(&self, name: &str, default: i64) -> i64 {
        self.params.get_i64(name).unwrap_or(default)
    }

    pub fn bool_param(&self, name: &str, default: bool) -> bool {
        self.params.get_bool(name).unwrap_or(default)
    }
}

/// One per-frame image transformation.
pub trait Step {
    fn core(&self) -> &StepCore;

    fn core_mut(&mut self) -> &mut StepCore;

    /// Transform one frame. Frame size may change between calls.
    fn apply(&mut self, frame: Frame) -> ViewfxResult<Frame>;

    fn type_name(&self) -> &str {
        self.core().type_name()
    }

    fn params(&self) -> &ParamStore {
        self.core().params()
    }

    /// Steps without an `enabled` parameter are enabled.
    fn is_enabled(&self) -> bool {
        self.core().bool_param("enabled", true)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.core_mut().params_mut().set("enabled", enabled);
    }

    fn edit_parameter(
        &mut self,
        name: &str,
        direction: EditDirection,
        multiplier: u32,
    ) -> ViewfxResult<()> {
        self.core_mut().params_mut().edit(name, direction, multiplier)
    }

    /// Write `frame` to the step's `output_file` when one is set and step images are enabled.
    /// Failures are logged, never returned.
    fn save_output(&self, output_root: &Path, frame: &Frame, numbered: bool) -> Option<PathBuf> {
        let core = self.core();
        let file = core.params().get_str("output_file")?;
        if !core.global().save_step_images {
            return None;
        }
        match output::save_frame(output_root, Path::new(file), frame, numbered) {
            Ok(path) => {
                if core.verbose() {
                    tracing::info!(step = core.type_name(), path = %path.display(), "wrote step output");
                }
                Some(path)
            }
            Err(err) => {
                tracing::warn!(step = core.type_name(), file, error = %err, "failed to save step output");
                None
            }
        }
    }

    /// Declaration that rebuilds this step.
    fn to_decl(&self) -> StepDecl {
        StepDecl::new(self.type_name(), self.params().clone())
    }

    /// One-line summary: `[   Name   ][k=v, ...]`.
    fn describe(&self) -> String {
        format!("[{:^20}][{}]", self.type_name(), self.params())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/step.rs"]
mod tests;
