use std::{collections::HashMap, sync::Arc};

use crate::{
    foundation::error::{ViewfxError, ViewfxResult},
    params::store::ParamStore,
    pipeline::{config::GlobalConfig, filters, layer::LayerStep, step::Step, step::StepCore},
};

/// Builds a step from its core (type name, global config, declared params).
pub type StepCtor = Box<dyn Fn(StepCore) -> ViewfxResult<Box<dyn Step>> + Send + Sync>;

/// Name -> constructor table, built once and handed to whatever loads pipelines.
///
/// Registering an existing name replaces the earlier constructor (last registration wins).
/// This keeps plug-in overrides possible but also hides accidental name clashes, so it is
/// logged at `warn` level.
#[derive(Default)]
pub struct StepRegistry {
    ctors: HashMap<String, StepCtor>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in step.
    pub fn with_builtin_steps() -> Self {
        let mut reg = Self::new();
        reg.register("Blur", filters::BlurStep::build);
        reg.register("GaussianBlur", filters::GaussianBlurStep::build);
        reg.register("Threshold", filters::ThresholdStep::build);
        reg.register("Colorize", filters::ColorizeStep::build);
        reg.register("Resize", filters::ResizeStep::build);
        reg.register("Tile", filters::TileStep::build);
        reg.register("Border", filters::BorderStep::build);
        reg.register("BrightnessContrast", filters::BrightnessContrastStep::build);
        reg.register("ColorConvert", filters::ColorConvertStep::build);
        reg.register("Layer", LayerStep::build);
        reg
    }

    /// Associate `name` with `ctor`, returning the constructor it replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F) -> Option<StepCtor>
    where
        F: Fn(StepCore) -> ViewfxResult<Box<dyn Step>> + Send + Sync + 'static,
    {
        let name = name.into();
        let previous = self.ctors.insert(name.clone(), Box::new(ctor));
        if previous.is_some() {
            tracing::warn!(step = %name, "step registered twice; the later registration wins");
        }
        previous
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(
        &self,
        name: &str,
        global: Arc<GlobalConfig>,
        params: ParamStore,
    ) -> ViewfxResult<Box<dyn Step>> {
        let Some(ctor) = self.ctors.get(name) else {
            return Err(ViewfxError::validation(format!("unknown step: {name}")));
        };
        ctor(StepCore::new(name, global, params))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/registry.rs"]
mod tests;
