use std::{fmt, path::Path, sync::Arc, time::Instant};

use crate::{
    foundation::{core::Frame, error::ViewfxResult},
    params::value::{EditDirection, ParamValue},
    pipeline::{
        config::{GlobalConfig, StepDecl, save_step_decls},
        registry::StepRegistry,
        step::Step,
    },
    session::Profiler,
};

/// Edit multipliers cycled by [`Pipeline::cycle_multiplier`].
pub const PARAM_MULTIPLIERS: [u32; 4] = [1, 5, 10, 100];

/// Ordered steps plus the interactive selection cursor used by live tooling.
pub struct Pipeline {
    global: Arc<GlobalConfig>,
    steps: Vec<Box<dyn Step>>,
    selected_step: usize,
    selected_param: usize,
    multiplier_index: usize,
}

impl Pipeline {
    pub fn new(global: Arc<GlobalConfig>) -> Self {
        Self {
            global,
            steps: Vec::new(),
            selected_step: 0,
            selected_param: 0,
            multiplier_index: 0,
        }
    }

    /// Build every declared step. Any construction failure aborts the load.
    pub fn from_decls(
        registry: &StepRegistry,
        global: Arc<GlobalConfig>,
        decls: &[StepDecl],
    ) -> ViewfxResult<Self> {
        let mut pipeline = Self::new(global);
        for decl in decls {
            let mut step = registry.create(&decl.name, pipeline.global.clone(), decl.params.clone())?;
            step.core_mut().set_verbose(true);
            tracing::info!("{}", step.describe());
            pipeline.steps.push(step);
        }
        tracing::info!(steps = pipeline.steps.len(), "pipeline loaded");
        Ok(pipeline)
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn Step> {
        self.steps.iter().map(|s| s.as_ref())
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut (dyn Step + 'static)> {
        self.steps.get_mut(index).map(|s| s.as_mut())
    }

    pub fn push(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Step>> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Move the step at `from` so it ends up at `to`.
    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        if from >= self.steps.len() || to >= self.steps.len() {
            return false;
        }
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        true
    }

    /// Run every enabled step in order. `save_outputs` lets steps write their `output_file`.
    pub fn run_frame(&mut self, frame: Frame, save_outputs: bool) -> ViewfxResult<Frame> {
        self.run_frame_profiled(frame, save_outputs, None)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(steps = self.steps.len()))]
    pub fn run_frame_profiled(
        &mut self,
        mut frame: Frame,
        save_outputs: bool,
        mut profiler: Option<&mut Profiler>,
    ) -> ViewfxResult<Frame> {
        for (index, step) in self.steps.iter_mut().enumerate() {
            if !step.is_enabled() {
                continue;
            }
            let started = Instant::now();
            frame = step.apply(frame)?;
            if save_outputs {
                step.save_output(
                    &self.global.output_root,
                    &frame,
                    self.global.numbered_files,
                );
            }
            if let Some(p) = profiler.as_deref_mut() {
                p.record_step(index, step.type_name(), started.elapsed());
            }
        }
        Ok(frame)
    }

    pub fn to_decls(&self) -> Vec<StepDecl> {
        self.steps.iter().map(|s| s.to_decl()).collect()
    }

    pub fn save_decls(&self, path: &Path) -> ViewfxResult<()> {
        save_step_decls(path, &self.to_decls())?;
        tracing::info!(path = %path.display(), "pipeline saved");
        Ok(())
    }

    /// Edit one step's parameter; failures are logged and returned, state is unchanged.
    pub fn edit_parameter(
        &mut self,
        index: usize,
        name: &str,
        direction: EditDirection,
        multiplier: u32,
    ) -> ViewfxResult<()> {
        let Some(step) = self.steps.get_mut(index) else {
            let err = crate::foundation::error::ViewfxError::validation(format!(
                "no step at index {index}"
            ));
            tracing::warn!(error = %err, "ignoring parameter edit");
            return Err(err);
        };
        step.edit_parameter(name, direction, multiplier).inspect_err(|err| {
            tracing::warn!(step = step.type_name(), param = name, error = %err, "ignoring parameter edit");
        })
    }

    /// Move the step cursor by `delta` (wrapping) and reset the parameter cursor.
    pub fn select_step(&mut self, delta: i64) -> Option<&dyn Step> {
        if self.steps.is_empty() {
            return None;
        }
        self.selected_step = wrap_index(self.selected_step, delta, self.steps.len());
        self.selected_param = 0;
        self.steps.get(self.selected_step).map(|s| s.as_ref())
    }

    /// Move the parameter cursor within the selected step.
    pub fn select_param(&mut self, delta: i64) -> Option<(&str, &ParamValue)> {
        let step = self.steps.get(self.selected_step)?;
        let count = step.params().len();
        if count == 0 {
            return None;
        }
        self.selected_param = wrap_index(self.selected_param, delta, count);
        step.params().entry_at(self.selected_param)
    }

    /// Currently selected `(step, parameter name)`.
    pub fn selection(&self) -> Option<(usize, &str)> {
        let step = self.steps.get(self.selected_step)?;
        let (name, _) = step.params().entry_at(self.selected_param)?;
        Some((self.selected_step, name))
    }

    pub fn multiplier(&self) -> u32 {
        PARAM_MULTIPLIERS[self.multiplier_index]
    }

    pub fn cycle_multiplier(&mut self) -> u32 {
        self.multiplier_index = (self.multiplier_index + 1) % PARAM_MULTIPLIERS.len();
        self.multiplier()
    }

    /// Edit the selected parameter by the current multiplier.
    pub fn edit_selected(&mut self, direction: EditDirection) -> ViewfxResult<()> {
        let Some((index, name)) = self.selection().map(|(i, n)| (i, n.to_owned())) else {
            return Ok(());
        };
        let multiplier = self.multiplier();
        self.edit_parameter(index, &name, direction, multiplier)
    }

    /// Flip `enabled` on the selected step, returning the new state.
    pub fn toggle_selected(&mut self) -> Option<bool> {
        let step = self.steps.get_mut(self.selected_step)?;
        let enabled = !step.is_enabled();
        step.set_enabled(enabled);
        tracing::info!(step = step.type_name(), enabled, "step toggled");
        Some(enabled)
    }
}

fn wrap_index(current: usize, delta: i64, len: usize) -> usize {
    let len = len as i64;
    (current as i64 + delta).rem_euclid(len) as usize
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step.describe())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/runner.rs"]
mod tests;
