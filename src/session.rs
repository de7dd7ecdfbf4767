use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    animation::keyframes::ViewportAnimator,
    foundation::{core::Frame, core::FrameIndex, error::ViewfxResult},
    geometry::viewport::Viewport,
    io::{
        record::{RecordConfig, Recorder},
        source::{FrameSource, open_source},
    },
    pipeline::{
        config::{AppConfig, GlobalConfig, InputType, ViewportConfig},
        output,
        registry::StepRegistry,
        runner::Pipeline,
    },
};

/// Frames averaged by the profiler.
pub const PROFILE_WINDOW: usize = 30;

const RECORD_FALLBACK_FPS: f64 = 30.0;

#[derive(Clone, Debug)]
struct StepTimings {
    index: usize,
    name: String,
    samples: VecDeque<Duration>,
}

/// Rolling per-step and per-frame timings.
#[derive(Clone, Debug)]
pub struct Profiler {
    window: usize,
    report_every: u64,
    budget: Option<Duration>,
    steps: Vec<StepTimings>,
    frames: VecDeque<Duration>,
    frame_count: u64,
    slow_frames: u64,
}

impl Profiler {
    /// `framerate` sets the per-frame budget used to flag slow frames; 0 disables it.
    pub fn new(framerate: f64) -> Self {
        let budget = (framerate.is_finite() && framerate > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / framerate));
        Self {
            window: PROFILE_WINDOW,
            report_every: PROFILE_WINDOW as u64,
            budget,
            steps: Vec::new(),
            frames: VecDeque::with_capacity(PROFILE_WINDOW),
            frame_count: 0,
            slow_frames: 0,
        }
    }

    /// Log a summary every `n` frames; 0 disables reporting.
    pub fn with_report_every(mut self, n: u64) -> Self {
        self.report_every = n;
        self
    }

    pub fn record_step(&mut self, index: usize, name: &str, elapsed: Duration) {
        let pos = match self.steps.iter().position(|s| s.index == index && s.name == name) {
            Some(pos) => pos,
            None => {
                self.steps.push(StepTimings {
                    index,
                    name: name.to_owned(),
                    samples: VecDeque::with_capacity(self.window),
                });
                self.steps.len() - 1
            }
        };
        push_window(&mut self.steps[pos].samples, elapsed, self.window);
    }

    /// Close out one frame. Returns whether it overran the framerate budget.
    pub fn end_frame(&mut self, elapsed: Duration) -> bool {
        push_window(&mut self.frames, elapsed, self.window);
        self.frame_count += 1;
        let slow = self.budget.is_some_and(|b| elapsed > b);
        if slow {
            self.slow_frames += 1;
            tracing::debug!(frame = self.frame_count, elapsed_ms = millis(elapsed), "slow frame");
        }
        if self.report_every > 0 && self.frame_count.is_multiple_of(self.report_every) {
            tracing::info!(
                frames = self.frame_count,
                slow = self.slow_frames,
                "profile: {}",
                self.summary()
            );
        }
        slow
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn slow_frames(&self) -> u64 {
        self.slow_frames
    }

    pub fn frame_average(&self) -> Option<Duration> {
        average(&self.frames)
    }

    pub fn step_average(&self, index: usize) -> Option<Duration> {
        self.steps
            .iter()
            .find(|s| s.index == index)
            .and_then(|s| average(&s.samples))
    }

    /// `frame 3.10ms | 0:Blur 1.20ms | 1:Layer 0.40ms`
    pub fn summary(&self) -> String {
        let mut out = match self.frame_average() {
            Some(avg) => format!("frame {:.2}ms", millis(avg)),
            None => "frame -".to_owned(),
        };
        for s in &self.steps {
            if let Some(avg) = average(&s.samples) {
                out.push_str(&format!(" | {}:{} {:.2}ms", s.index, s.name, millis(avg)));
            }
        }
        out
    }
}

fn push_window(q: &mut VecDeque<Duration>, v: Duration, window: usize) {
    if q.len() == window {
        q.pop_front();
    }
    q.push_back(v);
}

fn average(q: &VecDeque<Duration>) -> Option<Duration> {
    if q.is_empty() {
        return None;
    }
    let total: Duration = q.iter().sum();
    Some(total / q.len() as u32)
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Per-frame driver: source, viewport animator, viewport, pipeline, then save/record.
pub struct Session {
    global: Arc<GlobalConfig>,
    source: Box<dyn FrameSource>,
    viewport_cfg: Option<ViewportConfig>,
    viewport: Option<Viewport>,
    animator: ViewportAnimator,
    pipeline: Pipeline,
    profiler: Profiler,
    record_path: Option<PathBuf>,
    recorder: Option<Recorder>,
    frame: FrameIndex,
    save_frameset: bool,
    screenshot: bool,
    last_source: Option<Frame>,
}

impl Session {
    pub fn new(
        global: Arc<GlobalConfig>,
        source: Box<dyn FrameSource>,
        pipeline: Pipeline,
        viewport: Option<ViewportConfig>,
    ) -> Self {
        let animator = match &viewport {
            Some(cfg) => {
                let mut anim = ViewportAnimator::with_keyframes(cfg.mode, cfg.keyframes.clone());
                anim.set_playing(cfg.playing);
                anim
            }
            None => ViewportAnimator::default(),
        };
        Self {
            profiler: Profiler::new(global.framerate),
            global,
            source,
            viewport_cfg: viewport,
            viewport: None,
            animator,
            pipeline,
            record_path: None,
            recorder: None,
            frame: FrameIndex::default(),
            save_frameset: false,
            screenshot: false,
            last_source: None,
        }
    }

    /// Open the configured input and build the declared pipeline.
    pub fn from_config(cfg: &AppConfig, registry: &StepRegistry) -> ViewfxResult<Self> {
        let global = Arc::new(cfg.config.clone());
        let decls = cfg.step_decls()?;
        let pipeline = Pipeline::from_decls(registry, global.clone(), &decls)?;
        let source = open_source(&global)?;
        Ok(Self::new(global, source, pipeline, cfg.viewport.clone()))
    }

    /// Stream final frames to `path`; the recorder starts on the next frame.
    pub fn record_to(&mut self, path: impl Into<PathBuf>) {
        self.record_path = Some(path.into());
    }

    /// Save step images on the next frame even for non-image input.
    pub fn request_frameset_save(&mut self) {
        self.save_frameset = true;
    }

    /// Write the next final frame under `screenshots/`.
    pub fn request_screenshot(&mut self) {
        self.screenshot = true;
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.viewport.as_mut()
    }

    pub fn animator(&self) -> &ViewportAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut ViewportAnimator {
        &mut self.animator
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Frames processed so far.
    pub fn frame_index(&self) -> FrameIndex {
        self.frame
    }

    /// Source frame with the viewport's debug overlay drawn on it, when debug is on.
    pub fn debug_view(&self) -> Option<Frame> {
        let vp = self.viewport.as_ref().filter(|vp| vp.debug())?;
        Some(vp.draw_overlay(self.last_source.as_ref()?))
    }

    /// Process one frame. `None` at end of stream.
    #[tracing::instrument(level = "debug", skip(self), fields(frame = self.frame.0))]
    pub fn step_frame(&mut self) -> ViewfxResult<Option<Frame>> {
        let started = Instant::now();
        let Some(mut frame) = self.source.read()? else {
            return Ok(None);
        };

        if let Some(cfg) = &self.viewport_cfg {
            let (w, h) = frame.dimensions();
            let vp = self.viewport.get_or_insert_with(|| {
                let mut vp = match cfg.state {
                    Some(state) => Viewport::new(w, h, state),
                    None => Viewport::for_image(w, h),
                };
                vp.set_debug(cfg.debug);
                vp
            });
            if let Some(state) = self.animator.update() {
                vp.set_state(state)?;
            }
            vp.update(&frame)?;
            let view = vp.view().clone();
            if vp.debug() {
                self.last_source = Some(frame);
            }
            frame = view;
        }

        let save = self.global.input_type == InputType::Image || std::mem::take(&mut self.save_frameset);
        let frame = self
            .pipeline
            .run_frame_profiled(frame, save, Some(&mut self.profiler))?;

        if std::mem::take(&mut self.screenshot) {
            self.save_screenshot(&frame);
        }
        self.record(&frame)?;

        self.profiler.end_frame(started.elapsed());
        self.frame = self.frame.next();
        Ok(Some(frame))
    }

    /// Run until end of stream or `limit` frames; returns the last final frame.
    pub fn run(&mut self, limit: Option<u64>) -> ViewfxResult<Option<Frame>> {
        let mut last = None;
        let mut processed = 0u64;
        while limit.is_none_or(|l| processed < l) {
            match self.step_frame()? {
                Some(frame) => last = Some(frame),
                None => break,
            }
            processed += 1;
        }
        tracing::info!(frames = processed, "session stopped");
        Ok(last)
    }

    /// Release the source and flush the recording, returning the video path if any.
    pub fn finish(mut self) -> ViewfxResult<Option<PathBuf>> {
        self.source.release();
        match self.recorder.take() {
            Some(rec) => rec.finish().map(Some),
            None => Ok(None),
        }
    }

    fn save_screenshot(&self, frame: &Frame) {
        let name = format!("{}.png", self.global.screenshot_label);
        let relative = Path::new("screenshots").join(name);
        match output::save_frame(&self.global.output_root, &relative, frame, true) {
            Ok(path) => tracing::info!(path = %path.display(), "screenshot saved"),
            Err(err) => tracing::warn!(error = %err, "failed to save screenshot"),
        }
    }

    fn record(&mut self, frame: &Frame) -> ViewfxResult<()> {
        if self.recorder.is_none() {
            let Some(path) = &self.record_path else {
                return Ok(());
            };
            let fps = if self.global.framerate > 0.0 {
                self.global.framerate
            } else {
                RECORD_FALLBACK_FPS
            };
            let (w, h) = frame.dimensions();
            self.recorder = Some(Recorder::start(RecordConfig::new(path.clone(), w, h, fps))?);
        }
        match self.recorder.as_mut() {
            Some(rec) => rec.write_frame(frame),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
