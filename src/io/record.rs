//! Final-frame recording to H.264 through the system `ffmpeg` binary.
//!
//! The canvas is fixed when recording starts. Later frames of another size (an interpolated
//! viewport resize, an edited `Resize` step) are letterboxed onto it instead of ending the run.

use std::{
    borrow::Cow,
    ffi::OsString,
    io::Write as _,
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
};

use image::Rgb;

use crate::{
    foundation::{
        core::Frame,
        error::{ViewfxError, ViewfxResult},
    },
    pipeline::{filters::resize_image, output},
};

const LETTERBOX: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Clone, Debug, PartialEq)]
pub struct RecordConfig {
    pub out_path: PathBuf,
    pub fps: f64,
    /// Size of every encoded frame; both sides even, as yuv420p requires.
    pub canvas: (u32, u32),
}

impl RecordConfig {
    /// Odd sizes round up to the next even one.
    pub fn new(out_path: impl Into<PathBuf>, width: u32, height: u32, fps: f64) -> Self {
        Self {
            out_path: out_path.into(),
            fps,
            canvas: (even_up(width), even_up(height)),
        }
    }

    pub fn validate(&self) -> ViewfxResult<()> {
        let (w, h) = self.canvas;
        if w == 0 || h == 0 {
            return Err(ViewfxError::validation(format!(
                "recording canvas {w}x{h} is empty"
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ViewfxError::validation(format!(
                "recording fps must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Encoder command line: raw RGB24 canvas frames on stdin, H.264 file out.
    fn encoder_args(&self) -> Vec<OsString> {
        let (w, h) = self.canvas;
        let mut args: Vec<OsString> = [
            "-y",
            "-v",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-video_size",
            &format!("{w}x{h}"),
            "-framerate",
            &self.fps.to_string(),
            "-i",
            "-",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(self.out_path.clone().into_os_string());
        args
    }
}

fn even_up(v: u32) -> u32 {
    v.saturating_add(v & 1)
}

/// First line of `ffmpeg -version`, or `None` when ffmpeg cannot be run.
pub fn ffmpeg_version() -> Option<String> {
    let out = Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .map(str::to_owned)
}

/// `frame` untouched when it already matches `canvas`, otherwise scaled to fit and centered
/// on black.
pub fn fit_to_canvas(frame: &Frame, canvas: (u32, u32)) -> Cow<'_, Frame> {
    if frame.dimensions() == canvas {
        Cow::Borrowed(frame)
    } else {
        Cow::Owned(resize_image(frame, canvas, true, LETTERBOX))
    }
}

/// A running `ffmpeg` encoder fed one final frame at a time.
pub struct Recorder {
    cfg: RecordConfig,
    encoder: Child,
    stdin: Option<ChildStdin>,
    frames: u64,
    fitted: u64,
}

impl Recorder {
    pub fn start(cfg: RecordConfig) -> ViewfxResult<Self> {
        cfg.validate()?;
        let Some(version) = ffmpeg_version() else {
            return Err(ViewfxError::evaluation(
                "recording needs the ffmpeg binary on PATH",
            ));
        };
        output::create_parent_dir(&cfg.out_path)?;

        let mut encoder = Command::new("ffmpeg")
            .args(cfg.encoder_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ViewfxError::evaluation(format!(
                    "start encoder for '{}': {e}",
                    cfg.out_path.display()
                ))
            })?;
        let stdin = encoder
            .stdin
            .take()
            .ok_or_else(|| ViewfxError::evaluation("encoder stdin is not piped"))?;

        tracing::info!(
            path = %cfg.out_path.display(),
            width = cfg.canvas.0,
            height = cfg.canvas.1,
            fps = cfg.fps,
            %version,
            "recording started"
        );
        Ok(Self {
            cfg,
            encoder,
            stdin: Some(stdin),
            frames: 0,
            fitted: 0,
        })
    }

    pub fn config(&self) -> &RecordConfig {
        &self.cfg
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames that had to be letterboxed onto the canvas.
    pub fn fitted_frames(&self) -> u64 {
        self.fitted
    }

    pub fn write_frame(&mut self, frame: &Frame) -> ViewfxResult<()> {
        let canvas = fit_to_canvas(frame, self.cfg.canvas);
        if let Cow::Owned(_) = canvas {
            if self.fitted == 0 {
                let (w, h) = frame.dimensions();
                tracing::debug!(
                    frame = self.frames,
                    width = w,
                    height = h,
                    "frame size differs from the recording canvas, letterboxing"
                );
            }
            self.fitted += 1;
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ViewfxError::evaluation("recorder already finished"));
        };
        stdin.write_all(canvas.as_raw()).map_err(|e| {
            ViewfxError::evaluation(format!("send frame {} to encoder: {e}", self.frames))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close the encoder's input and wait for it to finalize the file.
    pub fn finish(mut self) -> ViewfxResult<PathBuf> {
        drop(self.stdin.take());
        let out = self
            .encoder
            .wait_with_output()
            .map_err(|e| ViewfxError::evaluation(format!("wait for encoder: {e}")))?;
        if !out.status.success() {
            return Err(ViewfxError::evaluation(format!(
                "encoder for '{}' failed ({}): {}",
                self.cfg.out_path.display(),
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        tracing::info!(
            path = %self.cfg.out_path.display(),
            frames = self.frames,
            letterboxed = self.fitted,
            "recording finished"
        );
        Ok(self.cfg.out_path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/record.rs"]
mod tests;
