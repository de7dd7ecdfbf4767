use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::{
    foundation::{
        core::Frame,
        error::{ViewfxError, ViewfxResult},
    },
    pipeline::config::{GlobalConfig, InputType},
};

/// Anything that hands the session one frame at a time.
pub trait FrameSource {
    fn is_open(&self) -> bool;

    /// Next frame, or `None` at end of stream.
    fn read(&mut self) -> ViewfxResult<Option<Frame>>;

    fn release(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read(&mut self) -> ViewfxResult<Option<Frame>> {
        (**self).read()
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// A decoded still image handed out a fixed number of times.
#[derive(Clone, Debug)]
pub struct ImageSource {
    frame: Option<Frame>,
    remaining: u64,
}

impl ImageSource {
    pub fn open(path: &Path, max_frames: Option<u64>) -> ViewfxResult<Self> {
        let img = image::open(path).map_err(|e| {
            ViewfxError::asset(format!("input image '{}' could not be loaded: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), width = img.width(), height = img.height(), "opened image input");
        Ok(Self::from_frame(img.to_rgb8(), max_frames))
    }

    /// `max_frames` defaults to a single frame.
    pub fn from_frame(frame: Frame, max_frames: Option<u64>) -> Self {
        Self {
            frame: Some(frame),
            remaining: max_frames.unwrap_or(1),
        }
    }
}

impl FrameSource for ImageSource {
    fn is_open(&self) -> bool {
        self.frame.is_some() && self.remaining > 0
    }

    fn read(&mut self) -> ViewfxResult<Option<Frame>> {
        if self.remaining == 0 {
            self.frame = None;
        }
        let Some(frame) = &self.frame else {
            return Ok(None);
        };
        self.remaining -= 1;
        Ok(Some(frame.clone()))
    }

    fn release(&mut self) {
        self.frame = None;
        self.remaining = 0;
    }
}

/// Paces reads to a target framerate by sleeping until the next scheduled frame time.
#[derive(Clone, Debug)]
pub struct Throttle {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl Throttle {
    /// A framerate of zero (or anything non-positive) disables throttling.
    pub fn new(framerate: f64) -> Self {
        let interval = (framerate.is_finite() && framerate > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / framerate));
        Self {
            interval,
            next: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Block until the next frame slot; returns how long it slept.
    pub fn wait(&mut self) -> Duration {
        let Some(interval) = self.interval else {
            return Duration::ZERO;
        };
        let now = Instant::now();
        let Some(next) = self.next else {
            self.next = Some(now + interval);
            return Duration::ZERO;
        };
        let slept = next.saturating_duration_since(now);
        if !slept.is_zero() {
            std::thread::sleep(slept);
        }
        // Late frames reschedule from now instead of bursting to catch up.
        self.next = Some(next.max(now) + interval);
        slept
    }
}

/// Wraps a source so every frame is paced by a [`Throttle`].
pub struct Throttled<S> {
    inner: S,
    throttle: Throttle,
}

impl<S: FrameSource> Throttled<S> {
    pub fn new(inner: S, throttle: Throttle) -> Self {
        Self { inner, throttle }
    }
}

impl<S: FrameSource> FrameSource for Throttled<S> {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn read(&mut self) -> ViewfxResult<Option<Frame>> {
        self.throttle.wait();
        self.inner.read()
    }

    fn release(&mut self) {
        self.inner.release();
    }
}

/// Open the input described by `global`, throttled when a framerate is set.
pub fn open_source(global: &GlobalConfig) -> ViewfxResult<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match global.input_type {
        InputType::Image => Box::new(ImageSource::open(&global.input_path(), global.max_frames)?),
        InputType::Video => open_video(&global.input_path())?,
        InputType::Live => {
            let device = global.input_source.trim().parse::<u32>().map_err(|_| {
                ViewfxError::validation(format!(
                    "live input_source must be a device index, got '{}'",
                    global.input_source
                ))
            })?;
            open_live(device)?
        }
    };
    let throttle = Throttle::new(global.framerate);
    if throttle.interval().is_some() {
        return Ok(Box::new(Throttled::new(source, throttle)));
    }
    Ok(source)
}

#[cfg(feature = "media-ffmpeg")]
fn open_video(path: &Path) -> ViewfxResult<Box<dyn FrameSource>> {
    Ok(Box::new(ffmpeg::FfmpegSource::video(path)?))
}

#[cfg(feature = "media-ffmpeg")]
fn open_live(device: u32) -> ViewfxResult<Box<dyn FrameSource>> {
    Ok(Box::new(ffmpeg::FfmpegSource::live(device)?))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn open_video(_path: &Path) -> ViewfxResult<Box<dyn FrameSource>> {
    Err(ViewfxError::evaluation(
        "video input requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn open_live(_device: u32) -> ViewfxResult<Box<dyn FrameSource>> {
    Err(ViewfxError::evaluation(
        "live input requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
pub mod ffmpeg {
    use std::{
        ffi::OsString,
        io::Read as _,
        path::Path,
        process::{Child, ChildStdout, Command, Stdio},
    };

    use super::FrameSource;
    use crate::foundation::{
        core::Frame,
        error::{ViewfxError, ViewfxResult},
    };

    /// Decodes a video file or V4L2 device to RGB24 through the system `ffmpeg` binary.
    pub struct FfmpegSource {
        label: String,
        width: u32,
        height: u32,
        child: Option<Child>,
        stdout: Option<ChildStdout>,
    }

    impl FfmpegSource {
        pub fn video(path: &Path) -> ViewfxResult<Self> {
            let input = vec![OsString::from("-i"), path.as_os_str().to_owned()];
            Self::spawn(path.display().to_string(), input)
        }

        pub fn live(device: u32) -> ViewfxResult<Self> {
            let dev = format!("/dev/video{device}");
            let input = vec![
                OsString::from("-f"),
                OsString::from("v4l2"),
                OsString::from("-i"),
                OsString::from(&dev),
            ];
            Self::spawn(dev, input)
        }

        pub fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn spawn(label: String, input: Vec<OsString>) -> ViewfxResult<Self> {
            let (width, height) = probe_size(&label, &input)?;
            let mut child = Command::new("ffmpeg")
                .args(["-v", "error"])
                .args(&input)
                .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| {
                    ViewfxError::evaluation(format!(
                        "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                    ))
                })?;
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| ViewfxError::evaluation("failed to open ffmpeg stdout (unexpected)"))?;
            tracing::info!(input = %label, width, height, "opened ffmpeg input");
            Ok(Self {
                label,
                width,
                height,
                child: Some(child),
                stdout: Some(stdout),
            })
        }
    }

    fn probe_size(label: &str, input: &[OsString]) -> ViewfxResult<(u32, u32)> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            streams: Vec<ProbeStream>,
        }

        // ffprobe takes the input positionally, so drop the "-i" flag.
        let args = input.iter().filter(|a| a.as_os_str() != "-i");
        let out = Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .args(args)
            .output()
            .map_err(|e| ViewfxError::evaluation(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(ViewfxError::evaluation(format!(
                "ffprobe failed for '{label}': {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| ViewfxError::evaluation(format!("ffprobe json parse failed: {e}")))?;
        let stream = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| ViewfxError::evaluation(format!("no video stream found in '{label}'")))?;
        match (stream.width, stream.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => Err(ViewfxError::evaluation(format!(
                "missing video size from ffprobe for '{label}'"
            ))),
        }
    }

    impl FrameSource for FfmpegSource {
        fn is_open(&self) -> bool {
            self.stdout.is_some()
        }

        fn read(&mut self) -> ViewfxResult<Option<Frame>> {
            let Some(stdout) = self.stdout.as_mut() else {
                return Ok(None);
            };
            let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
            match stdout.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    tracing::info!(input = %self.label, "end of stream");
                    self.release();
                    return Ok(None);
                }
                Err(e) => {
                    return Err(ViewfxError::evaluation(format!(
                        "failed to read frame from ffmpeg for '{}': {e}",
                        self.label
                    )));
                }
            }
            Frame::from_raw(self.width, self.height, buf)
                .map(Some)
                .ok_or_else(|| ViewfxError::evaluation("decoded frame has invalid size"))
        }

        fn release(&mut self) {
            drop(self.stdout.take());
            if let Some(mut child) = self.child.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }

    impl Drop for FfmpegSource {
        fn drop(&mut self) {
            self.release();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/source.rs"]
mod tests;
