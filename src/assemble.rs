//! Video assembly: streams captured RGBA frames into a system `ffmpeg`
//! process together with the narration audio, producing a faststart MP4.
//! The audio track is the master clock; the frame stream is padded or
//! trimmed to match it before encoding starts.

use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    capture::{FrameSink, RenderedFrame},
    core::Fps,
    error::{ScenecastError, ScenecastResult},
};

/// Audio/visual drift beyond this is logged loudly; the audio still wins.
pub const DRIFT_TOLERANCE_MS: u64 = 300;

#[derive(Clone, Debug)]
pub struct AssembleConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub audio_path: PathBuf,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl AssembleConfig {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScenecastError::validation(
                "assemble width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output requires even dimensions.
            return Err(ScenecastError::validation(
                "assemble width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

/// The finished artifact.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OutputVideo {
    pub id: String,
    pub path: PathBuf,
    pub frame_count: u64,
    pub duration_ms: u64,
}

/// How the frame stream was fitted to the audio track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciled {
    /// Frames the final video must contain (derived from audio duration).
    pub total_frames: u64,
    /// Frames to actually capture from the timeline.
    pub capture_frames: u64,
    /// Copies of the final captured frame appended at the tail.
    pub pad_frames: u64,
}

/// Fit the timeline's frame count to the audio duration. Shorter timelines
/// are padded by holding the last frame; longer ones are trimmed. Drift past
/// the tolerance is reported but never fatal.
pub fn reconcile(fps: Fps, timeline_ms: u64, audio_ms: u64) -> ScenecastResult<Reconciled> {
    if audio_ms == 0 {
        return Err(ScenecastError::assembly("audio track has zero duration"));
    }
    let drift = timeline_ms.abs_diff(audio_ms);
    if drift > DRIFT_TOLERANCE_MS {
        tracing::warn!(
            timeline_ms,
            audio_ms,
            drift_ms = drift,
            "timeline and audio durations drift beyond tolerance; audio wins"
        );
    }

    let total_frames = fps.frame_count_for(audio_ms);
    let timeline_frames = fps.frame_count_for(timeline_ms);
    let capture_frames = total_frames.min(timeline_frames);
    Ok(Reconciled {
        total_frames,
        capture_frames,
        pad_frames: total_frames - capture_frames,
    })
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ScenecastResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Probe the narration file's duration with `ffprobe`. Returns `None` when
/// ffprobe is unavailable or its output is unusable, so the caller can fall
/// back to a declared duration.
pub fn probe_audio_duration_ms(path: &Path) -> Option<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::warn!(path = %path.display(), "ffprobe failed to read audio duration");
        return None;
    }
    parse_ffprobe_duration_ms(&String::from_utf8_lossy(&output.stdout))
}

fn parse_ffprobe_duration_ms(raw: &str) -> Option<u64> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some((secs * 1000.0).round() as u64)
}

/// Deletes the output on drop unless disarmed, so a failed or cancelled run
/// never leaves a partial MP4 behind.
struct OutputGuard(Option<PathBuf>);

impl OutputGuard {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Streaming assembler: one ffmpeg child, frames written to its stdin as
/// rawvideo rgba, narration muxed from the audio file input.
pub struct FfmpegAssembler {
    cfg: AssembleConfig,
    stdin: Option<ChildStdin>,
    child: Option<Child>,
    guard: OutputGuard,
    frames_written: u64,
    last_frame: Option<Vec<u8>>,
}

impl Drop for FfmpegAssembler {
    fn drop(&mut self) {
        // Abandoned mid-run: kill the encoder before the guard deletes the
        // partial output, so ffmpeg cannot recreate it.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl FfmpegAssembler {
    pub fn new(cfg: AssembleConfig) -> ScenecastResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(ScenecastError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !cfg.audio_path.exists() {
            return Err(ScenecastError::assembly(format!(
                "audio file '{}' not found",
                cfg.audio_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ScenecastError::assembly(
                "ffmpeg is required for MP4 assembly, but was not found on PATH",
            ));
        }

        // System ffmpeg binary rather than linked FFmpeg libraries; no native
        // dev headers needed at build time.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.0.to_string(),
            "-i",
            "pipe:0",
        ]);
        cmd.arg("-i").arg(&cfg.audio_path);
        cmd.args([
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "23",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-shortest",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ScenecastError::assembly(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScenecastError::assembly("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            guard: OutputGuard(Some(cfg.out_path.clone())),
            cfg,
            stdin: Some(stdin),
            child: Some(child),
            frames_written: 0,
            last_frame: None,
        })
    }

    fn write_raw(&mut self, data: &[u8]) -> ScenecastResult<()> {
        let expected = (self.cfg.width as usize) * (self.cfg.height as usize) * 4;
        if data.len() != expected {
            return Err(ScenecastError::assembly(format!(
                "frame byte size mismatch: got {}, expected {expected} ({}x{} rgba)",
                data.len(),
                self.cfg.width,
                self.cfg.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ScenecastError::assembly("assembler is already finalized"));
        };
        use std::io::Write as _;
        stdin
            .write_all(data)
            .map_err(|e| ScenecastError::assembly(format!("failed to write frame to ffmpeg: {e}")))?;
        self.frames_written += 1;
        Ok(())
    }

    /// Repeat the last submitted frame `count` times (tail padding when the
    /// audio outlasts the timeline).
    pub fn pad_with_last_frame(&mut self, count: u64) -> ScenecastResult<()> {
        if count == 0 {
            return Ok(());
        }
        let last = self
            .last_frame
            .clone()
            .ok_or_else(|| ScenecastError::assembly("cannot pad: no frame was ever submitted"))?;
        for _ in 0..count {
            self.write_raw(&last)?;
        }
        Ok(())
    }

    /// Close the frame stream, wait for ffmpeg, and verify the exact frame
    /// count was delivered. Anything short of success deletes the output.
    pub fn finish(mut self, expected_frames: u64) -> ScenecastResult<OutputVideo> {
        drop(self.stdin.take());

        let child = self
            .child
            .take()
            .ok_or_else(|| ScenecastError::assembly("assembler is already finalized"))?;
        let output = child
            .wait_with_output()
            .map_err(|e| ScenecastError::assembly(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScenecastError::assembly(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if self.frames_written != expected_frames {
            return Err(ScenecastError::assembly(format!(
                "frame count mismatch: wrote {} frames, expected {expected_frames}",
                self.frames_written
            )));
        }

        self.guard.disarm();
        let duration_ms =
            (self.frames_written as u128 * 1000 / u128::from(self.cfg.fps.0)) as u64;
        tracing::info!(
            frames = self.frames_written,
            out = %self.cfg.out_path.display(),
            "assembly complete"
        );
        Ok(OutputVideo {
            id: String::new(), // filled in by the pipeline
            path: self.cfg.out_path.clone(),
            frame_count: self.frames_written,
            duration_ms,
        })
    }
}

impl FrameSink for FfmpegAssembler {
    fn submit(&mut self, frame: RenderedFrame) -> ScenecastResult<()> {
        if frame.pixels.width != self.cfg.width || frame.pixels.height != self.cfg.height {
            return Err(ScenecastError::assembly(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.pixels.width, frame.pixels.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.index.0 != self.frames_written {
            return Err(ScenecastError::assembly(format!(
                "out-of-order frame: got index {}, expected {}",
                frame.index.0, self.frames_written
            )));
        }
        self.write_raw(&frame.pixels.data)?;
        self.last_frame = Some(frame.pixels.data);
        Ok(())
    }
}
