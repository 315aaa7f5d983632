//! Frame capture driver: steps a single shared rendering surface through the
//! union of all scenes' duration at 1/fps intervals, resolving the visual
//! state (timeline effects, ambient loops, subtitle highlight) for each tick
//! and snapshotting exactly one pixel buffer per frame, in index order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    align::{Alignment, WordTimestamp},
    core::{Fps, FrameIndex},
    error::{ScenecastError, ScenecastResult},
    timeline::{ResolvedEffect, TimelineModel},
};

/// Raw RGBA8 pixels for one captured frame.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Burned-in subtitle state for one frame: the scene's full voiceover text
/// with the active word index highlighted (`None` before the scene's first
/// word is spoken).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SubtitleState {
    pub text: String,
    pub highlight: Option<usize>,
}

/// Fully resolved visual state for one capture tick.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameState {
    pub frame: FrameIndex,
    pub timestamp_ms: f64,
    pub scene_index: usize,
    pub scene_local_ms: f64,
    pub effects: Vec<ResolvedEffect>,
    pub subtitle: SubtitleState,
}

/// One captured frame. Ephemeral: owned by the driver until handed to the
/// sink, then dropped.
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub index: FrameIndex,
    pub timestamp_ms: f64,
    pub pixels: PixelBuffer,
}

/// The external host that turns resolved state into pixels (e.g. a headless
/// browser). Exclusively owned by the capture driver for a run's duration.
pub trait RenderSurface {
    /// Apply a resolved frame state and let the surface settle.
    fn apply(&mut self, state: &FrameState) -> ScenecastResult<()>;

    /// Snapshot the current pixel output.
    fn snapshot(&mut self) -> ScenecastResult<PixelBuffer>;
}

/// Ordered consumer of captured frames (the video assembler, a test
/// collector, a debug dumper).
pub trait FrameSink {
    fn submit(&mut self, frame: RenderedFrame) -> ScenecastResult<()>;
}

/// Pipeline phase, reported on the progress stream.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Phase {
    Idle,
    Planning,
    Aligning,
    Preparing { scene: usize },
    Capturing { frame: u64 },
    Advancing,
    Finalizing,
    Done,
    Failed { reason: String },
}

/// Cooperative cancellation, checked between frames (never mid-capture).
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One scene's slice of the shared track: its built (immutable) timeline
/// plus its absolute placement.
#[derive(Clone, Debug)]
pub struct ScenePlan {
    pub template_id: String,
    pub voiceover_text: String,
    pub timeline: TimelineModel,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Everything the driver needs for a run: placed scenes, the word
/// alignment, and the flat word list they index into.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub scenes: Vec<ScenePlan>,
    pub alignment: Alignment,
    pub words: Vec<WordTimestamp>,
    pub total_ms: u64,
}

impl RenderPlan {
    /// Scene owning track-relative `t_ms` (by cumulative duration); frames
    /// past the last scene boundary stay on the final scene.
    pub fn scene_at(&self, t_ms: f64) -> usize {
        let idx = self
            .scenes
            .partition_point(|s| (s.end_ms as f64) <= t_ms);
        idx.min(self.scenes.len() - 1)
    }

    /// Resolve the full visual state at frame `k`.
    pub fn frame_state(&self, fps: Fps, frame: FrameIndex) -> ScenecastResult<FrameState> {
        let t_ms = fps.frame_to_ms(frame);
        let scene_index = self.scene_at(t_ms);
        let scene = &self.scenes[scene_index];
        let scene_local_ms = t_ms - scene.start_ms as f64;

        let effects = scene.timeline.sample_at(scene_local_ms)?;

        let window = &self.alignment.windows[scene_index];
        let highlight = window
            .active_word_at(&self.words, t_ms)
            .map(|global| global - window.word_range.start);

        Ok(FrameState {
            frame,
            timestamp_ms: t_ms,
            scene_index,
            scene_local_ms,
            effects,
            subtitle: SubtitleState {
                text: scene.voiceover_text.clone(),
                highlight,
            },
        })
    }
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub fps: Fps,
    /// Attempts per frame before a transient surface failure becomes fatal.
    pub max_attempts: u32,
    /// Debug-only: also write each frame as a PNG under this directory.
    pub dump_dir: Option<std::path::PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            max_attempts: 3,
            dump_dir: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub retries: u64,
}

pub struct FrameCaptureDriver {
    cfg: CaptureConfig,
    phase: Phase,
}

impl FrameCaptureDriver {
    pub fn new(cfg: CaptureConfig) -> Self {
        Self {
            cfg,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Capture `frame_count` frames in strictly increasing index order,
    /// handing each to `sink` exactly once. Transient capture failures are
    /// retried per frame up to the configured attempt budget; an index is
    /// never skipped or re-submitted on success.
    #[tracing::instrument(skip_all, fields(frame_count))]
    pub fn run(
        &mut self,
        plan: &RenderPlan,
        frame_count: u64,
        surface: &mut dyn RenderSurface,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
        mut on_phase: impl FnMut(&Phase),
    ) -> ScenecastResult<CaptureStats> {
        if plan.scenes.is_empty() {
            return Err(ScenecastError::validation("render plan has no scenes"));
        }
        if plan.alignment.windows.len() != plan.scenes.len() {
            return Err(ScenecastError::validation(
                "render plan alignment does not cover every scene",
            ));
        }

        let mut stats = CaptureStats::default();
        let mut current_scene = usize::MAX;

        for k in 0..frame_count {
            if cancel.is_cancelled() {
                self.transition(Phase::Failed {
                    reason: "cancelled".to_string(),
                }, &mut on_phase);
                return Err(ScenecastError::capture("run cancelled between frames"));
            }

            let state = plan.frame_state(self.cfg.fps, FrameIndex(k))?;
            if state.scene_index != current_scene {
                current_scene = state.scene_index;
                self.transition(
                    Phase::Preparing {
                        scene: current_scene,
                    },
                    &mut on_phase,
                );
            }

            self.transition(Phase::Capturing { frame: k }, &mut on_phase);
            let pixels = match self.capture_with_retry(surface, &state, &mut stats) {
                Ok(pixels) => pixels,
                Err(e) => {
                    self.transition(
                        Phase::Failed {
                            reason: e.to_string(),
                        },
                        &mut on_phase,
                    );
                    return Err(e);
                }
            };

            if let Some(dir) = &self.cfg.dump_dir {
                dump_frame_png(dir, k, &pixels)?;
            }

            sink.submit(RenderedFrame {
                index: FrameIndex(k),
                timestamp_ms: state.timestamp_ms,
                pixels,
            })?;
            stats.frames_captured += 1;
            self.transition(Phase::Advancing, &mut on_phase);
        }

        self.transition(Phase::Finalizing, &mut on_phase);
        tracing::info!(
            frames = stats.frames_captured,
            retries = stats.retries,
            "frame capture complete"
        );
        Ok(stats)
    }

    fn capture_with_retry(
        &self,
        surface: &mut dyn RenderSurface,
        state: &FrameState,
        stats: &mut CaptureStats,
    ) -> ScenecastResult<PixelBuffer> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = surface
                .apply(state)
                .and_then(|()| surface.snapshot());
            match result {
                Ok(pixels) => return Ok(pixels),
                Err(e) if e.is_transient_capture() && attempt < self.cfg.max_attempts => {
                    stats.retries += 1;
                    tracing::warn!(
                        frame = state.frame.0,
                        attempt,
                        error = %e,
                        "transient capture failure; retrying"
                    );
                }
                Err(e) => {
                    return Err(ScenecastError::capture(format!(
                        "frame {} failed after {attempt} attempt(s) (scene {}): {e}",
                        state.frame.0, state.scene_index
                    )));
                }
            }
        }
    }

    fn transition(&mut self, phase: Phase, on_phase: &mut impl FnMut(&Phase)) {
        self.phase = phase;
        on_phase(&self.phase);
    }
}

fn dump_frame_png(dir: &std::path::Path, index: u64, pixels: &PixelBuffer) -> ScenecastResult<()> {
    use anyhow::Context as _;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create frame dump dir '{}'", dir.display()))?;
    let path = dir.join(format!("frame_{index:06}.png"));
    image::save_buffer_with_format(
        &path,
        &pixels.data,
        pixels.width,
        pixels.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write frame dump '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::SceneSpan;
    use crate::timeline::{Property, Value};

    pub(crate) struct MockSurface {
        pub applied: Vec<FrameState>,
        /// frame index -> remaining failures to inject before succeeding
        pub fail_at: Option<(u64, u32)>,
    }

    impl MockSurface {
        fn new() -> Self {
            Self {
                applied: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl RenderSurface for MockSurface {
        fn apply(&mut self, state: &FrameState) -> ScenecastResult<()> {
            if let Some((frame, remaining)) = self.fail_at
                && frame == state.frame.0
                && remaining > 0
            {
                self.fail_at = Some((frame, remaining - 1));
                return Err(ScenecastError::capture("surface unresponsive"));
            }
            self.applied.push(state.clone());
            Ok(())
        }

        fn snapshot(&mut self) -> ScenecastResult<PixelBuffer> {
            Ok(PixelBuffer {
                width: 2,
                height: 2,
                data: vec![0u8; 16],
            })
        }
    }

    #[derive(Default)]
    pub(crate) struct VecSink {
        pub frames: Vec<RenderedFrame>,
    }

    impl FrameSink for VecSink {
        fn submit(&mut self, frame: RenderedFrame) -> ScenecastResult<()> {
            self.frames.push(frame);
            Ok(())
        }
    }

    fn counter_plan(total_ms: u64) -> RenderPlan {
        let timeline = TimelineModel {
            effects: vec![crate::templates::motion::count_up(
                "stat-value",
                300,
                crate::templates::motion::COUNT_UP_MS,
                73,
            )],
            loops: vec![],
        };
        let words = vec![
            WordTimestamp {
                word: "seventy".to_string(),
                start_ms: 200,
                end_ms: 900,
            },
            WordTimestamp {
                word: "three".to_string(),
                start_ms: 900,
                end_ms: 1400,
            },
        ];
        let spans = [SceneSpan {
            voiceover_text: "seventy three".to_string(),
            start_ms: 0,
            end_ms: total_ms,
        }];
        let alignment = Alignment::build(&spans, &words, false).unwrap();
        RenderPlan {
            scenes: vec![ScenePlan {
                template_id: "statistic_showcase".to_string(),
                voiceover_text: "seventy three".to_string(),
                timeline,
                start_ms: 0,
                end_ms: total_ms,
            }],
            alignment,
            words,
            total_ms,
        }
    }

    fn counter_value(state: &FrameState) -> i64 {
        state
            .effects
            .iter()
            .find_map(|r| {
                if r.target == "stat-value" && r.property == Property::Counter {
                    match r.value {
                        Value::Integer(v) => Some(v),
                        _ => None,
                    }
                } else {
                    None
                }
            })
            .expect("counter effect resolved")
    }

    #[test]
    fn statistic_scenario_captures_90_frames_counting_0_to_73() {
        let plan = counter_plan(3000);
        let fps = Fps(30);
        let frame_count = fps.frame_count_for(3000);
        assert_eq!(frame_count, 90);

        let mut surface = MockSurface::new();
        let mut sink = VecSink::default();
        let mut driver = FrameCaptureDriver::new(CaptureConfig {
            fps,
            ..CaptureConfig::default()
        });
        let stats = driver
            .run(
                &plan,
                frame_count,
                &mut surface,
                &mut sink,
                &CancelToken::new(),
                |_| {},
            )
            .unwrap();

        assert_eq!(stats.frames_captured, 90);
        assert_eq!(sink.frames.len(), 90);
        assert_eq!(counter_value(&surface.applied[0]), 0);
        assert_eq!(counter_value(&surface.applied[89]), 73);
        // Indices strictly increasing, none skipped.
        for (i, frame) in sink.frames.iter().enumerate() {
            assert_eq!(frame.index.0, i as u64);
        }
        assert_eq!(*driver.phase(), Phase::Finalizing);
    }

    #[test]
    fn transient_failures_are_retried_then_succeed_once() {
        let plan = counter_plan(1000);
        let fps = Fps(30);
        let frame_count = fps.frame_count_for(1000);

        let mut surface = MockSurface::new();
        surface.fail_at = Some((10, 2)); // fail twice, succeed on third attempt
        let mut sink = VecSink::default();
        let mut driver = FrameCaptureDriver::new(CaptureConfig {
            fps,
            max_attempts: 3,
            dump_dir: None,
        });
        let stats = driver
            .run(
                &plan,
                frame_count,
                &mut surface,
                &mut sink,
                &CancelToken::new(),
                |_| {},
            )
            .unwrap();

        assert_eq!(stats.retries, 2);
        assert_eq!(stats.frames_captured, frame_count);
        let tenth: Vec<_> = sink.frames.iter().filter(|f| f.index.0 == 10).collect();
        assert_eq!(tenth.len(), 1, "retried frame present exactly once");
    }

    #[test]
    fn exhausted_retries_fail_the_run() {
        let plan = counter_plan(1000);
        let mut surface = MockSurface::new();
        surface.fail_at = Some((5, 10));
        let mut sink = VecSink::default();
        let mut driver = FrameCaptureDriver::new(CaptureConfig {
            fps: Fps(30),
            max_attempts: 3,
            dump_dir: None,
        });
        let err = driver
            .run(&plan, 30, &mut surface, &mut sink, &CancelToken::new(), |_| {})
            .unwrap_err();
        assert!(matches!(err, ScenecastError::Capture(_)));
        assert!(err.to_string().contains("frame 5"));
        assert!(matches!(driver.phase(), Phase::Failed { .. }));
        // Nothing past the failed frame was submitted.
        assert!(sink.frames.iter().all(|f| f.index.0 < 5));
    }

    #[test]
    fn cancellation_stops_between_frames() {
        let plan = counter_plan(1000);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut surface = MockSurface::new();
        let mut sink = VecSink::default();
        let mut driver = FrameCaptureDriver::new(CaptureConfig::default());
        let err = driver
            .run(&plan, 30, &mut surface, &mut sink, &cancel, |_| {})
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn subtitle_highlight_follows_words_and_holds_last() {
        let plan = counter_plan(3000);
        let fps = Fps(30);
        let state_at = |frame: u64| plan.frame_state(fps, FrameIndex(frame)).unwrap();

        // Frame 0 (t=0): first word starts at 200ms, nothing highlighted.
        assert_eq!(state_at(0).subtitle.highlight, None);
        // Frame 15 (t=500): inside "seventy".
        assert_eq!(state_at(15).subtitle.highlight, Some(0));
        // Frame 36 (t=1200): inside "three".
        assert_eq!(state_at(36).subtitle.highlight, Some(1));
        // Frame 75 (t=2500): speech over, last word holds.
        assert_eq!(state_at(75).subtitle.highlight, Some(1));
        assert_eq!(state_at(75).subtitle.text, "seventy three");
    }

    #[test]
    fn scene_resolution_uses_cumulative_durations() {
        let mut plan = counter_plan(1000);
        let second = ScenePlan {
            template_id: "key_takeaway".to_string(),
            voiceover_text: "done".to_string(),
            timeline: TimelineModel::empty(),
            start_ms: 1000,
            end_ms: 2500,
        };
        plan.scenes.push(second);
        plan.total_ms = 2500;
        plan.alignment.windows.push(crate::align::SceneWindow {
            scene_index: 1,
            word_range: 2..2,
            start_ms: 1000,
            end_ms: 2500,
        });

        assert_eq!(plan.scene_at(0.0), 0);
        assert_eq!(plan.scene_at(999.9), 0);
        assert_eq!(plan.scene_at(1000.0), 1);
        assert_eq!(plan.scene_at(9999.0), 1);

        let state = plan.frame_state(Fps(30), FrameIndex(45)).unwrap(); // t=1500
        assert_eq!(state.scene_index, 1);
        assert_eq!(state.scene_local_ms, 500.0);
    }
}
