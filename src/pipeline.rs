//! End-to-end orchestration: script validation, parallel template builds,
//! word alignment, frame capture, and ffmpeg assembly, in that order. Every
//! fallible stage runs before the first frame is captured so bad input never
//! costs a capture session.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::{
    align::{Alignment, SceneSpan, VoiceoverTrack},
    assemble::{self, AssembleConfig, FfmpegAssembler, OutputVideo},
    capture::{
        CancelToken, CaptureConfig, FrameCaptureDriver, Phase, RenderPlan, RenderSurface,
        ScenePlan,
    },
    core::{CaptureSpec, stable_hash64},
    error::{ScenecastError, ScenecastResult},
    script::Script,
    templates::{TemplateCtx, TemplateRegistry},
};

/// Floor for scenes that declare no duration and whose timeline settles
/// quickly; a scene never flashes by faster than this.
pub const MIN_SCENE_MS: u64 = 1500;

#[derive(Clone, Debug)]
pub struct Progress {
    pub phase: Phase,
    pub frames_done: u64,
    pub frames_total: u64,
}

pub type ProgressFn = Box<dyn FnMut(&Progress) + Send>;

pub struct RenderOpts {
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// Split words across scenes proportionally when token counts disagree,
    /// instead of failing with a mismatch.
    pub fallback_alignment: bool,
    /// Attempts per frame before a transient capture failure becomes fatal.
    pub max_capture_attempts: u32,
    pub cancel: CancelToken,
    pub progress: Option<ProgressFn>,
    /// Debug-only PNG dump of every captured frame.
    pub dump_frames_dir: Option<PathBuf>,
}

impl RenderOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            fallback_alignment: false,
            max_capture_attempts: 3,
            cancel: CancelToken::new(),
            progress: None,
            dump_frames_dir: None,
        }
    }
}

/// Build the capture plan: every scene's timeline (in parallel), scene
/// placement by cumulative duration, and the word alignment. Pure with
/// respect to the filesystem, so callers can plan without touching ffmpeg.
#[tracing::instrument(skip_all, fields(scenes = script.scenes.len()))]
pub fn build_plan(
    script: &Script,
    voiceover: &VoiceoverTrack,
    registry: &TemplateRegistry,
    fallback_alignment: bool,
) -> ScenecastResult<RenderPlan> {
    script.validate()?;
    voiceover.validate()?;

    let timelines = script
        .scenes
        .par_iter()
        .enumerate()
        .map(|(i, scene)| {
            let template = registry.get(&scene.template_id)?;
            template.validate(&scene.params)?;
            let ctx = TemplateCtx::new(i, &script.style, script.seed);
            template.build(&ctx, &scene.params)
        })
        .collect::<ScenecastResult<Vec<_>>>()?;

    let mut scenes = Vec::with_capacity(script.scenes.len());
    let mut cursor = 0u64;
    for (scene, timeline) in script.scenes.iter().zip(timelines) {
        // A declared duration is honored exactly (extended only to cover the
        // built timeline); the floor applies to undeclared durations alone,
        // so scene starts never drift against the word timestamps.
        let natural = timeline.end_ms();
        let duration = scene
            .duration_ms
            .map_or(natural.max(MIN_SCENE_MS), |d| d.max(natural));
        let start_ms = cursor;
        cursor += duration;
        scenes.push(ScenePlan {
            template_id: scene.template_id.clone(),
            voiceover_text: scene.voiceover_text.clone(),
            timeline,
            start_ms,
            end_ms: cursor,
        });
    }

    let spans: Vec<SceneSpan> = scenes
        .iter()
        .map(|s| SceneSpan {
            voiceover_text: s.voiceover_text.clone(),
            start_ms: s.start_ms,
            end_ms: s.end_ms,
        })
        .collect();
    let alignment = Alignment::build(&spans, &voiceover.words, fallback_alignment)?;

    Ok(RenderPlan {
        scenes,
        alignment,
        words: voiceover.words.clone(),
        total_ms: cursor,
    })
}

/// Render a script against a voiceover track into a subtitled MP4.
///
/// The audio track is authoritative for output length; the captured frame
/// stream is padded (last frame held) or trimmed to match it. Fails before
/// any frame is captured when the script, params, or alignment are invalid.
#[tracing::instrument(skip_all, fields(out = %opts.out_path.display()))]
pub fn render_video(
    script: &Script,
    voiceover: &VoiceoverTrack,
    spec: &CaptureSpec,
    surface: &mut dyn RenderSurface,
    mut opts: RenderOpts,
) -> ScenecastResult<OutputVideo> {
    spec.validate()?;

    let report = |progress: &mut Option<ProgressFn>, p: Progress| {
        if let Some(f) = progress.as_mut() {
            f(&p);
        }
    };

    report(
        &mut opts.progress,
        Progress {
            phase: Phase::Planning,
            frames_done: 0,
            frames_total: 0,
        },
    );
    let plan = build_plan(
        script,
        voiceover,
        &TemplateRegistry::with_builtins(),
        opts.fallback_alignment,
    )?;

    let audio_ms = assemble::probe_audio_duration_ms(&voiceover.audio_path)
        .or(voiceover.duration_ms)
        .ok_or_else(|| {
            ScenecastError::assembly(format!(
                "could not determine duration of '{}' (ffprobe unavailable and no declared duration)",
                voiceover.audio_path.display()
            ))
        })?;
    let fit = assemble::reconcile(spec.fps, plan.total_ms, audio_ms)?;
    tracing::info!(
        scenes = plan.scenes.len(),
        timeline_ms = plan.total_ms,
        audio_ms,
        frames = fit.total_frames,
        pad = fit.pad_frames,
        "render plan ready"
    );

    let (width, height) = spec.aspect.dimensions();
    let mut assembler = FfmpegAssembler::new(AssembleConfig {
        width,
        height,
        fps: spec.fps,
        audio_path: voiceover.audio_path.clone(),
        out_path: opts.out_path.clone(),
        overwrite: opts.overwrite,
    })?;

    let mut driver = FrameCaptureDriver::new(CaptureConfig {
        fps: spec.fps,
        max_attempts: opts.max_capture_attempts,
        dump_dir: opts.dump_frames_dir.clone(),
    });

    let mut progress = opts.progress;
    let frames_total = fit.total_frames;
    let mut frames_done = 0u64;
    driver.run(
        &plan,
        fit.capture_frames,
        surface,
        &mut assembler,
        &opts.cancel,
        |phase| {
            if matches!(phase, Phase::Advancing) {
                frames_done += 1;
            }
            report(
                &mut progress,
                Progress {
                    phase: phase.clone(),
                    frames_done,
                    frames_total,
                },
            );
        },
    )?;

    assembler.pad_with_last_frame(fit.pad_frames)?;
    report(
        &mut progress,
        Progress {
            phase: Phase::Finalizing,
            frames_done: frames_total,
            frames_total,
        },
    );

    let mut out = assembler.finish(fit.total_frames)?;
    out.id = new_video_id();
    report(
        &mut progress,
        Progress {
            phase: Phase::Done,
            frames_done: frames_total,
            frames_total,
        },
    );
    tracing::info!(id = %out.id, path = %out.path.display(), "render complete");
    Ok(out)
}

/// Unique-enough artifact id: `scenecast_<hex token>_<unix seconds>`.
pub fn new_video_id() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let token = stable_hash64(now as u64, "video-id") & 0xffff_ffff;
    format!("scenecast_{token:08x}_{}", now / 1_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::WordTimestamp;
    use crate::script::Scene;
    use serde_json::json;

    fn two_scene_script() -> Script {
        Script {
            scenes: vec![
                Scene {
                    template_id: "statistic_showcase".to_string(),
                    params: json!({ "number": 73, "label": "users onboarded" }),
                    voiceover_text: "seventy three users".to_string(),
                    duration_ms: Some(3000),
                },
                Scene {
                    template_id: "key_takeaway".to_string(),
                    params: json!({ "takeaway": "Growth compounds" }),
                    voiceover_text: "growth compounds".to_string(),
                    duration_ms: Some(2000),
                },
            ],
            style: Default::default(),
            seed: 7,
        }
    }

    fn five_words() -> Vec<WordTimestamp> {
        ["seventy", "three", "users", "growth", "compounds"]
            .iter()
            .enumerate()
            .map(|(i, w)| WordTimestamp {
                word: (*w).to_string(),
                start_ms: i as u64 * 800,
                end_ms: i as u64 * 800 + 700,
            })
            .collect()
    }

    fn voiceover() -> VoiceoverTrack {
        VoiceoverTrack {
            audio_path: PathBuf::from("voice.mp3"),
            words: five_words(),
            duration_ms: Some(5000),
        }
    }

    #[test]
    fn plan_places_scenes_by_cumulative_duration() {
        let plan = build_plan(
            &two_scene_script(),
            &voiceover(),
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap();

        assert_eq!(plan.scenes.len(), 2);
        assert_eq!(plan.scenes[0].start_ms, 0);
        assert_eq!(plan.scenes[0].end_ms, 3000);
        assert_eq!(plan.scenes[1].start_ms, 3000);
        assert_eq!(plan.scenes[1].end_ms, 5000);
        assert_eq!(plan.total_ms, 5000);
        assert_eq!(plan.alignment.windows[0].word_range, 0..3);
        assert_eq!(plan.alignment.windows[1].word_range, 3..5);
    }

    #[test]
    fn plan_extends_declared_duration_to_cover_timeline() {
        let mut script = two_scene_script();
        script.scenes[1].duration_ms = Some(100); // far shorter than the build
        let plan = build_plan(
            &script,
            &voiceover(),
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap();
        let dur = plan.scenes[1].end_ms - plan.scenes[1].start_ms;
        assert_eq!(dur, plan.scenes[1].timeline.end_ms());
    }

    #[test]
    fn plan_honors_short_declared_durations_exactly() {
        // A declared duration above the timeline end but below the
        // undeclared-scene floor must come back untouched; stretching it
        // would shift every later scene against the word timestamps.
        let mut script = two_scene_script();
        let declared = 1200;
        script.scenes[1].duration_ms = Some(declared);
        let plan = build_plan(
            &script,
            &voiceover(),
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap();
        assert!(plan.scenes[1].timeline.end_ms() <= declared);
        assert_eq!(plan.scenes[1].end_ms - plan.scenes[1].start_ms, declared);
        assert_eq!(plan.total_ms, 3000 + declared);
    }

    #[test]
    fn plan_derives_duration_when_undeclared() {
        let mut script = two_scene_script();
        script.scenes[0].duration_ms = None;
        let plan = build_plan(
            &script,
            &voiceover(),
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap();
        let dur = plan.scenes[0].end_ms - plan.scenes[0].start_ms;
        assert!(dur >= MIN_SCENE_MS);
        assert!(dur >= plan.scenes[0].timeline.end_ms());
    }

    #[test]
    fn plan_fails_on_unknown_template() {
        let mut script = two_scene_script();
        script.scenes[0].template_id = "no_such_template".to_string();
        let err = build_plan(
            &script,
            &voiceover(),
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ScenecastError::TemplateParam(_)));
    }

    #[test]
    fn plan_fails_on_word_count_mismatch() {
        let mut track = voiceover();
        track.words.truncate(3);
        let err = build_plan(
            &two_scene_script(),
            &track,
            &TemplateRegistry::with_builtins(),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScenecastError::AlignmentMismatch {
                expected: 5,
                actual: 3
            }
        ));
    }

    #[test]
    fn video_ids_carry_prefix_and_differ() {
        let a = new_video_id();
        let b = new_video_id();
        assert!(a.starts_with("scenecast_"));
        // Same-nanosecond collisions are possible in theory; distinct parts
        // of the id still match the expected shape.
        assert_eq!(a.split('_').count(), 3);
        let _ = b;
    }
}
