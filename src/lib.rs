#![forbid(unsafe_code)]

pub mod align;
pub mod assemble;
pub mod capture;
pub mod core;
pub mod ease;
pub mod error;
pub mod pipeline;
pub mod script;
pub mod templates;
pub mod timeline;

pub use align::{Alignment, SceneSpan, SceneWindow, VoiceoverTrack, WordTimestamp, tokenize};
pub use assemble::{AssembleConfig, FfmpegAssembler, OutputVideo, Reconciled, reconcile};
pub use capture::{
    CancelToken, CaptureConfig, FrameCaptureDriver, FrameSink, FrameState, Phase, PixelBuffer,
    RenderPlan, RenderSurface, RenderedFrame, ScenePlan, SubtitleState,
};
pub use core::{AspectRatio, CaptureSpec, Fps, FrameIndex, stable_hash64};
pub use ease::Ease;
pub use error::{ScenecastError, ScenecastResult};
pub use pipeline::{Progress, RenderOpts, build_plan, render_video};
pub use script::{Scene, Script, StyleConfig};
pub use templates::{Template, TemplateCtx, TemplateRegistry};
pub use timeline::{
    Effect, Keyframe, LoopEffect, LoopMode, Property, ResolvedEffect, TimelineModel, Value,
};
