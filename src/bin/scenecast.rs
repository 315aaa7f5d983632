use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scenecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scene script and voiceover track without rendering.
    Validate(InputArgs),
    /// Print the capture plan: scene placement, frame counts, word windows.
    Plan(PlanArgs),
    /// Emit resolved per-frame visual states as JSON lines (one per frame),
    /// for driving an external rendering surface.
    States(StatesArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Scene script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Voiceover track JSON (audio path + word timestamps).
    #[arg(long)]
    voiceover: PathBuf,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Aspect ratio: 16:9, 9:16, or 1:1.
    #[arg(long, default_value = "16:9")]
    aspect: String,

    /// Split words proportionally across scenes when token counts disagree.
    #[arg(long)]
    fallback_alignment: bool,
}

#[derive(Parser, Debug)]
struct StatesArgs {
    #[command(flatten)]
    plan: PlanArgs,

    /// First frame to emit (0-based).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Emit frames up to (but not including) this index; defaults to the
    /// full timeline.
    #[arg(long)]
    end: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Plan(args) => cmd_plan(args),
        Command::States(args) => cmd_states(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON '{}'", path.display()))
}

fn load_inputs(args: &InputArgs) -> anyhow::Result<(scenecast::Script, scenecast::VoiceoverTrack)> {
    let script: scenecast::Script = read_json(&args.script, "script")?;
    let voiceover: scenecast::VoiceoverTrack = read_json(&args.voiceover, "voiceover track")?;
    Ok((script, voiceover))
}

fn build_plan(args: &PlanArgs) -> anyhow::Result<(scenecast::RenderPlan, scenecast::CaptureSpec)> {
    let (script, voiceover) = load_inputs(&args.input)?;
    let spec = scenecast::CaptureSpec {
        fps: scenecast::Fps::new(args.fps)?,
        aspect: scenecast::AspectRatio::parse(&args.aspect)?,
    };
    spec.validate()?;
    let plan = scenecast::build_plan(
        &script,
        &voiceover,
        &scenecast::TemplateRegistry::with_builtins(),
        args.fallback_alignment,
    )?;
    Ok((plan, spec))
}

fn cmd_validate(args: InputArgs) -> anyhow::Result<()> {
    let (script, voiceover) = load_inputs(&args)?;
    script.validate()?;
    voiceover.validate()?;

    let registry = scenecast::TemplateRegistry::with_builtins();
    for (i, scene) in script.scenes.iter().enumerate() {
        let template = registry
            .get(&scene.template_id)
            .with_context(|| format!("scene {i}"))?;
        template
            .validate(&scene.params)
            .with_context(|| format!("scene {i}"))?;
    }

    eprintln!(
        "ok: {} scene(s), {} word timestamp(s)",
        script.scenes.len(),
        voiceover.words.len()
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let (plan, spec) = build_plan(&args)?;
    let (w, h) = spec.aspect.dimensions();
    println!(
        "canvas {w}x{h} @ {} fps, {} frame(s) over {} ms",
        spec.fps.0,
        spec.fps.frame_count_for(plan.total_ms),
        plan.total_ms
    );
    for (scene, window) in plan.scenes.iter().zip(&plan.alignment.windows) {
        println!(
            "  [{} .. {}) {}  words {}..{}",
            scene.start_ms,
            scene.end_ms,
            scene.template_id,
            window.word_range.start,
            window.word_range.end
        );
    }
    Ok(())
}

fn cmd_states(args: StatesArgs) -> anyhow::Result<()> {
    let (plan, spec) = build_plan(&args.plan)?;
    let total = spec.fps.frame_count_for(plan.total_ms);
    let end = args.end.unwrap_or(total).min(total);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    use std::io::Write as _;
    for k in args.start..end {
        let state = plan.frame_state(spec.fps, scenecast::FrameIndex(k))?;
        serde_json::to_writer(&mut out, &state).context("serialize frame state")?;
        writeln!(out)?;
    }
    Ok(())
}
