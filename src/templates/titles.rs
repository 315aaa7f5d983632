//! Title-centric templates: opening reveal, takeaway, quote, call to action,
//! and the celebratory finale with its seeded particle burst.

use serde::Deserialize;

use crate::{
    error::ScenecastResult,
    templates::{
        Template, TemplateCtx, motion, parse_params, require_non_empty,
    },
    timeline::TimelineModel,
};

/// Opening scenes and big announcements.
///
/// Optional fields and their defaults: `icon` (none rendered), `bg_color`
/// (scene slot in the rotating dark palette).
pub struct HeroTitleReveal;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeroTitleParams {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for HeroTitleReveal {
    fn id(&self) -> &'static str {
        "hero_title_reveal"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: HeroTitleParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "title", &p.title)
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: HeroTitleParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "title", &p.title)?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("title", &p.title),
            motion::fade_in("title", 200, motion::ENTRANCE_MS),
            motion::slide_up("title", 200, motion::ENTRANCE_MS, 60.0),
            motion::pop_in("title", 200, motion::ENTRANCE_MS),
        ];
        let mut loops = Vec::new();

        if let Some(subtitle) = &p.subtitle {
            effects.push(motion::hold_text("subtitle", subtitle));
            effects.push(motion::fade_in("subtitle", 700, motion::ENTRANCE_MS));
            effects.push(motion::slide_up("subtitle", 700, motion::ENTRANCE_MS, 30.0));
        }
        if let Some(icon) = &p.icon {
            effects.push(motion::hold_text("icon", icon));
            effects.push(motion::fade_in("icon", 0, motion::ENTRANCE_MS));
            effects.push(motion::pop_in("icon", 0, motion::ENTRANCE_MS));
            loops.push(motion::float_loop("icon", 10.0, 0));
        }

        Ok(TimelineModel { effects, loops })
    }
}

/// Single important message or conclusion.
///
/// Optional fields and their defaults: `icon` (none), `bg_color` (palette).
pub struct KeyTakeaway;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyTakeawayParams {
    takeaway: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for KeyTakeaway {
    fn id(&self) -> &'static str {
        "key_takeaway"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: KeyTakeawayParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "takeaway", &p.takeaway)
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: KeyTakeawayParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "takeaway", &p.takeaway)?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("takeaway", &p.takeaway),
            motion::fade_in("takeaway", 300, 800),
            motion::slide_up("takeaway", 300, 800, 40.0),
        ];
        let mut loops = Vec::new();

        if let Some(icon) = &p.icon {
            effects.push(motion::hold_text("icon", icon));
            effects.push(motion::fade_in("icon", 0, motion::ENTRANCE_MS));
            effects.push(motion::pop_in("icon", 0, motion::ENTRANCE_MS));
            loops.push(motion::pulse_loop("icon", 0.95, 1.05, 0));
        }

        Ok(TimelineModel { effects, loops })
    }
}

/// Quotation with attribution.
///
/// Optional fields and their defaults: `author` (unattributed), `bg_color`
/// (palette).
pub struct QuoteReveal;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuoteParams {
    quote: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for QuoteReveal {
    fn id(&self) -> &'static str {
        "quote_reveal"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: QuoteParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "quote", &p.quote)
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: QuoteParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "quote", &p.quote)?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("quote-mark", "\u{201c}"),
            motion::fade_in("quote-mark", 0, 400),
            motion::pop_in("quote-mark", 0, 400),
            motion::hold_text("quote", &p.quote),
            motion::fade_in("quote", 300, 900),
            motion::slide_up("quote", 300, 900, 30.0),
        ];

        if let Some(author) = &p.author {
            effects.push(motion::hold_text("author", author));
            effects.push(motion::fade_in("author", 1100, motion::ENTRANCE_MS));
            effects.push(motion::slide_in_x("author", 1100, motion::ENTRANCE_MS, -40.0));
        }

        Ok(TimelineModel {
            effects,
            loops: vec![],
        })
    }
}

/// Ending scenes and engagement prompts.
///
/// Optional fields and their defaults: `subtext` (none), `icon` (none),
/// `bg_color` (palette).
pub struct CallToAction;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CallToActionParams {
    question: String,
    #[serde(default)]
    subtext: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for CallToAction {
    fn id(&self) -> &'static str {
        "call_to_action"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: CallToActionParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "question", &p.question)
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: CallToActionParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "question", &p.question)?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("question", &p.question),
            motion::fade_in("question", 200, 700),
            motion::slide_up("question", 200, 700, 50.0),
        ];
        let mut loops = Vec::new();

        if let Some(subtext) = &p.subtext {
            effects.push(motion::hold_text("subtext", subtext));
            effects.push(motion::fade_in("subtext", 900, motion::ENTRANCE_MS));
        }
        if let Some(icon) = &p.icon {
            effects.push(motion::hold_text("icon", icon));
            effects.push(motion::fade_in("icon", 600, motion::ENTRANCE_MS));
            effects.push(motion::pop_in("icon", 600, motion::ENTRANCE_MS));
            loops.push(motion::pulse_loop("icon", 0.92, 1.08, 500));
        }

        Ok(TimelineModel { effects, loops })
    }
}

/// Final celebration scene with a confetti burst. The burst is randomized
/// per scene but seeded from the build context, so identical inputs always
/// yield identical particle paths.
///
/// Optional fields and their defaults: `subtitle` (none), `bg_color`
/// (palette), `particle_count` (24).
pub struct CelebrationFinale;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CelebrationParams {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
    #[serde(default = "default_particle_count")]
    particle_count: usize,
}

fn default_particle_count() -> usize {
    24
}

impl Template for CelebrationFinale {
    fn id(&self) -> &'static str {
        "celebration_finale"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: CelebrationParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "title", &p.title)?;
        if p.particle_count == 0 || p.particle_count > 200 {
            return Err(crate::error::ScenecastError::template_param(format!(
                "{}: field 'particle_count' must be 1..=200, got {}",
                self.id(),
                p.particle_count
            )));
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: CelebrationParams = parse_params(self.id(), params)?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("title", &p.title),
            motion::fade_in("title", 200, motion::ENTRANCE_MS),
            motion::pop_in("title", 200, motion::ENTRANCE_MS),
        ];

        if let Some(subtitle) = &p.subtitle {
            effects.push(motion::hold_text("subtitle", subtitle));
            effects.push(motion::fade_in("subtitle", 800, motion::ENTRANCE_MS));
            effects.push(motion::slide_up("subtitle", 800, motion::ENTRANCE_MS, 24.0));
        }

        let mut rng = motion::SeedRng::new(ctx.seed);
        effects.extend(motion::particle_burst(
            "particle",
            400,
            p.particle_count,
            &mut rng,
        ));

        Ok(TimelineModel {
            effects,
            loops: vec![motion::pulse_loop("title", 0.98, 1.02, 0)],
        })
    }
}
