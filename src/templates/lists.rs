//! Collection templates: bulleted list, icon grid, sequential process flow,
//! and the multi-concept showcase with floating cards.

use serde::Deserialize;

use crate::{
    error::{ScenecastError, ScenecastResult},
    templates::{
        Template, TemplateCtx, motion, parse_params, require_non_empty, require_some,
    },
    timeline::TimelineModel,
};

/// List with per-item icons, revealed top to bottom.
///
/// Optional fields and their defaults: `icons` (no icons rendered; when
/// present must match `items` length), `bg_color` (palette). 2 to 6 items.
pub struct BulletPointList;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BulletListParams {
    title: String,
    items: Vec<String>,
    #[serde(default)]
    icons: Option<Vec<String>>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl BulletListParams {
    fn check(&self, id: &str) -> ScenecastResult<()> {
        require_non_empty(id, "title", &self.title)?;
        require_some(id, "items", 2, 6, &self.items)?;
        if let Some(icons) = &self.icons
            && icons.len() != self.items.len()
        {
            return Err(ScenecastError::template_param(format!(
                "{id}: field 'icons' must match items length ({} != {})",
                icons.len(),
                self.items.len()
            )));
        }
        Ok(())
    }
}

impl Template for BulletPointList {
    fn id(&self) -> &'static str {
        "bullet_point_list"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: BulletListParams = parse_params(self.id(), params)?;
        p.check(self.id())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: BulletListParams = parse_params(self.id(), params)?;
        p.check(self.id())?;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("title", &p.title),
            motion::fade_in("title", 0, motion::ENTRANCE_MS),
            motion::slide_up("title", 0, motion::ENTRANCE_MS, 30.0),
        ];

        for (i, item) in p.items.iter().enumerate() {
            let start = motion::stagger(500, i);
            let base = format!("item-{i}");
            effects.push(motion::hold_text(&format!("{base}.text"), item));
            if let Some(icons) = &p.icons {
                effects.push(motion::hold_text(&format!("{base}.icon"), &icons[i]));
            }
            effects.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::slide_in_x(&base, start, motion::ENTRANCE_MS, -60.0));
        }

        Ok(TimelineModel {
            effects,
            loops: vec![],
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IconItem {
    icon: String,
    label: String,
}

/// Grid of concept icons.
///
/// Optional fields and their defaults: `title` (none), `columns` (2),
/// `bg_color` (palette). 2 to 8 items; columns 1 to 4.
pub struct IconGridReveal;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IconGridParams {
    items: Vec<IconItem>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default = "default_columns")]
    columns: u32,
    #[serde(default)]
    bg_color: Option<String>,
}

fn default_columns() -> u32 {
    2
}

impl Template for IconGridReveal {
    fn id(&self) -> &'static str {
        "icon_grid_reveal"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: IconGridParams = parse_params(self.id(), params)?;
        require_some(self.id(), "items", 2, 8, &p.items)?;
        if !(1..=4).contains(&p.columns) {
            return Err(ScenecastError::template_param(format!(
                "{}: field 'columns' must be 1..=4, got {}",
                self.id(),
                p.columns
            )));
        }
        for (i, item) in p.items.iter().enumerate() {
            require_non_empty(self.id(), &format!("items[{i}].icon"), &item.icon)?;
            require_non_empty(self.id(), &format!("items[{i}].label"), &item.label)?;
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: IconGridParams = parse_params(self.id(), params)?;

        let mut effects = vec![motion::hold_text(
            "background",
            &ctx.background(p.bg_color.as_ref()),
        )];
        if let Some(title) = &p.title {
            effects.push(motion::hold_text("title", title));
            effects.push(motion::fade_in("title", 0, motion::ENTRANCE_MS));
        }

        let mut loops = Vec::new();
        for (i, item) in p.items.iter().enumerate() {
            let start = motion::stagger(400, i);
            let base = format!("cell-{i}");
            effects.push(motion::hold_text(&format!("{base}.icon"), &item.icon));
            effects.push(motion::hold_text(&format!("{base}.label"), &item.label));
            effects.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::pop_in(&base, start, motion::ENTRANCE_MS));
            loops.push(motion::float_loop(&base, 5.0, (i as u64) * 250));
        }

        Ok(TimelineModel { effects, loops })
    }
}

/// Sequential workflow steps connected left to right, each step revealed
/// after the previous one.
///
/// Optional fields and their defaults: `title` (none), `bg_color`
/// (palette). 2 to 5 steps.
pub struct ProcessFlow;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcessFlowParams {
    steps: Vec<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for ProcessFlow {
    fn id(&self) -> &'static str {
        "process_flow"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: ProcessFlowParams = parse_params(self.id(), params)?;
        require_some(self.id(), "steps", 2, 5, &p.steps)?;
        for (i, step) in p.steps.iter().enumerate() {
            require_non_empty(self.id(), &format!("steps[{i}]"), step)?;
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: ProcessFlowParams = parse_params(self.id(), params)?;

        let mut effects = vec![motion::hold_text(
            "background",
            &ctx.background(p.bg_color.as_ref()),
        )];
        if let Some(title) = &p.title {
            effects.push(motion::hold_text("title", title));
            effects.push(motion::fade_in("title", 0, motion::ENTRANCE_MS));
        }

        // Steps reveal sequentially; each connector grows after its step.
        const STEP_GAP_MS: u64 = 500;
        for (i, step) in p.steps.iter().enumerate() {
            let start = 300 + STEP_GAP_MS * i as u64;
            let base = format!("step-{i}");
            effects.push(motion::hold_text(
                &format!("{base}.number"),
                &(i + 1).to_string(),
            ));
            effects.push(motion::hold_text(&format!("{base}.text"), step));
            effects.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::pop_in(&base, start, motion::ENTRANCE_MS));
            if i + 1 < p.steps.len() {
                effects.push(motion::grow_bar(
                    &format!("connector-{i}"),
                    start + 300,
                    STEP_GAP_MS - 100,
                    1.0,
                ));
            }
        }

        Ok(TimelineModel {
            effects,
            loops: vec![],
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConceptItem {
    icon: String,
    label: String,
    #[serde(default)]
    description: Option<String>,
}

/// 2 to 5 key concepts as floating cards.
///
/// Optional fields and their defaults: `title` (none), per-concept
/// `description` (none), `bg_color` (palette).
pub struct ConceptShowcase;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConceptShowcaseParams {
    concepts: Vec<ConceptItem>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for ConceptShowcase {
    fn id(&self) -> &'static str {
        "concept_showcase"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: ConceptShowcaseParams = parse_params(self.id(), params)?;
        require_some(self.id(), "concepts", 2, 5, &p.concepts)?;
        for (i, c) in p.concepts.iter().enumerate() {
            require_non_empty(self.id(), &format!("concepts[{i}].icon"), &c.icon)?;
            require_non_empty(self.id(), &format!("concepts[{i}].label"), &c.label)?;
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: ConceptShowcaseParams = parse_params(self.id(), params)?;

        let mut effects = vec![motion::hold_text(
            "background",
            &ctx.background(p.bg_color.as_ref()),
        )];
        if let Some(title) = &p.title {
            effects.push(motion::hold_text("title", title));
            effects.push(motion::fade_in("title", 0, motion::ENTRANCE_MS));
            effects.push(motion::slide_up("title", 0, motion::ENTRANCE_MS, 24.0));
        }

        let mut loops = Vec::new();
        for (i, c) in p.concepts.iter().enumerate() {
            let start = motion::stagger(500, i);
            let base = format!("card-{i}");
            effects.push(motion::hold_text(&format!("{base}.icon"), &c.icon));
            effects.push(motion::hold_text(&format!("{base}.label"), &c.label));
            if let Some(desc) = &c.description {
                effects.push(motion::hold_text(&format!("{base}.description"), desc));
            }
            effects.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::slide_up(&base, start, motion::ENTRANCE_MS, 80.0));
            effects.push(motion::pop_in(&base, start, motion::ENTRANCE_MS));
            loops.push(motion::float_loop(&base, 8.0, (i as u64) * 350));
        }

        Ok(TimelineModel { effects, loops })
    }
}
