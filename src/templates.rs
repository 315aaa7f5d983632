//! Animation template registry: a fixed catalog of parameterized scene
//! builders, each mapping structured scene data into a [`TimelineModel`].
//!
//! Templates are pure: no I/O, no ambient randomness. Randomized
//! sub-elements draw from a per-scene seed provided in [`TemplateCtx`].

pub mod lists;
pub mod motion;
pub mod stats;
pub mod titles;

use std::collections::BTreeMap;

use crate::{
    core::stable_hash64,
    error::{ScenecastError, ScenecastResult},
    script::StyleConfig,
    timeline::TimelineModel,
};

/// Build-time context shared by all templates: injected styling constants
/// plus the per-scene determinism seed.
pub struct TemplateCtx<'a> {
    pub scene_index: usize,
    pub style: &'a StyleConfig,
    pub seed: u64,
}

impl<'a> TemplateCtx<'a> {
    pub fn new(scene_index: usize, style: &'a StyleConfig, script_seed: u64) -> Self {
        Self {
            scene_index,
            style,
            seed: stable_hash64(script_seed, &format!("scene-{scene_index}")),
        }
    }

    /// Background color: explicit param wins, otherwise the scene's slot in
    /// the rotating dark palette.
    pub fn background(&self, explicit: Option<&String>) -> String {
        explicit
            .cloned()
            .unwrap_or_else(|| self.style.background_for(self.scene_index).to_string())
    }
}

pub trait Template: Send + Sync {
    fn id(&self) -> &'static str;

    /// Check params against the declared shape without building. Fails with
    /// a `TemplateParam` error naming the missing/invalid field; required
    /// fields are never silently defaulted.
    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()>;

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel>;
}

/// Deserialize a template's param struct, attributing failures to the
/// template so the caller sees which field was missing or invalid.
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(
    template_id: &str,
    params: &serde_json::Value,
) -> ScenecastResult<T> {
    serde_json::from_value(params.clone())
        .map_err(|e| ScenecastError::template_param(format!("{template_id}: {e}")))
}

pub(crate) fn require_non_empty(
    template_id: &str,
    field: &str,
    value: &str,
) -> ScenecastResult<()> {
    if value.trim().is_empty() {
        return Err(ScenecastError::template_param(format!(
            "{template_id}: field '{field}' must be non-empty"
        )));
    }
    Ok(())
}

pub(crate) fn require_some<T>(
    template_id: &str,
    field: &str,
    min: usize,
    max: usize,
    items: &[T],
) -> ScenecastResult<()> {
    if items.len() < min || items.len() > max {
        return Err(ScenecastError::template_param(format!(
            "{template_id}: field '{field}' must have {min}..={max} entries, got {}",
            items.len()
        )));
    }
    Ok(())
}

pub struct TemplateRegistry {
    templates: BTreeMap<&'static str, Box<dyn Template>>,
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// The full built-in catalog (13 templates).
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        let builtins: Vec<Box<dyn Template>> = vec![
            Box::new(titles::HeroTitleReveal),
            Box::new(titles::KeyTakeaway),
            Box::new(titles::QuoteReveal),
            Box::new(titles::CallToAction),
            Box::new(titles::CelebrationFinale),
            Box::new(stats::StatisticShowcase),
            Box::new(stats::BeforeAfterComparison),
            Box::new(stats::MultiStatReveal),
            Box::new(stats::ImpactMetrics),
            Box::new(lists::BulletPointList),
            Box::new(lists::IconGridReveal),
            Box::new(lists::ProcessFlow),
            Box::new(lists::ConceptShowcase),
        ];
        for t in builtins {
            reg.register(t)
                .expect("built-in template ids are unique");
        }
        reg
    }

    pub fn register(&mut self, template: Box<dyn Template>) -> ScenecastResult<()> {
        let id = template.id();
        if self.templates.contains_key(id) {
            return Err(ScenecastError::validation(format!(
                "duplicate template id '{id}'"
            )));
        }
        self.templates.insert(id, template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> ScenecastResult<&dyn Template> {
        self.templates
            .get(id)
            .map(|t| t.as_ref())
            .ok_or_else(|| {
                ScenecastError::template_param(format!("unknown template id '{id}'"))
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.keys().copied()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
