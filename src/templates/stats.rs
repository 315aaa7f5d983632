//! Numeric templates: single statistic, before/after comparison with a
//! computed percentage delta, multi-stat block, and the 3-metric impact
//! block. All count-ups are monotonic, integer-rounded, and land exactly on
//! their targets.

use serde::Deserialize;

use crate::{
    error::{ScenecastError, ScenecastResult},
    templates::{
        Template, TemplateCtx, motion, parse_params, require_non_empty, require_some,
    },
    timeline::TimelineModel,
};

/// Single big statistic with an animated count-up.
///
/// Optional fields and their defaults: `suffix` (none), `icon` (none),
/// `color` (style primary), `bg_color` (palette).
pub struct StatisticShowcase;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatisticParams {
    number: i64,
    label: String,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for StatisticShowcase {
    fn id(&self) -> &'static str {
        "statistic_showcase"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: StatisticParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "label", &p.label)
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: StatisticParams = parse_params(self.id(), params)?;
        require_non_empty(self.id(), "label", &p.label)?;

        let accent = p
            .color
            .clone()
            .unwrap_or_else(|| ctx.style.primary_color.clone());

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("stat-color", &accent),
            motion::fade_in("stat-value", 0, 300),
            motion::count_up("stat-value", 300, motion::COUNT_UP_MS, p.number),
            motion::hold_text("stat-label", &p.label),
            motion::fade_in("stat-label", 500, motion::ENTRANCE_MS),
            motion::slide_up("stat-label", 500, motion::ENTRANCE_MS, 24.0),
        ];
        let mut loops = Vec::new();

        if let Some(suffix) = &p.suffix {
            effects.push(motion::hold_text("stat-suffix", suffix));
            effects.push(motion::fade_in("stat-suffix", 300, motion::ENTRANCE_MS));
        }
        if let Some(icon) = &p.icon {
            effects.push(motion::hold_text("icon", icon));
            effects.push(motion::fade_in("icon", 0, motion::ENTRANCE_MS));
            effects.push(motion::pop_in("icon", 0, motion::ENTRANCE_MS));
            loops.push(motion::float_loop("icon", 8.0, 0));
        }

        Ok(TimelineModel { effects, loops })
    }
}

/// Before/after value comparison with growing bars and a computed
/// percentage delta counter.
///
/// Optional fields and their defaults: `unit` (none), `before_color`
/// (style secondary), `after_color` (style primary), `bg_color` (palette).
pub struct BeforeAfterComparison;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BeforeAfterParams {
    before_value: f64,
    after_value: f64,
    label: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    before_color: Option<String>,
    #[serde(default)]
    after_color: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl BeforeAfterParams {
    fn check(&self, id: &str) -> ScenecastResult<()> {
        require_non_empty(id, "label", &self.label)?;
        if !(self.before_value.is_finite() && self.after_value.is_finite()) {
            return Err(ScenecastError::template_param(format!(
                "{id}: before_value/after_value must be finite"
            )));
        }
        if self.before_value <= 0.0 {
            return Err(ScenecastError::template_param(format!(
                "{id}: field 'before_value' must be > 0 (delta is relative to it)"
            )));
        }
        Ok(())
    }

    /// Signed percentage change from before to after, rounded to an integer.
    fn delta_percent(&self) -> i64 {
        ((self.after_value - self.before_value) / self.before_value * 100.0).round() as i64
    }
}

impl Template for BeforeAfterComparison {
    fn id(&self) -> &'static str {
        "before_after_comparison"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: BeforeAfterParams = parse_params(self.id(), params)?;
        p.check(self.id())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        let p: BeforeAfterParams = parse_params(self.id(), params)?;
        p.check(self.id())?;

        let larger = p.before_value.max(p.after_value);
        let before_frac = p.before_value / larger;
        let after_frac = p.after_value / larger;

        let mut effects = vec![
            motion::hold_text("background", &ctx.background(p.bg_color.as_ref())),
            motion::hold_text("label", &p.label),
            motion::fade_in("label", 100, motion::ENTRANCE_MS),
            motion::hold_text(
                "before-color",
                p.before_color.as_deref().unwrap_or(&ctx.style.secondary_color),
            ),
            motion::hold_text(
                "after-color",
                p.after_color.as_deref().unwrap_or(&ctx.style.primary_color),
            ),
            motion::grow_bar("before-bar", 400, 900, before_frac),
            motion::count_up("before-value", 400, 900, p.before_value.round() as i64),
            motion::grow_bar("after-bar", 700, 900, after_frac),
            motion::count_up("after-value", 700, 900, p.after_value.round() as i64),
            motion::fade_in("delta", 1700, motion::ENTRANCE_MS),
            motion::pop_in("delta", 1700, motion::ENTRANCE_MS),
            motion::count_up("delta-value", 1700, 800, p.delta_percent()),
        ];

        if let Some(unit) = &p.unit {
            effects.push(motion::hold_text("unit", unit));
        }

        Ok(TimelineModel {
            effects,
            loops: vec![],
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatItem {
    value: i64,
    label: String,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

fn stat_item_effects(prefix: &str, index: usize, item: &StatItem, out: &mut Vec<crate::timeline::Effect>) {
    let start = motion::stagger(300, index);
    let base = format!("{prefix}-{index}");
    out.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
    out.push(motion::slide_up(&base, start, motion::ENTRANCE_MS, 40.0));
    out.push(motion::count_up(
        &format!("{base}.value"),
        start + 200,
        motion::COUNT_UP_MS,
        item.value,
    ));
    out.push(motion::hold_text(&format!("{base}.label"), &item.label));
    if let Some(suffix) = &item.suffix {
        out.push(motion::hold_text(&format!("{base}.suffix"), suffix));
    }
    if let Some(icon) = &item.icon {
        out.push(motion::hold_text(&format!("{base}.icon"), icon));
    }
}

/// Multiple stats revealed with a stagger.
///
/// Optional fields and their defaults: `title` (none), per-item `suffix`
/// and `icon` (none), `bg_color` (palette). 2 to 4 stats.
pub struct MultiStatReveal;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MultiStatParams {
    stats: Vec<StatItem>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for MultiStatReveal {
    fn id(&self) -> &'static str {
        "multi_stat_reveal"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: MultiStatParams = parse_params(self.id(), params)?;
        require_some(self.id(), "stats", 2, 4, &p.stats)?;
        for (i, s) in p.stats.iter().enumerate() {
            require_non_empty(self.id(), &format!("stats[{i}].label"), &s.label)?;
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: MultiStatParams = parse_params(self.id(), params)?;

        let mut effects = vec![motion::hold_text(
            "background",
            &ctx.background(p.bg_color.as_ref()),
        )];
        if let Some(title) = &p.title {
            effects.push(motion::hold_text("title", title));
            effects.push(motion::fade_in("title", 0, motion::ENTRANCE_MS));
        }
        for (i, item) in p.stats.iter().enumerate() {
            stat_item_effects("stat", i, item, &mut effects);
        }

        let loops = (0..p.stats.len())
            .map(|i| motion::float_loop(&format!("stat-{i}"), 6.0, (i as u64) * 400))
            .collect();

        Ok(TimelineModel { effects, loops })
    }
}

/// Exactly three impact metrics with icons.
///
/// Optional fields and their defaults: `title` (none), per-metric `suffix`
/// (none), `bg_color` (palette).
pub struct ImpactMetrics;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImpactMetricItem {
    icon: String,
    value: i64,
    label: String,
    #[serde(default)]
    suffix: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImpactMetricsParams {
    metrics: Vec<ImpactMetricItem>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    bg_color: Option<String>,
}

impl Template for ImpactMetrics {
    fn id(&self) -> &'static str {
        "impact_metrics"
    }

    fn validate(&self, params: &serde_json::Value) -> ScenecastResult<()> {
        let p: ImpactMetricsParams = parse_params(self.id(), params)?;
        require_some(self.id(), "metrics", 3, 3, &p.metrics)?;
        for (i, m) in p.metrics.iter().enumerate() {
            require_non_empty(self.id(), &format!("metrics[{i}].icon"), &m.icon)?;
            require_non_empty(self.id(), &format!("metrics[{i}].label"), &m.label)?;
        }
        Ok(())
    }

    fn build(
        &self,
        ctx: &TemplateCtx<'_>,
        params: &serde_json::Value,
    ) -> ScenecastResult<TimelineModel> {
        self.validate(params)?;
        let p: ImpactMetricsParams = parse_params(self.id(), params)?;

        let mut effects = vec![motion::hold_text(
            "background",
            &ctx.background(p.bg_color.as_ref()),
        )];
        if let Some(title) = &p.title {
            effects.push(motion::hold_text("title", title));
            effects.push(motion::fade_in("title", 0, motion::ENTRANCE_MS));
        }
        for (i, m) in p.metrics.iter().enumerate() {
            let start = motion::stagger(400, i);
            let base = format!("metric-{i}");
            effects.push(motion::hold_text(&format!("{base}.icon"), &m.icon));
            effects.push(motion::hold_text(&format!("{base}.label"), &m.label));
            if let Some(suffix) = &m.suffix {
                effects.push(motion::hold_text(&format!("{base}.suffix"), suffix));
            }
            effects.push(motion::fade_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::pop_in(&base, start, motion::ENTRANCE_MS));
            effects.push(motion::count_up(
                &format!("{base}.value"),
                start + 200,
                motion::COUNT_UP_MS,
                m.value,
            ));
        }

        let loops = (0..3)
            .map(|i| motion::pulse_loop(&format!("metric-{i}.icon"), 0.95, 1.05, i * 300))
            .collect();

        Ok(TimelineModel { effects, loops })
    }
}
