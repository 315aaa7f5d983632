use crate::{
    ease::Ease,
    error::{ScenecastError, ScenecastResult},
};

/// The declarative contract every scene template builds into: a set of
/// time-bounded effects plus time-periodic ambient loops, all scene-relative.
///
/// A model is immutable once built; sampling it at the same instant always
/// yields the same values.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimelineModel {
    pub effects: Vec<Effect>,
    pub loops: Vec<LoopEffect>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Effect {
    /// Selector naming the visual element this effect drives.
    pub target: String,
    pub property: Property,
    pub keys: Vec<Keyframe>, // offsets non-decreasing
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Property {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
    Rotation,
    /// Animated integer count-up; sampled values are rounded to the nearest
    /// integer so a fractional intermediate is never displayed.
    Counter,
    /// Discrete text swaps; always hold semantics.
    Text,
}

impl Property {
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub offset_ms: u64,
    pub value: KeyValue,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum KeyValue {
    Number(f64),
    Text(String),
}

/// A fully resolved effect value at one sampled instant.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum Value {
    Number(f64),
    Integer(i64),
    Text(String),
}

/// Continuous ambient animation (float/pulse) with no end time. Evaluated as
/// a pure function of `t mod period` so capture stays deterministic.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoopEffect {
    pub target: String,
    pub property: Property,
    pub min: f64,
    pub max: f64,
    pub period_ms: u64,
    pub phase_ms: u64,
    pub mode: LoopMode,
    pub ease: Ease,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoopMode {
    /// Ping-pong between min and max ("alternate, infinite").
    Alternate,
    /// Jump back to min at each period boundary.
    Repeat,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedEffect {
    pub target: String,
    pub property: Property,
    pub value: Value,
}

impl Effect {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.target.trim().is_empty() {
            return Err(ScenecastError::validation("effect target must be non-empty"));
        }
        if self.keys.is_empty() {
            return Err(ScenecastError::validation(format!(
                "effect on '{}' must have at least one keyframe",
                self.target
            )));
        }
        if !self
            .keys
            .windows(2)
            .all(|w| w[0].offset_ms <= w[1].offset_ms)
        {
            return Err(ScenecastError::validation(format!(
                "effect on '{}' has keyframe offsets out of order",
                self.target
            )));
        }
        for key in &self.keys {
            match (&key.value, self.property.is_numeric()) {
                (KeyValue::Number(v), true) => {
                    if !v.is_finite() {
                        return Err(ScenecastError::validation(format!(
                            "effect on '{}' has a non-finite keyframe value",
                            self.target
                        )));
                    }
                }
                (KeyValue::Text(_), false) => {}
                _ => {
                    return Err(ScenecastError::validation(format!(
                        "effect on '{}' mixes value kind with property {:?}",
                        self.target, self.property
                    )));
                }
            }
        }
        if self.property == Property::Counter && !self.ease.is_monotonic() {
            return Err(ScenecastError::validation(format!(
                "counter effect on '{}' requires a monotonic ease",
                self.target
            )));
        }
        Ok(())
    }

    pub fn end_ms(&self) -> u64 {
        self.keys.last().map(|k| k.offset_ms).unwrap_or(0)
    }

    /// Sample at a scene-relative instant. Holds the first key before the
    /// effect starts and the last key after it ends.
    pub fn sample(&self, t_ms: f64) -> ScenecastResult<Value> {
        let idx = self.keys.partition_point(|k| (k.offset_ms as f64) <= t_ms);

        let raw = if idx == 0 {
            self.keys[0].value.clone()
        } else if idx >= self.keys.len() {
            self.keys[self.keys.len() - 1].value.clone()
        } else {
            let a = &self.keys[idx - 1];
            let b = &self.keys[idx];
            match (&a.value, &b.value) {
                (KeyValue::Number(va), KeyValue::Number(vb)) => {
                    let denom = b.offset_ms.saturating_sub(a.offset_ms);
                    if denom == 0 {
                        KeyValue::Number(*va)
                    } else {
                        let t = (t_ms - a.offset_ms as f64) / (denom as f64);
                        let te = self.ease.apply(t);
                        KeyValue::Number(va + (vb - va) * te)
                    }
                }
                // Text always holds the previous key.
                _ => a.value.clone(),
            }
        };

        match (raw, self.property) {
            (KeyValue::Number(v), Property::Counter) => Ok(Value::Integer(v.round() as i64)),
            (KeyValue::Number(v), _) => Ok(Value::Number(v)),
            (KeyValue::Text(s), Property::Text) => Ok(Value::Text(s)),
            (KeyValue::Text(_), p) => Err(ScenecastError::validation(format!(
                "text keyframe under numeric property {p:?} on '{}'",
                self.target
            ))),
        }
    }
}

impl LoopEffect {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.target.trim().is_empty() {
            return Err(ScenecastError::validation("loop target must be non-empty"));
        }
        if self.period_ms == 0 {
            return Err(ScenecastError::validation(format!(
                "loop on '{}' must have period > 0",
                self.target
            )));
        }
        if !self.property.is_numeric() {
            return Err(ScenecastError::validation(format!(
                "loop on '{}' must drive a numeric property",
                self.target
            )));
        }
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(ScenecastError::validation(format!(
                "loop on '{}' has non-finite bounds",
                self.target
            )));
        }
        Ok(())
    }

    pub fn sample(&self, t_ms: f64) -> f64 {
        let period = self.period_ms as f64;
        let t = (t_ms + self.phase_ms as f64).rem_euclid(period);
        let pos = t / period; // 0..1 within the period
        let t_shaped = match self.mode {
            LoopMode::Repeat => pos,
            LoopMode::Alternate => {
                // Triangle wave: min -> max over the first half, back over the second.
                if pos < 0.5 { pos * 2.0 } else { 2.0 - pos * 2.0 }
            }
        };
        self.min + (self.max - self.min) * self.ease.apply(t_shaped)
    }
}

impl TimelineModel {
    pub fn empty() -> Self {
        Self {
            effects: Vec::new(),
            loops: Vec::new(),
        }
    }

    pub fn validate(&self) -> ScenecastResult<()> {
        for effect in &self.effects {
            effect.validate()?;
        }
        for lp in &self.loops {
            lp.validate()?;
        }
        Ok(())
    }

    /// Latest scheduled (non-looping) effect end, in ms.
    pub fn end_ms(&self) -> u64 {
        self.effects.iter().map(Effect::end_ms).max().unwrap_or(0)
    }

    /// Resolve every effect and loop at a scene-relative instant.
    pub fn sample_at(&self, t_ms: f64) -> ScenecastResult<Vec<ResolvedEffect>> {
        let mut out = Vec::with_capacity(self.effects.len() + self.loops.len());
        for effect in &self.effects {
            out.push(ResolvedEffect {
                target: effect.target.clone(),
                property: effect.property,
                value: effect.sample(t_ms)?,
            });
        }
        for lp in &self.loops {
            out.push(ResolvedEffect {
                target: lp.target.clone(),
                property: lp.property,
                value: Value::Number(lp.sample(t_ms)),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade(target: &str, start: u64, end: u64) -> Effect {
        Effect {
            target: target.to_string(),
            property: Property::Opacity,
            keys: vec![
                Keyframe {
                    offset_ms: start,
                    value: KeyValue::Number(0.0),
                },
                Keyframe {
                    offset_ms: end,
                    value: KeyValue::Number(1.0),
                },
            ],
            ease: Ease::Linear,
        }
    }

    fn counter(target: u64, start: u64, end: u64) -> Effect {
        Effect {
            target: "counter".to_string(),
            property: Property::Counter,
            keys: vec![
                Keyframe {
                    offset_ms: start,
                    value: KeyValue::Number(0.0),
                },
                Keyframe {
                    offset_ms: end,
                    value: KeyValue::Number(target as f64),
                },
            ],
            ease: Ease::OutCubic,
        }
    }

    #[test]
    fn numeric_sampling_holds_outside_keys() {
        let e = fade("hero", 200, 700);
        assert_eq!(e.sample(0.0).unwrap(), Value::Number(0.0));
        assert_eq!(e.sample(700.0).unwrap(), Value::Number(1.0));
        assert_eq!(e.sample(5000.0).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn numeric_sampling_interpolates_between_keys() {
        let e = fade("hero", 0, 1000);
        assert_eq!(e.sample(500.0).unwrap(), Value::Number(0.5));
    }

    #[test]
    fn counter_is_integer_and_exact_at_endpoints() {
        let e = counter(73, 0, 1800);
        assert_eq!(e.sample(0.0).unwrap(), Value::Integer(0));
        assert_eq!(e.sample(1800.0).unwrap(), Value::Integer(73));
        assert_eq!(e.sample(9999.0).unwrap(), Value::Integer(73));
        for step in 0..=180 {
            let Value::Integer(_) = e.sample(step as f64 * 10.0).unwrap() else {
                panic!("counter produced a non-integer sample");
            };
        }
    }

    #[test]
    fn counter_never_steps_backwards() {
        let e = counter(73, 0, 1800);
        let mut prev = i64::MIN;
        for step in 0..=200 {
            let Value::Integer(v) = e.sample(step as f64 * 10.0).unwrap() else {
                unreachable!()
            };
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn counter_rejects_non_monotonic_ease() {
        let mut e = counter(10, 0, 500);
        e.ease = Ease::OutBack;
        assert!(e.validate().is_err());
    }

    #[test]
    fn text_holds_previous_key() {
        let e = Effect {
            target: "label".to_string(),
            property: Property::Text,
            keys: vec![
                Keyframe {
                    offset_ms: 0,
                    value: KeyValue::Text("one".to_string()),
                },
                Keyframe {
                    offset_ms: 1000,
                    value: KeyValue::Text("two".to_string()),
                },
            ],
            ease: Ease::Linear,
        };
        assert_eq!(e.sample(500.0).unwrap(), Value::Text("one".to_string()));
        assert_eq!(e.sample(1000.0).unwrap(), Value::Text("two".to_string()));
    }

    #[test]
    fn out_of_order_keys_are_rejected() {
        let mut e = fade("hero", 0, 1000);
        e.keys.swap(0, 1);
        assert!(e.validate().is_err());
    }

    #[test]
    fn loop_alternate_ping_pongs() {
        let lp = LoopEffect {
            target: "card".to_string(),
            property: Property::TranslateY,
            min: -10.0,
            max: 10.0,
            period_ms: 2000,
            phase_ms: 0,
            mode: LoopMode::Alternate,
            ease: Ease::Linear,
        };
        assert_eq!(lp.sample(0.0), -10.0);
        assert_eq!(lp.sample(1000.0), 10.0);
        assert_eq!(lp.sample(2000.0), -10.0);
        // Same instant mod period => same value, regardless of which cycle.
        assert_eq!(lp.sample(500.0), lp.sample(2500.0));
        assert_eq!(lp.sample(500.0), lp.sample(20_500.0));
    }

    #[test]
    fn loop_repeat_restarts_each_period() {
        let lp = LoopEffect {
            target: "spinner".to_string(),
            property: Property::Rotation,
            min: 0.0,
            max: 360.0,
            period_ms: 1000,
            phase_ms: 0,
            mode: LoopMode::Repeat,
            ease: Ease::Linear,
        };
        assert_eq!(lp.sample(0.0), 0.0);
        assert_eq!(lp.sample(500.0), 180.0);
        assert_eq!(lp.sample(1000.0), 0.0);
    }

    #[test]
    fn model_end_ms_is_longest_effect_end() {
        let model = TimelineModel {
            effects: vec![fade("a", 0, 800), fade("b", 100, 2600)],
            loops: vec![],
        };
        assert_eq!(model.end_ms(), 2600);
        assert_eq!(TimelineModel::empty().end_ms(), 0);
    }
}
