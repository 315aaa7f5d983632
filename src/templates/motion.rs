//! Shared motion vocabulary for the template builders: staggered entrances,
//! ambient float/pulse loops, count-ups, and seeded particle scatter.

use crate::{
    ease::Ease,
    timeline::{Effect, KeyValue, Keyframe, LoopEffect, LoopMode, Property},
};

pub const ENTRANCE_MS: u64 = 600;
pub const STAGGER_MS: u64 = 150;
pub const COUNT_UP_MS: u64 = 1800;
pub const FLOAT_PERIOD_MS: u64 = 3000;
pub const PULSE_PERIOD_MS: u64 = 2000;

pub fn fade_in(target: &str, start_ms: u64, dur_ms: u64) -> Effect {
    numeric(
        target,
        Property::Opacity,
        &[(start_ms, 0.0), (start_ms + dur_ms, 1.0)],
        Ease::OutQuad,
    )
}

pub fn slide_up(target: &str, start_ms: u64, dur_ms: u64, from_px: f64) -> Effect {
    numeric(
        target,
        Property::TranslateY,
        &[(start_ms, from_px), (start_ms + dur_ms, 0.0)],
        Ease::OutCubic,
    )
}

pub fn slide_in_x(target: &str, start_ms: u64, dur_ms: u64, from_px: f64) -> Effect {
    numeric(
        target,
        Property::TranslateX,
        &[(start_ms, from_px), (start_ms + dur_ms, 0.0)],
        Ease::OutExpo,
    )
}

/// Scale-overshoot entrance. Pairs with a `fade_in` on the same target.
pub fn pop_in(target: &str, start_ms: u64, dur_ms: u64) -> Effect {
    numeric(
        target,
        Property::Scale,
        &[(start_ms, 0.6), (start_ms + dur_ms, 1.0)],
        Ease::OutBack,
    )
}

/// Eased integer count-up from 0 to `value`. Monotonic by construction;
/// sampled values are rounded, so fractions are never displayed.
pub fn count_up(target: &str, start_ms: u64, dur_ms: u64, value: i64) -> Effect {
    numeric(
        target,
        Property::Counter,
        &[(start_ms, 0.0), (start_ms + dur_ms, value as f64)],
        Ease::OutCubic,
    )
}

/// Grow a horizontal bar to `to` (0..1 of its track width).
pub fn grow_bar(target: &str, start_ms: u64, dur_ms: u64, to: f64) -> Effect {
    numeric(
        target,
        Property::Scale,
        &[(start_ms, 0.0), (start_ms + dur_ms, to)],
        Ease::OutCubic,
    )
}

/// Static text content, present from scene start (entrance opacity is
/// animated separately on the same target).
pub fn hold_text(target: &str, text: &str) -> Effect {
    Effect {
        target: target.to_string(),
        property: Property::Text,
        keys: vec![Keyframe {
            offset_ms: 0,
            value: KeyValue::Text(text.to_string()),
        }],
        ease: Ease::Linear,
    }
}

pub fn numeric(target: &str, property: Property, keys: &[(u64, f64)], ease: Ease) -> Effect {
    Effect {
        target: target.to_string(),
        property,
        keys: keys
            .iter()
            .map(|&(offset_ms, v)| Keyframe {
                offset_ms,
                value: KeyValue::Number(v),
            })
            .collect(),
        ease,
    }
}

/// Gentle vertical bob, alternate/infinite. `phase_ms` staggers siblings so
/// they do not move in lockstep.
pub fn float_loop(target: &str, amplitude_px: f64, phase_ms: u64) -> LoopEffect {
    LoopEffect {
        target: target.to_string(),
        property: Property::TranslateY,
        min: -amplitude_px,
        max: amplitude_px,
        period_ms: FLOAT_PERIOD_MS,
        phase_ms,
        mode: LoopMode::Alternate,
        ease: Ease::InOutQuad,
    }
}

/// Scale pulse around rest size, alternate/infinite.
pub fn pulse_loop(target: &str, min_scale: f64, max_scale: f64, phase_ms: u64) -> LoopEffect {
    LoopEffect {
        target: target.to_string(),
        property: Property::Scale,
        min: min_scale,
        max: max_scale,
        period_ms: PULSE_PERIOD_MS,
        phase_ms,
        mode: LoopMode::Alternate,
        ease: Ease::InOutQuad,
    }
}

/// Start offset for the `i`-th element of a staggered group.
pub fn stagger(base_ms: u64, index: usize) -> u64 {
    base_ms + STAGGER_MS * index as u64
}

/// Small deterministic RNG (splitmix64) for randomized sub-elements.
/// Seeded once per scene at build time; particle placement is baked into
/// keyframes and never re-sampled during capture.
pub struct SeedRng(u64);

impl SeedRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn in_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

/// Confetti-style particle burst: each particle rises with a randomized
/// drift, fading out. All randomness is drawn up front from `rng`.
pub fn particle_burst(prefix: &str, start_ms: u64, count: usize, rng: &mut SeedRng) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(count * 3);
    for i in 0..count {
        let target = format!("{prefix}-{i}");
        let delay = start_ms + (rng.in_range(0.0, 600.0) as u64);
        let dur = 1200 + (rng.in_range(0.0, 800.0) as u64);
        let drift_x = rng.in_range(-160.0, 160.0);
        let rise_y = rng.in_range(-420.0, -180.0);
        let peak_opacity = rng.in_range(0.6, 1.0);

        effects.push(numeric(
            &target,
            Property::TranslateX,
            &[(delay, 0.0), (delay + dur, drift_x)],
            Ease::OutQuad,
        ));
        effects.push(numeric(
            &target,
            Property::TranslateY,
            &[(delay, 0.0), (delay + dur, rise_y)],
            Ease::OutCubic,
        ));
        effects.push(numeric(
            &target,
            Property::Opacity,
            &[
                (delay, 0.0),
                (delay + dur / 4, peak_opacity),
                (delay + dur, 0.0),
            ],
            Ease::Linear,
        ));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Value;

    #[test]
    fn stagger_steps_by_constant() {
        assert_eq!(stagger(200, 0), 200);
        assert_eq!(stagger(200, 3), 200 + 3 * STAGGER_MS);
    }

    #[test]
    fn count_up_hits_exact_endpoints() {
        let e = count_up("n", 0, COUNT_UP_MS, 73);
        assert_eq!(e.sample(0.0).unwrap(), Value::Integer(0));
        assert_eq!(e.sample(COUNT_UP_MS as f64).unwrap(), Value::Integer(73));
        e.validate().unwrap();
    }

    #[test]
    fn seed_rng_is_deterministic() {
        let mut a = SeedRng::new(42);
        let mut b = SeedRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let mut c = SeedRng::new(43);
        assert_ne!(SeedRng::new(42).next_u64(), c.next_u64());
    }

    #[test]
    fn seed_rng_f64_is_unit_range() {
        let mut rng = SeedRng::new(9);
        for _ in 0..64 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn particle_burst_is_reproducible_and_valid() {
        let a = particle_burst("p", 100, 12, &mut SeedRng::new(7));
        let b = particle_burst("p", 100, 12, &mut SeedRng::new(7));
        assert_eq!(a.len(), 36);
        for (ea, eb) in a.iter().zip(&b) {
            assert_eq!(ea.keys.len(), eb.keys.len());
            assert_eq!(
                ea.sample(900.0).unwrap(),
                eb.sample(900.0).unwrap(),
                "particle effects diverged for {}",
                ea.target
            );
            ea.validate().unwrap();
        }
    }

    #[test]
    fn float_loop_is_periodic() {
        let lp = float_loop("card", 12.0, 0);
        assert_eq!(lp.sample(100.0), lp.sample(100.0 + FLOAT_PERIOD_MS as f64));
    }
}
