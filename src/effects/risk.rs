use super::noise::{hash2, unit};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

/// Frames between risk re-assessments.
const ASSESS_EVERY: f32 = 60.0;
pub(crate) const MAX_RISK: u8 = 3;

/// Risk heat map: every glyph gets a risk level 0..=3 that is re-rolled
/// periodically; critical glyphs pulse.
#[derive(Debug, Default)]
pub struct RiskMap;

pub(crate) fn risk_level(index: usize, time: f32) -> u8 {
    let bucket = (time / ASSESS_EVERY).floor();
    let r = hash2(index as f32, bucket);
    // Skewed toward low risk.
    ((r * r * (MAX_RISK as f32 + 1.0)) as u8).min(MAX_RISK)
}

impl EffectStrategy for RiskMap {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        p.risk_level = risk_level(p.index(), ctx.time);
        p.ch = p.original_ch();

        let hue = match p.risk_level {
            0 => 120.0,
            1 => 60.0,
            2 => 30.0,
            _ => 0.0,
        };
        p.color = hsl_to_rgb(hue, 80.0, 50.0);

        if p.risk_level >= MAX_RISK {
            let pulse = unit((ctx.time * 0.3 + p.phase()).sin());
            p.target_opacity = 0.6 + 0.4 * pulse;
            p.bold = pulse > 0.5;
        } else {
            p.target_opacity = 0.55 + 0.1 * p.risk_level as f32;
            p.bold = false;
        }
    }
}
