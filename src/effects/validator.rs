use super::noise::{hash, unit};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

/// Earliest frame (after activation) a glyph can validate.
const MIN_DELAY: f32 = 8.0;
/// Spread of validation times across the art.
const SPREAD: f32 = 160.0;

/// Validation sweep: every glyph starts pending and flips to validated once
/// its own deadline passes. Deadlines come from the particle index.
#[derive(Debug, Default)]
pub struct Validator {
    started_at: Option<f32>,
}

pub(crate) fn validation_deadline(index: usize) -> f32 {
    MIN_DELAY + hash(index as f32 * 1.618) * SPREAD
}

impl EffectStrategy for Validator {
    fn activate(&mut self) {
        self.started_at = None;
    }

    fn begin_frame(&mut self, ctx: &EffectContext) {
        self.started_at.get_or_insert(ctx.time);
    }

    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let elapsed = ctx.time - *self.started_at.get_or_insert(ctx.time);
        if !p.validated && elapsed >= validation_deadline(p.index()) {
            p.validated = true;
        }

        p.ch = p.original_ch();
        if p.validated {
            p.color = hsl_to_rgb(140.0, 65.0, 55.0);
            p.target_opacity = 1.0;
            p.bold = elapsed - validation_deadline(p.index()) < 6.0;
        } else {
            let pulse = unit((ctx.time * 0.15 + p.phase()).sin());
            p.color = hsl_to_rgb(35.0, 85.0, 50.0);
            p.target_opacity = 0.35 + 0.4 * pulse;
            p.bold = false;
        }
    }
}
