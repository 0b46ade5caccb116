use super::noise::unit;
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

const AMPLITUDE: f32 = 0.8;
const SPATIAL_FREQ: f32 = 0.25;
const SPEED: f32 = 0.12;

/// Sine swell rolling left to right across the art.
#[derive(Debug, Default)]
pub struct Wave;

impl EffectStrategy for Wave {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let s = (p.base_x() * SPATIAL_FREQ - ctx.time * SPEED + p.phase() * 0.2).sin();
        p.offset_y = s * AMPLITUDE;
        p.offset_x = 0.0;
        p.ch = p.original_ch();
        p.color = hsl_to_rgb(195.0 + 25.0 * s, 80.0, 35.0 + 10.0 * unit(s));
        p.target_opacity = 0.6 + 0.4 * unit(s);
        p.bold = s > 0.8;
    }
}
