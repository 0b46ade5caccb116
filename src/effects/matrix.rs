use std::f32::consts::TAU;

use super::noise::{hash2, pick};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

const GLYPHS: &[char] = &[
    'ｱ', 'ｲ', 'ｳ', 'ｴ', 'ｵ', 'ｶ', 'ｷ', 'ｸ', 'ｹ', 'ｺ', '0', '1', '2', '3', '4', '5', '7', '9', 'Z',
    ':', '=', '*', '+', '<', '>', '|',
];

/// Frames for one full fall cycle of a glyph.
const PERIOD: f32 = 48.0;
/// Fraction of the cycle spent as the bright head.
const HEAD: f32 = 0.12;
const MIN_OPACITY: f32 = 0.15;

/// Falling glyph rain: each particle cycles through random glyphs as the
/// "head" of a drop passes it, then fades back into its own character.
#[derive(Debug, Default)]
pub struct MatrixRain;

impl EffectStrategy for MatrixRain {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        // Drops fall down columns: rows further down light up later.
        let shift = p.phase() / TAU * PERIOD - p.base_y() * 2.0;
        let pos = (ctx.time + shift).rem_euclid(PERIOD) / PERIOD;
        let seed = p.index() as f32;

        if pos < HEAD {
            p.ch = pick(GLYPHS, hash2(seed, (ctx.time / 3.0).floor()));
            p.color = hsl_to_rgb(120.0, 60.0, 85.0);
            p.target_opacity = 1.0;
            p.bold = true;
        } else {
            let trail = (pos - HEAD) / (1.0 - HEAD);
            p.ch = if trail < 0.35 {
                pick(GLYPHS, hash2(seed, (ctx.time / 6.0).floor() + 101.0))
            } else {
                p.original_ch()
            };
            p.color = hsl_to_rgb(120.0, 90.0, 55.0 - 30.0 * trail);
            p.target_opacity = (1.0 - trail).max(MIN_OPACITY);
            p.bold = false;
        }
    }
}
