use ratatui::style::Color;

use super::noise::{hash2, pick};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;

const GLITCH_CHARS: &[char] = &['#', '%', '&', '@', '$', '!', '?', '*', '░', '▒', '▓', '█'];
/// Frames for the burst after activation to decay to the floor.
const DECAY_FRAMES: f32 = 300.0;
const FLOOR: f32 = 0.15;

/// Corrupted-signal effect: a strong burst on activation that settles into
/// occasional flicker. Corruption is re-rolled every other frame.
#[derive(Debug, Default)]
pub struct Glitch {
    started_at: Option<f32>,
}

impl Glitch {
    pub fn intensity(&self, time: f32) -> f32 {
        let elapsed = self.started_at.map_or(0.0, |start| (time - start).max(0.0));
        (1.0 - elapsed / DECAY_FRAMES).max(FLOOR)
    }
}

impl EffectStrategy for Glitch {
    fn activate(&mut self) {
        self.started_at = None;
    }

    fn begin_frame(&mut self, ctx: &EffectContext) {
        self.started_at.get_or_insert(ctx.time);
    }

    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let r = hash2(p.index() as f32, (ctx.time / 2.0).floor());
        let corrupted = r < self.intensity(ctx.time) * 0.5;

        if corrupted {
            let k = hash2(r, p.phase());
            p.ch = pick(GLITCH_CHARS, k);
            p.offset_x = if k < 0.5 { -1.0 } else { 1.0 };
            p.offset_y = 0.0;
            p.color = if k < 0.5 {
                Color::Rgb(255, 0, 170)
            } else {
                Color::Rgb(0, 255, 230)
            };
            p.bold = true;
            p.target_opacity = 0.6 + 0.4 * k;
        } else {
            p.ch = p.original_ch();
            p.offset_x = 0.0;
            p.offset_y = 0.0;
            p.color = Color::Rgb(0, 255, 200);
            p.bold = false;
            p.target_opacity = 0.9;
        }
    }
}
