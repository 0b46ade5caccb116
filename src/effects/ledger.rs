use super::noise::{hash2, pick};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::{hsl_to_rgb, Palette};

/// Glyphs per block, in index order.
pub(crate) const BLOCK_SIZE: usize = 16;
/// Frames each block stays "being mined".
const MINE_FRAMES: f32 = 20.0;
const HEX: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// Ledger: the art is chopped into blocks of consecutive glyphs; one block at
/// a time is highlighted and churns through hex digits as if being mined.
#[derive(Debug)]
pub struct Ledger {
    palette: Palette,
    blocks: usize,
}

impl Ledger {
    pub fn new(palette: Palette) -> Self {
        Self { palette, blocks: 1 }
    }

    pub fn active_block(&self, time: f32) -> usize {
        (time / MINE_FRAMES).floor() as usize % self.blocks.max(1)
    }
}

impl EffectStrategy for Ledger {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        p.block_index = p.index() / BLOCK_SIZE;
        self.blocks = self.blocks.max(p.block_index + 1);

        p.highlighted = p.block_index == self.active_block(ctx.time);
        if p.highlighted {
            p.ch = pick(HEX, hash2(p.index() as f32, (ctx.time / 2.0).floor()));
            p.color = self.palette.accent;
            p.bold = true;
            p.target_opacity = 1.0;
        } else {
            p.ch = p.original_ch();
            let hue = if p.block_index % 2 == 0 { 230.0 } else { 250.0 };
            p.color = hsl_to_rgb(hue, 60.0, 70.0);
            p.bold = false;
            p.target_opacity = 0.7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::vim::Mode;

    #[test]
    fn test_one_block_highlighted_at_a_time() {
        let mut ledger = Ledger::new(EffectKind::Ledger.palette());
        let mut particles: Vec<Particle> = (0..BLOCK_SIZE * 3)
            .map(|i| Particle::new('#', i as f32, 0.0, i, 0.0))
            .collect();

        // First pass teaches the strategy how many blocks exist.
        let ctx = EffectContext::frame(MINE_FRAMES * 4.0, None, Mode::Normal);
        for p in particles.iter_mut() {
            ledger.apply(p, &ctx);
        }
        for p in particles.iter_mut() {
            ledger.apply(p, &ctx);
        }

        let active = ledger.active_block(ctx.time);
        assert_eq!(active, 1);
        for p in &particles {
            assert_eq!(p.block_index, p.index() / BLOCK_SIZE);
            assert_eq!(p.highlighted, p.block_index == active);
            if !p.highlighted {
                assert_eq!(p.ch, '#');
            }
        }
    }
}
