use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::Palette;
use crate::vim::Mode;

/// Glyphs revealed per frame while typing.
const TYPE_SPEED: f32 = 0.6;
/// Extra cursor travel past the last glyph before a pass "compiles".
const COMPILE_PAUSE: f32 = 24.0;
/// Untyped glyphs stay faintly visible.
const GHOST_OPACITY: f32 = 0.06;

/// Typing reveal. In insert mode a cursor walks the art in index order and
/// only glyphs behind it are shown; every full pass bumps the compilation
/// phase, which flips the settled colour.
#[derive(Debug)]
pub struct Typewriter {
    palette: Palette,
    cursor: f32,
    last_index: usize,
    compile_phase: u32,
}

impl Typewriter {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            cursor: 0.0,
            last_index: 0,
            compile_phase: 0,
        }
    }

    pub fn compile_phase(&self) -> u32 {
        self.compile_phase
    }
}

impl EffectStrategy for Typewriter {
    fn activate(&mut self) {
        self.cursor = 0.0;
        self.compile_phase = 0;
    }

    fn begin_frame(&mut self, ctx: &EffectContext) {
        if ctx.mode != Mode::Insert {
            return;
        }
        self.cursor += TYPE_SPEED;
        if self.cursor > self.last_index as f32 + COMPILE_PAUSE {
            self.cursor = 0.0;
            self.compile_phase += 1;
        }
    }

    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        self.last_index = self.last_index.max(p.index());
        p.ch = p.original_ch();
        p.bold = false;

        if ctx.mode == Mode::Insert {
            let at = self.cursor.floor() as usize;
            if p.index() < at {
                p.typed = true;
                p.inverted = false;
                p.target_opacity = 1.0;
                p.color = self.palette.foreground;
            } else if p.index() == at {
                p.typed = false;
                p.inverted = true;
                p.target_opacity = 1.0;
                p.color = self.palette.accent;
            } else {
                p.typed = false;
                p.inverted = false;
                p.target_opacity = GHOST_OPACITY;
                p.color = self.palette.muted;
            }
        } else {
            p.typed = true;
            p.inverted = false;
            p.target_opacity = 1.0;
            p.color = if self.compile_phase % 2 == 1 {
                self.palette.accent
            } else {
                self.palette.foreground
            };
        }
    }
}
