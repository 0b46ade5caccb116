use std::ops::Range;

use super::noise::{hash, unit};
use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::Palette;
use crate::vim::Mode;

/// Glyphs added to the selection per frame.
const GROW: f32 = 0.8;

/// Visual selection: entering visual mode drops an anchor and a contiguous
/// run of glyphs (in index order) grows from it, drawn inverted.
#[derive(Debug)]
pub struct VisualSelect {
    palette: Palette,
    anchor: Option<usize>,
    since: f32,
    count: usize,
}

impl VisualSelect {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            anchor: None,
            since: 0.0,
            count: 0,
        }
    }

    pub fn selection(&self, time: f32) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let span = self.count.saturating_sub(anchor).max(1);
        let len = ((time - self.since).max(0.0) * GROW) as usize % span + 1;
        Some(anchor..(anchor + len).min(anchor + span))
    }
}

impl EffectStrategy for VisualSelect {
    fn activate(&mut self) {
        self.anchor = None;
    }

    fn begin_frame(&mut self, ctx: &EffectContext) {
        if ctx.mode != Mode::Visual {
            self.anchor = None;
            return;
        }
        if self.anchor.is_none() {
            let start = (hash(ctx.time) * self.count as f32 * 0.5) as usize;
            self.anchor = Some(start);
            self.since = ctx.time;
        }
    }

    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        self.count = self.count.max(p.index() + 1);
        p.ch = p.original_ch();
        p.bold = false;

        let selected = self
            .selection(ctx.time)
            .is_some_and(|range| range.contains(&p.index()));
        p.inverted = selected;
        p.highlighted = selected;
        if selected {
            p.color = self.palette.accent;
            p.target_opacity = 1.0;
        } else {
            let breath = unit((ctx.time * 0.05 + p.phase()).sin());
            p.color = self.palette.foreground;
            p.target_opacity = 0.7 + 0.3 * breath;
        }
    }
}
