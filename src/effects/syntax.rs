use ratatui::style::Color;

use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::Palette;
use crate::vim::Mode;

/// Token class of a single glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GlyphClass {
    Identifier,
    Number,
    Bracket,
    Operator,
    Comment,
}

pub(crate) fn classify(ch: char) -> GlyphClass {
    match ch {
        c if c.is_alphabetic() => GlyphClass::Identifier,
        c if c.is_numeric() => GlyphClass::Number,
        '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' => GlyphClass::Bracket,
        '/' | '\\' | '|' | '_' | '`' | '\'' | '"' => GlyphClass::Comment,
        _ => GlyphClass::Operator,
    }
}

/// Syntax highlighting by glyph class. Command mode picks out operators and
/// brackets; insert mode emboldens identifiers.
#[derive(Debug)]
pub struct SyntaxHighlight {
    palette: Palette,
}

impl SyntaxHighlight {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    fn class_color(&self, class: GlyphClass) -> Color {
        match class {
            GlyphClass::Identifier => self.palette.accent,
            GlyphClass::Number => Color::Rgb(203, 75, 22),
            GlyphClass::Bracket => Color::Rgb(181, 137, 0),
            GlyphClass::Operator => Color::Rgb(108, 113, 196),
            GlyphClass::Comment => self.palette.muted,
        }
    }
}

impl EffectStrategy for SyntaxHighlight {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let class = classify(p.original_ch());
        p.ch = p.original_ch();
        p.color = self.class_color(class);
        p.inverted = false;

        match ctx.mode {
            Mode::Command => {
                let wanted = matches!(class, GlyphClass::Operator | GlyphClass::Bracket);
                p.highlighted = wanted;
                p.bold = wanted;
                p.target_opacity = if wanted { 1.0 } else { 0.35 };
            }
            Mode::Insert => {
                let wanted = class == GlyphClass::Identifier;
                p.highlighted = wanted;
                p.bold = wanted;
                p.target_opacity = if wanted { 1.0 } else { 0.7 };
            }
            Mode::Normal | Mode::Visual => {
                p.highlighted = false;
                p.bold = false;
                p.target_opacity = 1.0;
            }
        }
    }
}
