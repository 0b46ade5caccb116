//! Particles: one animated glyph cell per visible character of the art.

pub mod art;
mod system;

pub use art::{GlyphMetrics, DEFAULT_ART};
pub use system::ParticleSystem;

use ratatui::style::Color;

use crate::theme::Palette;

/// Colour every particle starts from.
pub const DEFAULT_COLOR: Color = Palette::DEFAULT.foreground;

/// Starting price for the market effect.
pub const BASE_PRICE: f32 = 100.0;

/// Direction of the market effect's last price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    Down,
    #[default]
    Flat,
    Up,
}

impl Trend {
    pub fn from_delta(delta: f32) -> Self {
        if delta > f32::EPSILON {
            Trend::Up
        } else if delta < -f32::EPSILON {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn sign(&self) -> i8 {
        match self {
            Trend::Down => -1,
            Trend::Flat => 0,
            Trend::Up => 1,
        }
    }
}

/// A single animated glyph.
///
/// The anchor (`base_x`, `base_y`), the original character, the index and
/// the phase are fixed at creation. Effects only touch the public transient
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Character currently displayed
    pub ch: char,
    original_ch: char,
    /// Current position: base plus offset, refreshed after each effect pass
    pub x: f32,
    pub y: f32,
    base_x: f32,
    base_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub opacity: f32,
    pub target_opacity: f32,
    pub color: Color,
    /// Revealed by a typing-style effect
    pub typed: bool,
    index: usize,
    /// Radians, used to desynchronize oscillations
    phase: f32,

    /// Terminal stand-in for an enlarged glyph
    pub bold: bool,
    /// Drawn with foreground and background swapped
    pub inverted: bool,

    // Theme-specific fields
    pub validated: bool,
    pub price: f32,
    pub trend: Trend,
    pub risk_level: u8,
    pub highlighted: bool,
    pub block_index: usize,
}

impl Particle {
    pub fn new(ch: char, base_x: f32, base_y: f32, index: usize, phase: f32) -> Self {
        Self {
            ch,
            original_ch: ch,
            x: base_x,
            y: base_y,
            base_x,
            base_y,
            offset_x: 0.0,
            offset_y: 0.0,
            opacity: 0.0,
            target_opacity: 1.0,
            color: DEFAULT_COLOR,
            typed: false,
            index,
            phase,
            bold: false,
            inverted: false,
            validated: false,
            price: BASE_PRICE,
            trend: Trend::Flat,
            risk_level: 0,
            highlighted: false,
            block_index: 0,
        }
    }

    pub fn original_ch(&self) -> char {
        self.original_ch
    }

    pub fn base_x(&self) -> f32 {
        self.base_x
    }

    pub fn base_y(&self) -> f32 {
        self.base_y
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restore every transient field, keeping anchor, character, index and
    /// phase.
    pub fn reset(&mut self) {
        *self = Particle::new(
            self.original_ch,
            self.base_x,
            self.base_y,
            self.index,
            self.phase,
        );
    }

    /// Recompute the current position from anchor and offset.
    pub fn sync_position(&mut self) {
        self.x = self.base_x + self.offset_x;
        self.y = self.base_y + self.offset_y;
    }

    /// Keep both opacities inside [0, 1]. NaN collapses to 0.
    pub fn clamp_opacity(&mut self) {
        self.opacity = clamp_unit(self.opacity);
        self.target_opacity = clamp_unit(self.target_opacity);
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Partial update merged by [`ParticleSystem::update_particle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleUpdate {
    pub ch: Option<char>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub opacity: Option<f32>,
    pub target_opacity: Option<f32>,
    pub color: Option<Color>,
    pub typed: Option<bool>,
    pub bold: Option<bool>,
    pub inverted: Option<bool>,
    pub validated: Option<bool>,
    pub price: Option<f32>,
    pub trend: Option<Trend>,
    pub risk_level: Option<u8>,
    pub highlighted: Option<bool>,
    pub block_index: Option<usize>,
}

impl ParticleUpdate {
    pub fn apply_to(&self, p: &mut Particle) {
        if let Some(ch) = self.ch {
            p.ch = ch;
        }
        if let Some(v) = self.offset_x {
            p.offset_x = v;
        }
        if let Some(v) = self.offset_y {
            p.offset_y = v;
        }
        if let Some(v) = self.opacity {
            p.opacity = v;
        }
        if let Some(v) = self.target_opacity {
            p.target_opacity = v;
        }
        if let Some(color) = self.color {
            p.color = color;
        }
        if let Some(v) = self.typed {
            p.typed = v;
        }
        if let Some(v) = self.bold {
            p.bold = v;
        }
        if let Some(v) = self.inverted {
            p.inverted = v;
        }
        if let Some(v) = self.validated {
            p.validated = v;
        }
        if let Some(v) = self.price {
            p.price = v;
        }
        if let Some(v) = self.trend {
            p.trend = v;
        }
        if let Some(v) = self.risk_level {
            p.risk_level = v;
        }
        if let Some(v) = self.highlighted {
            p.highlighted = v;
        }
        if let Some(v) = self.block_index {
            p.block_index = v;
        }
        p.clamp_opacity();
        p.sync_position();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_anchor_and_phase() {
        let mut p = Particle::new('x', 4.0, 2.0, 9, 1.25);
        p.ch = '#';
        p.offset_x = 3.0;
        p.opacity = 0.7;
        p.color = Color::Red;
        p.validated = true;
        p.price = 140.0;
        p.sync_position();

        p.reset();
        assert_eq!(p, Particle::new('x', 4.0, 2.0, 9, 1.25));
        assert_eq!(p.phase(), 1.25);
        assert_eq!((p.x, p.y), (4.0, 2.0));
    }

    #[test]
    fn test_clamp_opacity_handles_nan() {
        let mut p = Particle::new('x', 0.0, 0.0, 0, 0.0);
        p.opacity = f32::NAN;
        p.target_opacity = 3.0;
        p.clamp_opacity();
        assert_eq!(p.opacity, 0.0);
        assert_eq!(p.target_opacity, 1.0);
    }

    #[test]
    fn test_update_merges_given_fields_only() {
        let mut p = Particle::new('x', 1.0, 1.0, 0, 0.0);
        let update = ParticleUpdate {
            offset_y: Some(2.0),
            color: Some(Color::Green),
            opacity: Some(1.5),
            ..Default::default()
        };
        update.apply_to(&mut p);
        assert_eq!(p.color, Color::Green);
        assert_eq!(p.y, 3.0);
        assert_eq!(p.opacity, 1.0);
        assert_eq!(p.ch, 'x');
    }

    #[test]
    fn test_trend_from_delta() {
        assert_eq!(Trend::from_delta(0.5), Trend::Up);
        assert_eq!(Trend::from_delta(-0.5), Trend::Down);
        assert_eq!(Trend::from_delta(0.0), Trend::Flat);
        assert_eq!(Trend::Down.sign(), -1);
    }
}
