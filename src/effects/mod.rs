//! Themed per-particle effects.
//!
//! Every theme is one [`EffectKind`] variant plus one strategy struct that
//! implements [`EffectStrategy`]. The [`EffectSystem`] keeps one instance of
//! each, tracks which one is active and applies it to every particle on
//! every frame.

mod glitch;
mod ledger;
mod magnet;
mod market;
mod matrix;
pub mod noise;
mod risk;
mod spotlight;
mod syntax;
pub mod system;
mod typewriter;
mod validator;
mod visual;
mod wave;

pub use system::{EffectSelection, EffectSystem};

use ratatui::style::Color;

use crate::particles::Particle;
use crate::theme::{Palette, Tone};
use crate::vim::Mode;

/// Read-only input to one effect evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectContext {
    /// Frame counter since the engine started (not wall-clock)
    pub time: f32,
    /// Pointer position in canvas units, if the pointer is over the canvas
    pub mouse: Option<(f32, f32)>,
    /// Distance from the pointer to this particle; infinite without a pointer
    pub distance_from_mouse: f32,
    pub mode: Mode,
}

impl EffectContext {
    /// Context for per-frame bookkeeping, not tied to a particle.
    pub fn frame(time: f32, mouse: Option<(f32, f32)>, mode: Mode) -> Self {
        Self {
            time,
            mouse,
            distance_from_mouse: f32::INFINITY,
            mode,
        }
    }
}

/// A theme's per-particle mutation rule.
pub trait EffectStrategy {
    /// Called when the effect becomes the active one.
    fn activate(&mut self) {}

    /// Called once per frame before any `apply`.
    fn begin_frame(&mut self, _ctx: &EffectContext) {}

    /// Mutate the transient fields of `particle` for this frame.
    fn apply(&mut self, particle: &mut Particle, ctx: &EffectContext);
}

/// The closed set of themes, in switching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Matrix,
    Typewriter,
    Validator,
    Market,
    Spotlight,
    Magnet,
    Visual,
    Syntax,
    Risk,
    Ledger,
    Wave,
    Glitch,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        EffectKind::Matrix,
        EffectKind::Typewriter,
        EffectKind::Validator,
        EffectKind::Market,
        EffectKind::Spotlight,
        EffectKind::Magnet,
        EffectKind::Visual,
        EffectKind::Syntax,
        EffectKind::Risk,
        EffectKind::Ledger,
        EffectKind::Wave,
        EffectKind::Glitch,
    ];

    /// Stable machine name.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Matrix => "matrix",
            EffectKind::Typewriter => "typewriter",
            EffectKind::Validator => "validator",
            EffectKind::Market => "market",
            EffectKind::Spotlight => "spotlight",
            EffectKind::Magnet => "magnet",
            EffectKind::Visual => "visual",
            EffectKind::Syntax => "syntax",
            EffectKind::Risk => "risk",
            EffectKind::Ledger => "ledger",
            EffectKind::Wave => "wave",
            EffectKind::Glitch => "glitch",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Matrix => "Matrix Rain",
            EffectKind::Typewriter => "Typewriter",
            EffectKind::Validator => "Validator",
            EffectKind::Market => "Market Ticker",
            EffectKind::Spotlight => "Spotlight",
            EffectKind::Magnet => "Magnet",
            EffectKind::Visual => "Visual Select",
            EffectKind::Syntax => "Syntax",
            EffectKind::Risk => "Risk Map",
            EffectKind::Ledger => "Ledger",
            EffectKind::Wave => "Wave",
            EffectKind::Glitch => "Glitch",
        }
    }

    /// Presentation class set on the document root.
    pub fn scheme(&self) -> &'static str {
        match self {
            EffectKind::Matrix => "scheme-matrix",
            EffectKind::Typewriter => "scheme-typewriter",
            EffectKind::Validator => "scheme-validator",
            EffectKind::Market => "scheme-market",
            EffectKind::Spotlight => "scheme-spotlight",
            EffectKind::Magnet => "scheme-magnet",
            EffectKind::Visual => "scheme-visual",
            EffectKind::Syntax => "scheme-syntax",
            EffectKind::Risk => "scheme-risk",
            EffectKind::Ledger => "scheme-ledger",
            EffectKind::Wave => "scheme-wave",
            EffectKind::Glitch => "scheme-glitch",
        }
    }

    pub fn palette(&self) -> Palette {
        let (background, foreground, accent, muted, tone) = match self {
            EffectKind::Matrix => ((0, 8, 0), (0, 230, 65), (180, 255, 180), (0, 90, 30), Tone::Dark),
            EffectKind::Typewriter => ((250, 246, 236), (40, 40, 40), (180, 60, 30), (150, 140, 120), Tone::Light),
            EffectKind::Validator => ((14, 18, 24), (200, 210, 220), (80, 220, 120), (90, 100, 110), Tone::Dark),
            EffectKind::Market => ((10, 12, 20), (210, 210, 210), (255, 200, 60), (90, 90, 110), Tone::Dark),
            EffectKind::Spotlight => ((5, 5, 5), (230, 200, 120), (255, 230, 150), (80, 70, 50), Tone::Dark),
            EffectKind::Magnet => ((18, 10, 28), (200, 160, 240), (255, 120, 220), (90, 70, 110), Tone::Dark),
            EffectKind::Visual => ((40, 42, 54), (248, 248, 242), (189, 147, 249), (98, 114, 164), Tone::Dark),
            EffectKind::Syntax => ((253, 246, 227), (101, 123, 131), (38, 139, 210), (147, 161, 161), Tone::Light),
            EffectKind::Risk => ((20, 10, 10), (230, 200, 190), (255, 80, 60), (110, 80, 80), Tone::Dark),
            EffectKind::Ledger => ((12, 14, 30), (170, 180, 255), (255, 190, 0), (80, 85, 130), Tone::Dark),
            EffectKind::Wave => ((230, 244, 250), (20, 80, 120), (0, 150, 200), (120, 160, 180), Tone::Light),
            EffectKind::Glitch => ((8, 0, 12), (0, 255, 200), (255, 0, 170), (80, 0, 90), Tone::Dark),
        };
        let rgb = |(r, g, b): (u8, u8, u8)| Color::Rgb(r, g, b);
        Palette {
            background: rgb(background),
            foreground: rgb(foreground),
            accent: rgb(accent),
            muted: rgb(muted),
            tone,
        }
    }

    pub fn tone(&self) -> Tone {
        self.palette().tone
    }

    /// Accepts the machine name, the scheme class or the display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let name = name.strip_prefix("scheme-").unwrap_or(name.as_str());
        Self::ALL.into_iter().find(|kind| {
            kind.name() == name || kind.display_name().to_lowercase() == name
        })
    }

    pub fn build(self) -> Box<dyn EffectStrategy> {
        let palette = self.palette();
        match self {
            EffectKind::Matrix => Box::new(matrix::MatrixRain::default()),
            EffectKind::Typewriter => Box::new(typewriter::Typewriter::new(palette)),
            EffectKind::Validator => Box::new(validator::Validator::default()),
            EffectKind::Market => Box::new(market::MarketTicker),
            EffectKind::Spotlight => Box::new(spotlight::Spotlight::default()),
            EffectKind::Magnet => Box::new(magnet::Magnet::default()),
            EffectKind::Visual => Box::new(visual::VisualSelect::new(palette)),
            EffectKind::Syntax => Box::new(syntax::SyntaxHighlight::new(palette)),
            EffectKind::Risk => Box::new(risk::RiskMap),
            EffectKind::Ledger => Box::new(ledger::Ledger::new(palette)),
            EffectKind::Wave => Box::new(wave::Wave),
            EffectKind::Glitch => Box::new(glitch::Glitch::default()),
        }
    }
}
