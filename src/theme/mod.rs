//! Colour schemes, the document-root scheme switch, and the theme channel.
//!
//! Each effect owns a named scheme (`scheme-matrix`, `scheme-market`, ...).
//! Applying a scheme to the [`DocumentRoot`] is the terminal equivalent of
//! swapping the class on `<html>`: the canvas background and the status bars
//! read their colours from whatever scheme is currently set.

mod store;

pub use store::{FileThemeStore, MemoryThemeStore, StoredTheme, ThemeStore};

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Coarse light/dark classification of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Dark,
    Light,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Dark => "dark",
            Tone::Light => "light",
        }
    }
}

/// The colour variables a scheme defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub muted: Color,
    pub tone: Tone,
}

impl Palette {
    pub const DEFAULT: Palette = Palette {
        background: Color::Rgb(12, 12, 16),
        foreground: Color::Rgb(210, 210, 220),
        accent: Color::Rgb(97, 175, 239),
        muted: Color::Rgb(92, 99, 112),
        tone: Tone::Dark,
    };

    pub fn text(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.muted).bg(self.background)
    }

    pub fn key(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    /// Inverted badge used for the mode label.
    pub fn badge(&self) -> Style {
        Style::default()
            .fg(self.background)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Shown while a theme transition is in flight.
    pub fn transition(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.background)
            .add_modifier(Modifier::ITALIC)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Snapshot of the active theme, published to anyone holding a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeInfo {
    pub index: usize,
    pub name: &'static str,
    pub scheme: &'static str,
    pub tone: Tone,
}

/// The single scheme slot of the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct DocumentRoot {
    scheme: Option<&'static str>,
    palette: Palette,
    transitioning: bool,
    changes: u64,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active scheme. Setting the scheme that is already active
    /// is a no-op and returns `false`.
    pub fn set_scheme(&mut self, scheme: &'static str, palette: Palette) -> bool {
        if self.scheme == Some(scheme) {
            return false;
        }
        self.scheme = Some(scheme);
        self.palette = palette;
        self.changes += 1;
        true
    }

    pub fn scheme(&self) -> Option<&'static str> {
        self.scheme
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// How many times the scheme actually changed.
    pub fn scheme_changes(&self) -> u64 {
        self.changes
    }

    pub fn set_transitioning(&mut self, on: bool) {
        self.transitioning = on;
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }
}

/// HSL (degrees, percent, percent) to a terminal RGB colour.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Color::Rgb(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Color::Rgb(
        channel(h + 1.0 / 3.0),
        channel(h),
        channel(h - 1.0 / 3.0),
    )
}

/// Blend `fg` toward `bg` by `opacity` (1.0 = pure `fg`).
///
/// Only RGB colours can be blended; anything else is returned as-is and the
/// caller falls back to the DIM modifier.
pub fn blend(fg: Color, bg: Color, opacity: f32) -> Option<Color> {
    match (fg, bg) {
        (Color::Rgb(fr, fg_, fb), Color::Rgb(br, bg_, bb)) => {
            let a = opacity.clamp(0.0, 1.0);
            let mix = |f: u8, b: u8| (b as f32 + (f as f32 - b as f32) * a).round() as u8;
            Some(Color::Rgb(mix(fr, br), mix(fg_, bg_), mix(fb, bb)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_scheme_is_idempotent() {
        let mut root = DocumentRoot::new();
        assert!(root.set_scheme("scheme-matrix", Palette::DEFAULT));
        assert!(!root.set_scheme("scheme-matrix", Palette::DEFAULT));
        assert_eq!(root.scheme_changes(), 1);
        assert!(root.set_scheme("scheme-wave", Palette::DEFAULT));
        assert_eq!(root.scheme(), Some("scheme-wave"));
        assert_eq!(root.scheme_changes(), 2);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 100.0, 50.0), Color::Rgb(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 100.0, 50.0), Color::Rgb(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 100.0, 50.0), Color::Rgb(0, 0, 255));
        assert_eq!(hsl_to_rgb(480.0, 100.0, 50.0), Color::Rgb(0, 255, 0));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 100.0), Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_blend() {
        let fg = Color::Rgb(200, 100, 0);
        let bg = Color::Rgb(0, 0, 0);
        assert_eq!(blend(fg, bg, 1.0), Some(fg));
        assert_eq!(blend(fg, bg, 0.0), Some(bg));
        assert_eq!(blend(fg, bg, 0.5), Some(Color::Rgb(100, 50, 0)));
        assert_eq!(blend(Color::Green, bg, 0.5), None);
    }
}
