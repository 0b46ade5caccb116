use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use tracing::debug;

use super::art::{art_dimensions, glyph_cells, GlyphMetrics, DEFAULT_ART};
use super::{Particle, ParticleUpdate};
use crate::theme::{blend, Palette};

/// Below this opacity a non-RGB colour is drawn dimmed.
const DIM_BELOW: f32 = 0.5;

/// Owns the particle set and draws it.
///
/// Other components get slices: they may mutate particles in place but can
/// never add or remove one.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    /// Art the current set was built from; reused on resize.
    art: Option<String>,
    area: Rect,
    metrics: GlyphMetrics,
    origin: (f32, f32),
    /// Art size in canvas units
    extent: (f32, f32),
    scroll_y: f32,
    rng: StdRng,
}

impl ParticleSystem {
    /// `seed` makes particle phases reproducible.
    pub fn new(area: Rect, metrics: GlyphMetrics, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            particles: Vec::new(),
            art: None,
            area,
            metrics,
            origin: (area.x as f32, area.y as f32),
            extent: (0.0, 0.0),
            scroll_y: 0.0,
            rng,
        }
    }

    /// Replace the whole set with one particle per visible glyph of `art`
    /// (the compiled-in art when `None`), centred in the canvas.
    pub fn create_particles(&mut self, art: Option<&str>) {
        let art = art.unwrap_or(DEFAULT_ART).to_string();
        let (cols, rows) = art_dimensions(&art);
        self.extent = (
            cols as f32 * self.metrics.width,
            rows as f32 * self.metrics.height,
        );
        self.origin = (
            self.area.x as f32 + ((self.area.width as f32 - self.extent.0) / 2.0).max(0.0).floor(),
            self.area.y as f32 + ((self.area.height as f32 - self.extent.1) / 2.0).max(0.0).floor(),
        );

        self.particles = glyph_cells(&art)
            .into_iter()
            .enumerate()
            .map(|(index, (ch, col, row))| {
                let x = self.origin.0 + col as f32 * self.metrics.width;
                let y = self.origin.1 + row as f32 * self.metrics.height;
                Particle::new(ch, x, y, index, self.rng.gen_range(0.0..TAU))
            })
            .collect();

        self.art = Some(art);
        self.scroll_y = self.scroll_y.min(self.max_scroll());
        debug!(
            count = self.particles.len(),
            cols, rows, "particles created"
        );
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// In-place access for the effect pass. The set cannot change size.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn has_particles(&self) -> bool {
        self.art.is_some()
    }

    /// Merge `update` into the particle at `index`. Out of range does nothing.
    pub fn update_particle(&mut self, index: usize, update: &ParticleUpdate) {
        if let Some(p) = self.particles.get_mut(index) {
            update.apply_to(p);
        }
    }

    /// Back to a clean slate for a new effect. Phases are kept, so two resets
    /// in a row leave identical particles.
    pub fn reset_particles(&mut self) {
        for p in &mut self.particles {
            p.reset();
        }
    }

    /// Draw every visible particle into `buf`.
    pub fn render_particles(&self, buf: &mut Buffer, palette: &Palette) {
        let bounds = buf.area;
        for p in &self.particles {
            if p.opacity.is_nan() || p.opacity <= 0.0 {
                continue;
            }
            let px = (p.base_x() + p.offset_x).round();
            let py = (p.base_y() + p.offset_y - self.scroll_y).round();
            // NaN slips through the range checks below and casts to 0.
            if !px.is_finite() || !py.is_finite() {
                continue;
            }
            if px < bounds.left() as f32
                || py < bounds.top() as f32
                || px >= bounds.right() as f32
                || py >= bounds.bottom() as f32
            {
                continue;
            }

            let mut style = Style::default();
            let fg = match blend(p.color, palette.background, p.opacity) {
                Some(color) => color,
                None => {
                    if p.opacity < DIM_BELOW {
                        style = style.add_modifier(Modifier::DIM);
                    }
                    p.color
                }
            };
            style = if p.inverted {
                style.fg(palette.background).bg(fg)
            } else {
                style.fg(fg).bg(palette.background)
            };
            if p.bold {
                style = style.add_modifier(Modifier::BOLD);
            }

            if let Some(cell) = buf.cell_mut((px as u16, py as u16)) {
                cell.set_char(p.ch).set_style(style);
            }
        }
    }

    /// Adopt a new canvas area and rebuild the grid. Works before the first
    /// `create_particles` too, in which case it creates the default set.
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        let art = self.art.take();
        self.create_particles(art.as_deref());
    }

    /// Drop every particle (teardown).
    pub fn clear(&mut self) {
        self.particles.clear();
        self.art = None;
    }

    /// Nearest particle within `threshold` of (x, y).
    pub fn particle_at(&self, x: f32, y: f32, threshold: f32) -> Option<&Particle> {
        self.particles
            .iter()
            .map(|p| (p, p.distance_to(x, y)))
            .filter(|(_, d)| *d <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    pub fn particles_in_radius(&self, x: f32, y: f32, radius: f32) -> Vec<&Particle> {
        self.particles
            .iter()
            .filter(|p| p.distance_to(x, y) <= radius)
            .collect()
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn metrics(&self) -> GlyphMetrics {
        self.metrics
    }

    /// Top-left corner of the art in canvas units.
    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// How far the art overhangs the bottom of the canvas.
    pub fn max_scroll(&self) -> f32 {
        (self.origin.1 + self.extent.1 - self.area.bottom() as f32).max(0.0)
    }

    pub fn scroll_by(&mut self, rows: f32) {
        self.scroll_y = (self.scroll_y + rows * self.metrics.height).clamp(0.0, self.max_scroll());
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_y = 0.0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_y = self.max_scroll();
    }
}
