//! Effect registry and per-particle dispatch.

use tracing::debug;

use super::{EffectContext, EffectKind, EffectStrategy};
use crate::particles::Particle;
use crate::theme::{DocumentRoot, ThemeInfo};
use crate::vim::Mode;

/// Share of the remaining distance to the target opacity covered per frame.
const FADE: f32 = 0.25;

/// Which effect to switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSelection {
    /// Absolute index; wraps modulo the number of effects.
    Index(usize),
    Next,
    Previous,
}

/// Owns one strategy per theme, the active index, the interaction mode and
/// the pointer position.
pub struct EffectSystem {
    strategies: Vec<(EffectKind, Box<dyn EffectStrategy>)>,
    current: usize,
    mode: Mode,
    mouse: Option<(f32, f32)>,
    document: DocumentRoot,
}

impl std::fmt::Debug for EffectSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSystem")
            .field("current", &self.current_kind())
            .field("mode", &self.mode)
            .field("mouse", &self.mouse)
            .field("effects", &self.strategies.len())
            .finish()
    }
}

impl Default for EffectSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectSystem {
    /// All twelve themes, starting at the first.
    pub fn new() -> Self {
        Self::with_kinds(&EffectKind::ALL)
    }

    /// A subset of themes, in the given order. An empty list falls back to
    /// all of them.
    pub fn with_kinds(kinds: &[EffectKind]) -> Self {
        let kinds = if kinds.is_empty() {
            &EffectKind::ALL[..]
        } else {
            kinds
        };
        let mut system = Self {
            strategies: kinds.iter().map(|kind| (*kind, kind.build())).collect(),
            current: 0,
            mode: Mode::Normal,
            mouse: None,
            document: DocumentRoot::new(),
        };
        system.activate_current();
        system
    }

    fn activate_current(&mut self) {
        let (kind, strategy) = &mut self.strategies[self.current];
        strategy.activate();
        self.document.set_scheme(kind.scheme(), kind.palette());
    }

    /// Switch the active effect and apply its scheme to the document root.
    pub fn set_current_effect(&mut self, selection: EffectSelection) -> ThemeInfo {
        let count = self.strategies.len();
        let next = match selection {
            EffectSelection::Index(i) => i % count,
            EffectSelection::Next => (self.current + 1) % count,
            EffectSelection::Previous => (self.current + count - 1) % count,
        };
        if let EffectSelection::Index(i) = selection {
            if i >= count {
                debug!(requested = i, wrapped = next, "effect index out of range, wrapping");
            }
        }
        self.current = next;
        self.activate_current();
        debug!(effect = self.current_effect_name(), index = next, "effect switched");
        self.theme_info()
    }

    pub fn set_current_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_mouse_position(&mut self, position: Option<(f32, f32)>) {
        self.mouse = position;
    }

    pub fn mouse_position(&self) -> Option<(f32, f32)> {
        self.mouse
    }

    /// Per-frame bookkeeping for the active strategy.
    pub fn begin_frame(&mut self, time: f32) {
        let ctx = EffectContext::frame(time, self.mouse, self.mode);
        self.strategies[self.current].1.begin_frame(&ctx);
    }

    /// Run the active strategy on one particle, then ease its opacity toward
    /// the target and refresh its position.
    pub fn apply_effect_to_particle(&mut self, particle: &mut Particle, time: f32) {
        let distance_from_mouse = self
            .mouse
            .map_or(f32::INFINITY, |(mx, my)| particle.distance_to(mx, my));
        let ctx = EffectContext {
            time,
            mouse: self.mouse,
            distance_from_mouse,
            mode: self.mode,
        };
        self.strategies[self.current].1.apply(particle, &ctx);

        particle.clamp_opacity();
        particle.opacity += (particle.target_opacity - particle.opacity) * FADE;
        particle.clamp_opacity();
        particle.sync_position();
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_kind(&self) -> EffectKind {
        self.strategies[self.current].0
    }

    pub fn current_effect_name(&self) -> &'static str {
        self.current_kind().name()
    }

    pub fn current_effect(&mut self) -> &mut dyn EffectStrategy {
        self.strategies[self.current].1.as_mut()
    }

    pub fn current_mode(&self) -> Mode {
        self.mode
    }

    pub fn effect_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.strategies.iter().map(|(kind, _)| *kind)
    }

    /// Position of `kind` in this system's order, if registered.
    pub fn index_of(&self, kind: EffectKind) -> Option<usize> {
        self.kinds().position(|k| k == kind)
    }

    pub fn theme_info(&self) -> ThemeInfo {
        let kind = self.current_kind();
        ThemeInfo {
            index: self.current,
            name: kind.name(),
            scheme: kind.scheme(),
            tone: kind.tone(),
        }
    }

    pub fn document(&self) -> &DocumentRoot {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DocumentRoot {
        &mut self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Tone;

    #[test]
    fn test_next_wraps_after_full_cycle() {
        let mut effects = EffectSystem::new();
        effects.set_current_effect(EffectSelection::Index(0));
        for _ in 0..effects.effect_count() {
            effects.set_current_effect(EffectSelection::Next);
        }
        assert_eq!(effects.current_index(), 0);
    }

    #[test]
    fn test_previous_from_zero_wraps_to_last() {
        let mut effects = EffectSystem::new();
        let info = effects.set_current_effect(EffectSelection::Previous);
        assert_eq!(info.index, 11);
        assert_eq!(info.name, "glitch");
    }

    #[test]
    fn test_out_of_range_index_wraps() {
        let mut effects = EffectSystem::new();
        let info = effects.set_current_effect(EffectSelection::Index(14));
        assert_eq!(info.index, 2);
        assert_eq!(effects.current_kind(), EffectKind::Validator);
    }

    #[test]
    fn test_switch_sets_scheme_once() {
        let mut effects = EffectSystem::new();
        assert_eq!(effects.document().scheme(), Some("scheme-matrix"));
        let changes = effects.document().scheme_changes();

        effects.set_current_effect(EffectSelection::Index(0));
        assert_eq!(effects.document().scheme_changes(), changes);

        let info = effects.set_current_effect(EffectSelection::Index(1));
        assert_eq!(effects.document().scheme(), Some("scheme-typewriter"));
        assert_eq!(info.tone, Tone::Light);
        assert_eq!(effects.document().scheme_changes(), changes + 1);
    }

    #[test]
    fn test_subset_and_empty_kinds() {
        let effects = EffectSystem::with_kinds(&[EffectKind::Wave, EffectKind::Glitch]);
        assert_eq!(effects.effect_count(), 2);
        assert_eq!(effects.current_kind(), EffectKind::Wave);
        assert_eq!(effects.index_of(EffectKind::Glitch), Some(1));
        assert_eq!(effects.index_of(EffectKind::Matrix), None);

        assert_eq!(EffectSystem::with_kinds(&[]).effect_count(), 12);
    }

    #[test]
    fn test_apply_fades_in_and_syncs_position() {
        let mut effects = EffectSystem::with_kinds(&[EffectKind::Wave]);
        let mut p = Particle::new('~', 4.0, 2.0, 0, 0.0);
        let mut last = p.opacity;
        for t in 0..20 {
            effects.apply_effect_to_particle(&mut p, t as f32);
            assert!(p.opacity >= last - 0.3);
            assert!((0.0..=1.0).contains(&p.opacity));
            last = p.opacity;
        }
        assert!(p.opacity > 0.5);
        assert_eq!(p.y, p.base_y() + p.offset_y);
    }

    #[test]
    fn test_pointer_distance_reaches_strategy() {
        let mut effects = EffectSystem::with_kinds(&[EffectKind::Spotlight]);
        let mut near = Particle::new('a', 10.0, 5.0, 0, 0.0);
        let mut far = Particle::new('b', 60.0, 5.0, 1, 0.0);
        effects.set_mouse_position(Some((10.0, 5.0)));
        effects.apply_effect_to_particle(&mut near, 0.0);
        effects.apply_effect_to_particle(&mut far, 0.0);
        assert!(near.target_opacity > far.target_opacity);

        effects.set_mouse_position(None);
        assert_eq!(effects.mouse_position(), None);
    }

    #[test]
    fn test_mode_is_tracked() {
        let mut effects = EffectSystem::new();
        effects.set_current_mode(Mode::Visual);
        assert_eq!(effects.current_mode(), Mode::Visual);
    }
}
