use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

/// Proximity glow: glyphs brighten and embolden as the pointer approaches.
#[derive(Debug)]
pub struct Spotlight {
    /// Distance at which the glow fades out entirely
    pub radius: f32,
    /// Opacity far from the pointer; the art never disappears
    pub floor: f32,
}

impl Default for Spotlight {
    fn default() -> Self {
        Self {
            radius: 12.0,
            floor: 0.25,
        }
    }
}

impl Spotlight {
    /// 1.0 under the pointer, 0.0 at or beyond the radius.
    fn intensity(&self, distance: f32) -> f32 {
        if !distance.is_finite() || distance >= self.radius {
            return 0.0;
        }
        let k = 1.0 - distance / self.radius;
        k * k * (3.0 - 2.0 * k)
    }
}

impl EffectStrategy for Spotlight {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let k = self.intensity(ctx.distance_from_mouse);
        p.ch = p.original_ch();
        p.target_opacity = self.floor + (1.0 - self.floor) * k;
        p.bold = k > 0.5;
        p.color = hsl_to_rgb(45.0, 30.0 + 60.0 * k, 35.0 + 35.0 * k);
    }
}
