use super::{EffectContext, EffectStrategy};
use crate::particles::Particle;
use crate::theme::hsl_to_rgb;

/// Pointer repulsion: glyphs near the pointer are pushed away from it and
/// drift back to their anchor once it leaves.
#[derive(Debug)]
pub struct Magnet {
    pub radius: f32,
    /// Push distance directly under the pointer
    pub strength: f32,
    /// Fraction of the remaining distance covered per frame
    pub ease: f32,
}

impl Default for Magnet {
    fn default() -> Self {
        Self {
            radius: 8.0,
            strength: 3.0,
            ease: 0.3,
        }
    }
}

impl EffectStrategy for Magnet {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let (goal_x, goal_y) = match ctx.mouse {
            Some((mx, my)) => {
                let dx = p.base_x() - mx;
                let dy = p.base_y() - my;
                let d = (dx * dx + dy * dy).sqrt();
                if d < self.radius {
                    let push = (self.radius - d) / self.radius * self.strength;
                    if d > f32::EPSILON {
                        (dx / d * push, dy / d * push)
                    } else {
                        (0.0, -push)
                    }
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };

        p.offset_x += (goal_x - p.offset_x) * self.ease;
        p.offset_y += (goal_y - p.offset_y) * self.ease;

        let displacement = (p.offset_x * p.offset_x + p.offset_y * p.offset_y).sqrt();
        let k = (displacement / self.strength).min(1.0);
        p.ch = p.original_ch();
        p.color = hsl_to_rgb(280.0 + 40.0 * k, 60.0 + 30.0 * k, 60.0 + 15.0 * k);
        p.bold = k > 0.4;
        p.target_opacity = 0.75 + 0.25 * k;
    }
}
