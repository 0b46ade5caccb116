use super::noise::smooth_noise;
use super::{EffectContext, EffectStrategy};
use crate::particles::{Particle, Trend, BASE_PRICE};
use crate::theme::hsl_to_rgb;

/// How fast the price walk moves through noise space per frame.
const DRIFT: f32 = 0.02;
/// Max relative swing around the base price.
const SWING: f32 = 0.12;

/// Market ticker: each glyph carries a price that wanders smoothly; the
/// colour follows the direction and size of the latest move.
///
/// The move is read off the walk itself (this frame against the previous
/// one), never off the stored price, so reset or freshly created particles
/// pick the walk up without a jump.
#[derive(Debug, Default)]
pub struct MarketTicker;

pub(crate) fn price_at(index: usize, time: f32) -> f32 {
    let n = smooth_noise(index as f32 * 0.37, time * DRIFT);
    BASE_PRICE * (1.0 + SWING * (n * 2.0 - 1.0))
}

impl EffectStrategy for MarketTicker {
    fn apply(&mut self, p: &mut Particle, ctx: &EffectContext) {
        let price = price_at(p.index(), ctx.time);
        let delta = price - price_at(p.index(), ctx.time - 1.0);
        p.price = price;
        p.trend = Trend::from_delta(delta);

        // Hue 0 (red) .. 60 (amber) .. 120 (green), scaled by move size.
        let hue = (60.0 + delta * 400.0).clamp(0.0, 120.0);
        p.color = hsl_to_rgb(hue, 75.0, 55.0);
        p.ch = match p.trend {
            Trend::Up if delta > 0.15 => '▲',
            Trend::Down if delta < -0.15 => '▼',
            _ => p.original_ch(),
        };
        p.target_opacity = 0.6 + 0.4 * ((price - BASE_PRICE).abs() / (BASE_PRICE * SWING)).min(1.0);
        p.offset_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vim::Mode;

    #[test]
    fn test_price_moves_continuously() {
        let mut ticker = MarketTicker;
        let mut p = Particle::new('$', 0.0, 0.0, 3, 0.0);
        ticker.apply(&mut p, &EffectContext::frame(0.0, None, Mode::Normal));
        let mut last = p.price;
        for frame in 1..2000 {
            ticker.apply(&mut p, &EffectContext::frame(frame as f32, None, Mode::Normal));
            assert!((p.price - last).abs() < 1.0, "jump at frame {}", frame);
            last = p.price;
        }
    }

    #[test]
    fn test_trend_follows_walk() {
        let mut ticker = MarketTicker;
        for i in 0..50 {
            let mut p = Particle::new('$', 0.0, 0.0, i, 0.0);
            let t = 10.0 + i as f32;
            ticker.apply(&mut p, &EffectContext::frame(t, None, Mode::Normal));
            let expected = Trend::from_delta(price_at(i, t) - price_at(i, t - 1.0));
            assert_eq!(p.trend, expected);
        }
    }

    #[test]
    fn test_reset_particle_joins_walk_without_jump() {
        let mut ticker = MarketTicker;
        let t = 500.0;
        for i in 0..200 {
            let mut running = Particle::new('$', 0.0, 0.0, i, 0.0);
            ticker.apply(&mut running, &EffectContext::frame(t - 1.0, None, Mode::Normal));
            ticker.apply(&mut running, &EffectContext::frame(t, None, Mode::Normal));

            // Fresh particles carry the base price, as after a theme switch.
            let mut fresh = Particle::new('$', 0.0, 0.0, i, 0.0);
            assert_eq!(fresh.price, BASE_PRICE);
            ticker.apply(&mut fresh, &EffectContext::frame(t, None, Mode::Normal));

            assert!((fresh.price - price_at(i, t - 1.0)).abs() < 1.0);
            assert_eq!(fresh.price, running.price);
            assert_eq!(fresh.trend, running.trend);
            assert_eq!(fresh.ch, running.ch);
        }
    }

    #[test]
    fn test_price_stays_within_swing() {
        for i in 0..50 {
            for t in (0..5000).step_by(37) {
                let price = price_at(i, t as f32);
                assert!(price >= BASE_PRICE * (1.0 - SWING) - 1e-3);
                assert!(price <= BASE_PRICE * (1.0 + SWING) + 1e-3);
            }
        }
    }
}
