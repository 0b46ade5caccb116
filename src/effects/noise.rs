//! Deterministic pseudo-random helpers.
//!
//! Effects never hold an RNG: everything that looks random is a hash of the
//! particle index and the frame time, so a given seed replays exactly.

/// Hash a float into [0, 1).
pub fn hash(seed: f32) -> f32 {
    let v = (seed.sin() * 43758.547).fract().abs();
    if v >= 1.0 {
        0.0
    } else {
        v
    }
}

/// Hash two values (typically particle index and a time bucket).
pub fn hash2(a: f32, b: f32) -> f32 {
    hash(a * 12.9898 + b * 78.233)
}

/// Continuous noise in [0, 1): smoothstep between hashed integer knots, so
/// consecutive frames never jump.
pub fn smooth_noise(seed: f32, t: f32) -> f32 {
    let knot = t.floor();
    let f = t - knot;
    let a = hash2(seed, knot);
    let b = hash2(seed, knot + 1.0);
    let s = f * f * (3.0 - 2.0 * f);
    a + (b - a) * s
}

/// Pick a glyph from `set` using a value in [0, 1).
pub fn pick(set: &[char], r: f32) -> char {
    if set.is_empty() {
        return ' ';
    }
    let idx = ((r.clamp(0.0, 1.0) * set.len() as f32) as usize).min(set.len() - 1);
    set[idx]
}

/// Map `x` in [-1, 1] (e.g. a sine) to [0, 1].
pub fn unit(x: f32) -> f32 {
    ((x + 1.0) * 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_range() {
        for i in 0..1000 {
            let v = hash2(i as f32, (i * 7) as f32);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash2(3.0, 17.0), hash2(3.0, 17.0));
    }

    #[test]
    fn test_smooth_noise_is_continuous() {
        let mut prev = smooth_noise(5.0, 0.0);
        let mut t = 0.0;
        while t < 20.0 {
            t += 0.02;
            let next = smooth_noise(5.0, t);
            assert!((next - prev).abs() < 0.1, "jump at t={}", t);
            prev = next;
        }
    }

    #[test]
    fn test_pick_bounds() {
        let set = ['a', 'b', 'c'];
        assert_eq!(pick(&set, 0.0), 'a');
        assert_eq!(pick(&set, 0.999), 'c');
        assert_eq!(pick(&set, 1.0), 'c');
        assert_eq!(pick(&[], 0.5), ' ');
    }
}
