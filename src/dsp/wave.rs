//! Stateless periodic waveforms plus a deterministic noise table.
//!
//! The periodic functions take a pre-scaled phase argument; callers do the
//! `2π * freq / sample_rate` scaling. `saw`, `triangle`, and `square` keep
//! their reference identities, so `saw`/`triangle` have period 4 in the
//! caller's units while `sine`/`square` have period 2π.

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::SAMPLE_RATE;

pub fn sine(x: f64) -> f64 {
    x.sin()
}

/// Ramp −1 → 1 with period 4.
pub fn saw(x: f64) -> f64 {
    let y = x / 4.0;
    2.0 * (y - y.trunc()) - 1.0
}

pub fn triangle(x: f64) -> f64 {
    2.0 * saw(x).abs() - 1.0
}

/// Exactly ±1 by construction: `floor(sin x)` is −1 or 0.
pub fn square(x: f64) -> f64 {
    2.0 * (x.sin().floor() + 0.5)
}

/// Seed for the noise table. Any fixed value works; changing it changes
/// every rendered noise oscillator, so treat it as part of the output
/// contract.
const NOISE_SEED: u64 = 0x7EB00C;

static NOISE_TABLE: OnceLock<Vec<f64>> = OnceLock::new();

/// One second of smoothed pseudo-noise, built lazily on first use and
/// shared read-only afterwards. Each slot is `sin` of a running sum of
/// generator outputs — a reproducible drunken walk around the unit circle,
/// not white noise.
fn noise_table() -> &'static [f64] {
    NOISE_TABLE.get_or_init(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(NOISE_SEED);
        let mut sum = 0.0f64;
        (0..SAMPLE_RATE)
            .map(|_| {
                sum += rng.r#gen::<f64>();
                sum.sin()
            })
            .collect()
    })
}

/// Table lookup by absolute sample position; periodic with the table
/// length and identical across runs.
pub fn noise(i: i64) -> f64 {
    let table = noise_table();
    table[i.unsigned_abs() as usize % table.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn square_is_exactly_plus_minus_one() {
        let mut x = -20.0;
        while x < 20.0 {
            let s = square(x);
            assert!(s == 1.0 || s == -1.0, "square({x}) = {s}");
            x += 0.0173;
        }
    }

    #[test]
    fn saw_has_period_four_and_spans_unit_range() {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut x = 0.0;
        while x < 4.0 {
            let s = saw(x);
            assert_approx_eq!(s, saw(x + 4.0), 1e-9);
            assert_approx_eq!(s, saw(x + 8.0), 1e-9);
            min = min.min(s);
            max = max.max(s);
            x += 0.001;
        }
        assert_approx_eq!(min, -1.0, 1e-2);
        assert_approx_eq!(max, 1.0, 1e-2);
    }

    #[test]
    fn triangle_has_period_four_and_spans_unit_range() {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut x = 0.0;
        while x < 4.0 {
            let s = triangle(x);
            assert_approx_eq!(s, triangle(x + 4.0), 1e-9);
            min = min.min(s);
            max = max.max(s);
            x += 0.001;
        }
        assert_approx_eq!(min, -1.0, 1e-2);
        assert_approx_eq!(max, 1.0, 1e-2);
    }

    #[test]
    fn noise_is_deterministic_and_periodic() {
        assert_eq!(noise(17), noise(17));
        assert_eq!(noise(3), noise(3 + SAMPLE_RATE as i64));
        assert_eq!(noise(-5), noise(5));
        for i in 0..1000 {
            let s = noise(i);
            assert!((-1.0..=1.0).contains(&s), "noise({i}) = {s}");
        }
    }

    #[test]
    fn noise_varies_across_the_table() {
        let mut distinct = std::collections::HashSet::new();
        for i in 0..100 {
            distinct.insert(noise(i).to_bits());
        }
        assert!(distinct.len() > 50, "noise table looks constant");
    }
}
