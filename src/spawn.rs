//! Random source for particle placement.
//!
//! Wraps a small seedable RNG with the handful of helpers the topology
//! generator needs.

use crate::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random helpers used while spawning the particle cloud.
///
/// ```ignore
/// let mut ctx = SpawnContext::seeded(42);
/// let offset = ctx.random_in_disc(120.0);
/// let z = ctx.random_centered(300.0);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Deterministic context. Same seed, same cloud.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Context seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in the given range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Random value in `[-scale/2, scale/2)`.
    #[inline]
    pub fn random_centered(&mut self, scale: f32) -> f32 {
        (self.random() - 0.5) * scale
    }

    /// Random offset inside a disc of the given radius.
    ///
    /// Angle and radius are both uniform, so points bunch toward the centre.
    pub fn random_in_disc(&mut self, radius: f32) -> Vec2 {
        let r = self.random() * radius;
        let angle = self.random() * TAU;
        Vec2::new(angle.cos() * r, angle.sin() * r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = SpawnContext::seeded(9);
        let mut b = SpawnContext::seeded(9);
        for _ in 0..16 {
            assert_eq!(a.random(), b.random());
        }
    }

    #[test]
    fn test_random_centered_bounds() {
        let mut ctx = SpawnContext::seeded(1);
        for _ in 0..200 {
            let v = ctx.random_centered(0.2);
            assert!((-0.1..0.1).contains(&v));
        }
    }

    #[test]
    fn test_random_in_disc_bounds() {
        let mut ctx = SpawnContext::seeded(2);
        for _ in 0..200 {
            assert!(ctx.random_in_disc(120.0).length() <= 120.0 + 0.001);
        }
    }
}
