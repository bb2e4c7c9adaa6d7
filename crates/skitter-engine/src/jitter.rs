//! Random-walk impulse behavior for hostiles.
//!
//! Each hostile carries its own [`JitterImpulse`]: a seeded PCG random
//! source that samples a small 2D impulse uniformly from a closed symmetric
//! range every frame. Applied at the body's center of mass, frame after
//! frame, this produces the hostiles' characteristic twitchy drift — an
//! unbounded random walk, bounded per step.
//!
//! Sources are seedable so simulations can be replayed exactly; the stage
//! derives per-entity seeds from the configured base seed when one is set.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Default per-axis impulse bound in newton-seconds (meter scale).
pub const DEFAULT_JITTER_LIMIT: f32 = 0.02;

/// A per-entity random impulse source.
///
/// Every [`sample`](Self::sample) draws each axis independently and
/// uniformly from `[-limit, +limit]`.
#[derive(Debug, Clone)]
pub struct JitterImpulse {
    limit: f32,
    rng: Pcg64Mcg,
}

impl JitterImpulse {
    /// A source with the default limit and the given seed.
    ///
    /// Two sources built from the same seed produce identical streams.
    pub fn seeded(seed: u64) -> Self {
        Self {
            limit: DEFAULT_JITTER_LIMIT,
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// A source with the default limit, seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            limit: DEFAULT_JITTER_LIMIT,
            rng: Pcg64Mcg::from_entropy(),
        }
    }

    /// Builder-style limit override.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is negative or non-finite.
    pub fn with_limit(mut self, limit: f32) -> Self {
        assert!(
            limit >= 0.0 && limit.is_finite(),
            "jitter limit must be non-negative and finite, got {limit}"
        );
        self.limit = limit;
        self
    }

    /// The per-axis impulse bound.
    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Draw the next impulse. Each axis lies in `[-limit, +limit]`.
    pub fn sample(&mut self) -> [f32; 2] {
        if self.limit == 0.0 {
            return [0.0, 0.0];
        }
        [
            self.rng.gen_range(-self.limit..=self.limit),
            self.rng.gen_range(-self.limit..=self.limit),
        ]
    }
}
