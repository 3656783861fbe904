//! Random sources used by every probabilistic roll in the simulation.
//!
//! Systems never call an ambient generator: the engine owns one
//! [`RandomSource`] and lends it to each resolver, so a seeded or scripted
//! source makes a whole game reproducible.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A real-valued random source producing values in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Bernoulli trial: succeeds when the draw falls below `probability`.
    fn roll(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_unit()
    }

    /// Uniform integer in `min..=max`.
    fn uniform_int(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let range = u64::from(max - min);
        let offset = (self.next_unit() * (range + 1) as f64).floor() as u64;
        min + offset.min(range) as u32
    }
}

/// Production source: a ChaCha8 stream seeded from the scenario seed.
#[derive(Clone, Debug)]
pub struct SeededSource {
    inner: ChaCha8Rng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derives an independent stream for a named purpose (world seeding,
    /// simulation rolls) so that one consumer never shifts another's draws.
    pub fn stream(seed: u64, name: &str) -> Self {
        let mut mixed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        for byte in name.bytes() {
            mixed ^= u64::from(byte);
            mixed = mixed.wrapping_mul(1099511628211);
        }
        Self::new(mixed)
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}

/// Test source replaying a fixed sequence of draws.
///
/// Once the script is exhausted it keeps returning `fallback`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<f64>,
    fallback: f64,
    draws: usize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: script.into_iter().map(clamp_unit).collect(),
            fallback: 0.0,
            draws: 0,
        }
    }

    /// A source that returns the same value forever.
    pub fn constant(value: f64) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: clamp_unit(value),
            draws: 0,
        }
    }

    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = clamp_unit(value);
        self
    }

    /// Number of values handed out so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
