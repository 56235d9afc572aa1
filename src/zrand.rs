use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// RandMode controls random generator behaviour. May be predictable for
/// testing or truly random for gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandMode {
    Predictable,
    RandomUniform,
}

/// The engine's own random source. Never shared between engines.
#[derive(Debug, Clone)]
pub struct ZRand {
    rng: StdRng,
    rand_mode: RandMode,
}

impl ZRand {
    pub fn new_uniform() -> ZRand {
        ZRand {
            rng: StdRng::from_entropy(),
            rand_mode: RandMode::RandomUniform,
        }
    }

    pub fn new_predictable(seed: u64) -> ZRand {
        ZRand {
            rng: StdRng::seed_from_u64(seed),
            rand_mode: RandMode::Predictable,
        }
    }

    pub fn mode(&self) -> RandMode {
        self.rand_mode
    }

    /// Restart the sequence from `seed`. The same seed always gives the
    /// same sequence.
    pub fn reseed(&mut self, seed: u64) {
        debug!("random: reseed with {}", seed);
        self.rng = StdRng::seed_from_u64(seed);
        self.rand_mode = RandMode::Predictable;
    }

    pub fn reseed_from_clock(&mut self) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        debug!("random: reseed from clock");
        self.rng = StdRng::seed_from_u64(nanos);
        self.rand_mode = RandMode::RandomUniform;
    }

    /// Uniform value in [1, n]. `n` must be positive.
    pub fn gen_range(&mut self, n: u16) -> u16 {
        self.rng.gen_range(1..=n.max(1))
    }
}
