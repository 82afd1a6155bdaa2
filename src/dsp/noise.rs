//! Per-oscillator random source: white noise and a pseudo-noise register.
//!
//! Every generator owns one of these, so no two oscillators share random
//! state and a seeded instance replays the same sequence every run.
//! `reseed()` is what a generator reset calls: it moves to the next
//! deterministic seed epoch, so each note draws a fresh sequence without
//! touching any global state.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Width of the pseudo-noise shift register.
const PN_BITS: u32 = 29;
const PN_MASK: u32 = (1 << PN_BITS) - 1;
/// Register value that maps to 0.0: outputs land in [-1.0, 1.0).
const PN_HALF_SCALE: f64 = (1u32 << (PN_BITS - 1)) as f64;
/// Golden-ratio stride between seed epochs.
const EPOCH_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
pub struct NoiseSource {
    seed: u64,
    epoch: u64,
    rng: Pcg32,
    pn_register: u32,
}

impl NoiseSource {
    /// Seed from system entropy. Not realtime-safe; call at construction.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Reproducible source for tests and offline renders.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let pn_register = seed_register(rng.next_u32());
        Self {
            seed,
            epoch: 0,
            rng,
            pn_register,
        }
    }

    /// Advance to the next seed epoch and reload the PN register.
    pub fn reseed(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.rng = Pcg32::seed_from_u64(self.seed ^ self.epoch.wrapping_mul(EPOCH_STRIDE));
        self.pn_register = seed_register(self.rng.next_u32());
    }

    /// Uniform white noise in [-1.0, 1.0].
    #[inline]
    pub fn white(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }

    /// Step the linear-feedback register (taps 0, 1, 27, 28) and return its
    /// value mapped to [-1.0, 1.0).
    #[inline]
    pub fn pseudo(&mut self) -> f64 {
        let r = self.pn_register;
        let feedback = (r ^ (r >> 1) ^ (r >> 27) ^ (r >> 28)) & 1;
        self.pn_register = (r >> 1) | (feedback << (PN_BITS - 1));
        self.pn_register as f64 / PN_HALF_SCALE - 1.0
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new()
    }
}

/// An all-zero register would lock the sequence at -1.0 forever.
fn seed_register(bits: u32) -> u32 {
    match bits & PN_MASK {
        0 => 1,
        r => r,
    }
}
