//! Sources of die faces
//!
//! The engine never touches a random generator directly. It asks a
//! [`DieSource`] for one face at a time, so the server can share a single
//! seeded generator and tests can script exact sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Something that can produce the face of a single die
pub trait DieSource {
    /// Return a face in `1..=faces`. `faces` is never zero.
    fn roll_die(&mut self, faces: u32) -> u32;
}

impl<S: DieSource + ?Sized> DieSource for Box<S> {
    fn roll_die(&mut self, faces: u32) -> u32 {
        (**self).roll_die(faces)
    }
}

/// Adapts any `rand` generator into a uniform [`DieSource`]
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Generator seeded from the operating system
    pub fn from_os() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Deterministic generator for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DieSource for RngSource<R> {
    fn roll_die(&mut self, faces: u32) -> u32 {
        self.rng.random_range(1..=faces)
    }
}
