//! Seeded random source of the simulation.
//!
//! The only randomness the simulation may use. Its state is part of every
//! snapshot so a rerun from the same seed and inputs draws the same values.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Debug)]
pub struct SimRng(fastrand::Rng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(fastrand::Rng::with_seed(seed))
    }

    /// Current generator state.
    pub fn state(&self) -> u64 {
        self.0.get_seed()
    }

    /// Uniform index in `0..len`, `None` when `len` is zero.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        let len = u32::try_from(len).ok().filter(|l| *l > 0)?;
        Some(self.0.u32(..len) as usize)
    }
}
