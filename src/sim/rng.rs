use serde::{Deserialize, Serialize};

/// Deterministic PRNG state, persisted as part of `GameState` (§4.4.1, §9
/// "RNG state as a first-class value"). A splitmix64-style generator: every
/// draw is a pure function `(state) -> (value, nextState)`, never a hidden
/// thread-local generator, so replaying the same `(rngState, ...)` input
/// always produces the same output and the same next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RngState(pub u64);

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        // Avoid the degenerate all-zero state, which splitmix64 never escapes.
        Self(seed ^ 0x9E3779B97F4A7C15)
    }

    /// One splitmix64 step: advances the state and derives a 64-bit output.
    fn step(self) -> (u64, RngState) {
        let mut z = self.0.wrapping_add(0x9E3779B97F4A7C15);
        let next = RngState(z);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^= z >> 31;
        (z, next)
    }

    /// Draw an integer die in `1..=sides` (inclusive), returning the value
    /// and the next state. `sides` must be positive.
    pub fn next_die(self, sides: u32) -> (u32, RngState) {
        debug_assert!(sides > 0);
        let (raw, next) = self.step();
        let value = (raw % sides as u64) as u32 + 1;
        (value, next)
    }
}
