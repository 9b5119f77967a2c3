//! Random number seam for battle resolution.
//!
//! Every roll in a battle (hit, evasion, critical, variance, state chance,
//! targeting, speed) goes through one [`BattleRng`] stream, and the order
//! of draws is part of the observable behavior. Implementations take `&self`
//! and advance interior state so one stream can be shared by the whole
//! battle context.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`.
pub trait BattleRng {
    /// Next draw in `[0, 1)`.
    fn random(&self) -> f64;

    /// Uniform integer in `0..max`; 0 when `max <= 0`.
    ///
    /// Always consumes exactly one draw so the stream position does not
    /// depend on `max`.
    fn random_int(&self, max: i32) -> i32 {
        let draw = self.random();
        if max <= 0 {
            return 0;
        }
        (f64::from(max) * draw).floor() as i32
    }
}

/// Seeded PCG stream.
///
/// Uses PCG-XSH-RR, which produces 32-bit output from 64-bit state. Same
/// seed, same sequence, which makes whole battles replayable.
#[derive(Clone, Debug)]
pub struct PcgRng {
    state: Cell<u64>,
}

impl PcgRng {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Cell::new(Self::pcg_step(seed)),
        }
    }

    /// `state' = (state * multiplier + increment) mod 2^64`
    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    pub fn next_u32(&self) -> u32 {
        let state = Self::pcg_step(self.state.get());
        self.state.set(state);
        Self::pcg_output(state)
    }
}

impl BattleRng for PcgRng {
    fn random(&self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Unseeded stream backed by `rand`'s standard generator.
#[derive(Debug)]
pub struct EntropyRng {
    inner: RefCell<StdRng>,
}

impl EntropyRng {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for EntropyRng {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleRng for EntropyRng {
    fn random(&self) -> f64 {
        self.inner.borrow_mut().r#gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, then repeats `fallback` forever.
#[derive(Debug)]
pub struct ScriptedRng {
    values: RefCell<VecDeque<f64>>,
    fallback: f64,
    drawn: Cell<usize>,
}

impl ScriptedRng {
    pub fn new(values: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            values: RefCell::new(values.into_iter().collect()),
            fallback,
            drawn: Cell::new(0),
        }
    }

    /// Appends further draws to the script.
    pub fn push(&self, value: f64) {
        self.values.borrow_mut().push_back(value);
    }

    pub fn remaining(&self) -> usize {
        self.values.borrow().len()
    }

    /// Total draws taken so far, scripted or fallback.
    pub fn drawn(&self) -> usize {
        self.drawn.get()
    }
}

impl BattleRng for ScriptedRng {
    fn random(&self) -> f64 {
        self.drawn.set(self.drawn.get() + 1);
        self.values.borrow_mut().pop_front().unwrap_or(self.fallback)
    }
}

/// Always returns the same draw.
#[derive(Clone, Copy, Debug)]
pub struct FixedRng(pub f64);

impl BattleRng for FixedRng {
    fn random(&self) -> f64 {
        self.0
    }
}
